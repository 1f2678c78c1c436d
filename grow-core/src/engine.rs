//! Candidate discovery, legality and scoring for one layer.
//!
//! [`GrowthEngine`] owns everything that stays fixed across the layers of a
//! run: configuration, spatial constraints, the precomputed growth field,
//! seed cells and vertical voids. The per-layer pipeline built on top of it
//! lives in [`crate::phases`].

use crate::attractor::GrowthField;
use crate::config::GrowthConfig;
use crate::constraints::SpatialConstraints;
use crate::error::SetupError;
use crate::geometry::GeometryOracle;
use crate::grid::OccupancyGrid;
use crate::influence_map::InfluenceMap;
use crate::light;
use crate::selection::Score;
use crate::shape;
use crate::types::{Cell, CellState};
use crate::voids::VerticalVoidTracker;
use std::collections::HashSet;
use tracing::debug;

/// Per-layer inputs threaded through every engine call.
#[derive(Clone, Copy, Debug)]
pub struct LayerContext<'l> {
    /// Height of the layer; 0 is the base.
    pub index: usize,
    /// Function label selecting the light-distance limit.
    pub function: &'l str,
    /// Finished grid of the layer directly below, if any.
    pub lower: Option<&'l OccupancyGrid>,
}

impl<'l> LayerContext<'l> {
    pub fn base(function: &'l str) -> Self {
        Self {
            index: 0,
            function,
            lower: None,
        }
    }

    pub fn above(index: usize, function: &'l str, lower: &'l OccupancyGrid) -> Self {
        Self {
            index,
            function,
            lower: Some(lower),
        }
    }
}

pub struct GrowthEngine<'a, O: GeometryOracle> {
    config: &'a GrowthConfig,
    constraints: &'a SpatialConstraints<O>,
    influence: InfluenceMap,
    voids: VerticalVoidTracker,
    seeds: Vec<Cell>,
}

impl<'a, O: GeometryOracle> GrowthEngine<'a, O> {
    /// Validates `config`, keeps the seeds that pass the legality gate and
    /// resolves `field` into a per-cell influence map.
    ///
    /// ### Parameters
    /// - `config` - Immutable configuration of the run.
    /// - `constraints` - Spatial legality shared by every layer.
    /// - `field` - Attractors and repellers; evaluated once here.
    /// - `seeds` - Seed cells; illegal ones are dropped.
    ///
    /// ### Returns
    /// The engine, or a [`SetupError`] when the configuration is invalid or
    /// no seed survives.
    pub fn new(
        config: &'a GrowthConfig,
        constraints: &'a SpatialConstraints<O>,
        field: &GrowthField<O::Shape>,
        seeds: Vec<Cell>,
    ) -> Result<Self, SetupError> {
        config.validate()?;

        let requested = seeds.len();
        let mut unique = HashSet::new();
        let seeds: Vec<Cell> = seeds
            .into_iter()
            .filter(|c| constraints.is_allowed(c.x, c.y) && unique.insert(*c))
            .collect();
        if seeds.is_empty() {
            return Err(SetupError::NoValidSeeds);
        }
        if seeds.len() < requested {
            debug!(
                requested,
                kept = seeds.len(),
                "dropped illegal or duplicate seed cells"
            );
        }

        let influence = InfluenceMap::compute(field, constraints.oracle(), constraints.frame());
        Ok(Self {
            config,
            constraints,
            influence,
            voids: VerticalVoidTracker::new(),
            seeds,
        })
    }

    pub fn config(&self) -> &GrowthConfig {
        self.config
    }

    pub fn constraints(&self) -> &SpatialConstraints<O> {
        self.constraints
    }

    pub fn influence(&self) -> &InfluenceMap {
        &self.influence
    }

    pub fn seeds(&self) -> &[Cell] {
        &self.seeds
    }

    pub fn voids(&self) -> &VerticalVoidTracker {
        &self.voids
    }

    /// Records the enclosed holes of a finished base layer as vertical voids.
    pub fn record_voids(&mut self, base: &OccupancyGrid) -> usize {
        self.voids.record_base(base)
    }

    /// Empty grid on the run's frame.
    pub fn new_grid(&self) -> OccupancyGrid {
        OccupancyGrid::new(*self.constraints.frame())
    }

    #[inline]
    pub fn is_seed(&self, cell: Cell) -> bool {
        self.seeds.contains(&cell)
    }

    /// First seed, in configuration order, that is occupied on `grid`.
    pub fn live_seed(&self, grid: &OccupancyGrid) -> Option<Cell> {
        self.seeds.iter().copied().find(|s| grid.is_alive(s.x, s.y))
    }

    /// Empty, legal, non-void cells within `frontier_radius` of any
    /// occupied cell.
    ///
    /// Cells appear once, in the order they are first reached while
    /// scanning occupied cells row by row.
    pub fn frontier_candidates(&self, grid: &OccupancyGrid) -> Vec<Cell> {
        let r = self.config.frontier_radius;
        let mut seen = HashSet::new();
        let mut frontier = Vec::new();
        for live in grid.alive_cells() {
            for dy in -r..=r {
                for dx in -r..=r {
                    if dx == 0 && dy == 0 {
                        continue;
                    }
                    let c = live + Cell::new(dx, dy);
                    if seen.insert(c)
                        && grid.is_empty(c.x, c.y)
                        && !self.voids.is_void(c.x, c.y)
                        && self.constraints.is_allowed(c.x, c.y)
                    {
                        frontier.push(c);
                    }
                }
            }
        }
        frontier
    }

    /// Hard filters for placing `(x, y)`, cheapest first.
    ///
    /// `grid` is only borrowed mutably for tentative placements; it is
    /// unchanged on return.
    pub fn can_place(
        &self,
        grid: &mut OccupancyGrid,
        x: i32,
        y: i32,
        ctx: &LayerContext<'_>,
    ) -> bool {
        self.constraints.is_allowed(x, y)
            && !self.voids.is_void(x, y)
            && !grid.is_alive(x, y)
            && grid.has_alive_neighbor_4(x, y)
            && self.is_supported(x, y, ctx)
            && self.passes_run_limits(grid, x, y)
            && self.connects_to_seeds(grid, x, y)
            && self.passes_light_check(grid, x, y, ctx.function)
    }

    fn is_supported(&self, x: i32, y: i32, ctx: &LayerContext<'_>) -> bool {
        match ctx.lower {
            Some(lower) if self.config.requires_strict_support() => lower.is_alive(x, y),
            _ => true,
        }
    }

    fn passes_run_limits(&self, grid: &OccupancyGrid, x: i32, y: i32) -> bool {
        let (h, v) = axis_runs(grid, x, y);
        let wide_enough = h >= self.config.min_width || v >= self.config.min_width;
        let short_enough = h <= self.config.max_line || v <= self.config.max_line;
        wide_enough && short_enough
    }

    /// With no live seed there is no component to stay attached to, so
    /// every placement passes.
    fn connects_to_seeds(&self, grid: &mut OccupancyGrid, x: i32, y: i32) -> bool {
        let Some(anchor) = self.live_seed(grid) else {
            return true;
        };
        let probe = grid.tentative(x, y, CellState::Occupied);
        probe
            .connected_component(anchor.x, anchor.y)
            .contains(&Cell::new(x, y))
    }

    /// Placing `(x, y)` must leave it and every occupied 4-neighbor within
    /// the light distance of `function`.
    pub fn passes_light_check(
        &self,
        grid: &mut OccupancyGrid,
        x: i32,
        y: i32,
        function: &str,
    ) -> bool {
        let max = self.config.light_distance_for(function);
        let probe = grid.tentative(x, y, CellState::Occupied);
        let lit = |c: Cell| light::within(light::distance_to_void(&probe, c.x, c.y), max);
        lit(Cell::new(x, y))
            && probe
                .neighbors_4(x, y)
                .filter(|c| probe.is_alive(c.x, c.y))
                .all(lit)
    }

    /// Weighted sum of every scoring term for an empty candidate.
    ///
    /// Returns [`Score::Blocked`] when the summed growth-field influence
    /// alone is below `hard_blockade_threshold`; no other term can
    /// override that.
    pub fn score_candidate(
        &self,
        grid: &mut OccupancyGrid,
        x: i32,
        y: i32,
        ctx: &LayerContext<'_>,
    ) -> Score {
        if self
            .influence
            .is_blockaded(x, y, self.config.hard_blockade_threshold)
        {
            return Score::Blocked;
        }
        let w = &self.config.weights;

        let mut score = self.influence.get(x, y) * w.growth_point;
        score += grid.count_alive_neighbors_4(x, y) as f64 * w.connected;
        score += shape::smoothness(grid, x, y) * w.smoothness;
        score += shape::convexity(grid, x, y) * w.convexity;
        score += self.layer_term(x, y, ctx.lower);
        score += self.light_score(x, y, ctx.index) * w.light;
        score += self.obstacle_penalty(x, y) * w.obstacle;
        if self.near_edge(grid, x, y) {
            score += self.config.edge_bonus;
        }
        Score::Scored(score)
    }

    /// Support bonus over an occupied cell below, overhang penalty otherwise.
    fn layer_term(&self, x: i32, y: i32, lower: Option<&OccupancyGrid>) -> f64 {
        let Some(lower) = lower else {
            return 0.0;
        };
        let inheritance = self.config.layer_inheritance;
        if lower.is_alive(x, y) {
            self.config.layer_support_bonus * inheritance
        } else {
            let freedom = self.config.layer_growth_freedom;
            -self.config.layer_overhang_penalty * (1.0 - freedom) * inheritance
        }
    }

    /// Projection of the cell's offset from the grid center onto the
    /// horizontal sun direction, mapped to `0..=1`, plus the height bonus.
    pub fn light_score(&self, x: i32, y: i32, layer: usize) -> f64 {
        let [sx, sy, _] = self.config.sun_direction;
        let len = sx.hypot(sy);
        if len == 0.0 {
            return 0.5;
        }
        let frame = self.constraints.frame();
        let (cols, rows) = (frame.cols as f64, frame.rows as f64);
        let dx = (x as f64 - cols / 2.0) / cols.max(1.0);
        let dy = (y as f64 - rows / 2.0) / rows.max(1.0);
        let dot = (dx * sx + dy * sy) / len;
        (dot + 1.0) / 2.0 + layer as f64 * self.config.light_height_bonus
    }

    /// Positive penalty magnitude; the negative obstacle weight turns it
    /// into a score reduction.
    pub fn obstacle_penalty(&self, x: i32, y: i32) -> f64 {
        if self.constraints.is_obstacle(x, y) {
            self.config.obstacle_cell_penalty
        } else {
            self.constraints.adjacent_obstacles(x, y) as f64 * self.config.obstacle_adjacent_penalty
        }
    }

    fn near_edge(&self, grid: &mut OccupancyGrid, x: i32, y: i32) -> bool {
        let probe = grid.tentative(x, y, CellState::Occupied);
        light::within(
            light::distance_to_void(&probe, x, y),
            self.config.edge_distance_threshold,
        )
    }
}

/// Lengths of the horizontal and vertical occupied runs through `(x, y)`,
/// counting the cell itself whatever its state.
pub fn axis_runs(grid: &OccupancyGrid, x: i32, y: i32) -> (usize, usize) {
    let run = |dx: i32, dy: i32| {
        (1..)
            .take_while(|&i| grid.is_alive(x + dx * i, y + dy * i))
            .count()
    };
    (1 + run(1, 0) + run(-1, 0), 1 + run(0, 1) + run(0, -1))
}
