//! Layer orchestration: seeds, the layer plan and the finished stack.

use crate::config::ConfigError;
use crate::constraints::SpatialConstraints;
use crate::engine::{GrowthEngine, LayerContext};
use crate::error::SetupError;
use crate::geometry::GeometryOracle;
use crate::grid::{GridFrame, OccupancyGrid};
use crate::phases::LayerReport;
use crate::types::{Cell, CellState};
use glam::DVec2;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

/// How a single seed anchor expands into seed cells.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedPattern {
    #[default]
    Single,
    /// The anchor and the cells to its right, below and diagonal.
    Square2,
    /// The 3x3 block centered on the anchor.
    Square3,
}

impl SeedPattern {
    pub fn expand(self, anchor: Cell) -> Vec<Cell> {
        let offsets: &[(i32, i32)] = match self {
            SeedPattern::Single => &[(0, 0)],
            SeedPattern::Square2 => &[(0, 0), (1, 0), (0, 1), (1, 1)],
            SeedPattern::Square3 => &[
                (-1, -1),
                (0, -1),
                (1, -1),
                (-1, 0),
                (0, 0),
                (1, 0),
                (-1, 1),
                (0, 1),
                (1, 1),
            ],
        };
        offsets
            .iter()
            .map(|&(dx, dy)| anchor + Cell::new(dx, dy))
            .collect()
    }
}

/// Cell holding `point`, or the grid center when no point is given.
pub fn seed_anchor(frame: &GridFrame, point: Option<DVec2>) -> Cell {
    match point {
        Some(p) => frame.world_to_cell(p),
        None => Cell::new((frame.cols / 2) as i32, (frame.rows / 2) as i32),
    }
}

/// Expands `anchor` by `pattern`, keeping only legal cells.
pub fn seed_cells<O: GeometryOracle>(
    constraints: &SpatialConstraints<O>,
    anchor: Cell,
    pattern: SeedPattern,
) -> Result<Vec<Cell>, SetupError> {
    let seeds: Vec<Cell> = pattern
        .expand(anchor)
        .into_iter()
        .filter(|c| constraints.is_allowed(c.x, c.y))
        .collect();
    if seeds.is_empty() {
        return Err(SetupError::NoValidSeeds);
    }
    Ok(seeds)
}

/// Number of layers and their function labels.
///
/// Layers without a label use the configured default function.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerPlan {
    pub count: usize,
    pub functions: Vec<String>,
}

impl Default for LayerPlan {
    fn default() -> Self {
        Self {
            count: 1,
            functions: Vec::new(),
        }
    }
}

impl LayerPlan {
    pub fn new(count: usize, functions: Vec<String>) -> Self {
        Self { count, functions }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.count == 0 {
            return Err(ConfigError::NoLayers);
        }
        Ok(())
    }

    pub fn function<'a>(&'a self, index: usize, default: &'a str) -> &'a str {
        self.functions.get(index).map_or(default, String::as_str)
    }
}

/// Finished run, ready for a renderer.
#[derive(Clone, Debug)]
pub struct LayerStack {
    /// One grid per layer, base first, all on the same frame.
    pub layers: Vec<OccupancyGrid>,
    pub functions: Vec<String>,
    pub seeds: Vec<Cell>,
    pub reports: Vec<LayerReport>,
    /// Vertical voids in row-major order.
    pub voids: Vec<Cell>,
}

impl LayerStack {
    pub fn frame(&self) -> Option<&GridFrame> {
        self.layers.first().map(OccupancyGrid::frame)
    }

    pub fn total_cells(&self) -> usize {
        self.layers.iter().map(OccupancyGrid::alive_count).sum()
    }

    pub fn void_count(&self) -> usize {
        self.voids.len()
    }
}

/// Grows every layer of `plan` in sequence.
///
/// The base layer starts from the seeds alone and, once repaired, defines
/// the vertical voids. Every upper layer starts from the seeds with the
/// voids cleared, grows against the finished layer below, and has the
/// voids cleared again afterwards.
///
/// ### Returns
/// The finished [`LayerStack`], or [`SetupError`] for an empty plan.
pub fn grow_stack<O, R>(
    engine: &mut GrowthEngine<'_, O>,
    plan: &LayerPlan,
    rng: &mut R,
) -> Result<LayerStack, SetupError>
where
    O: GeometryOracle,
    R: Rng + ?Sized,
{
    plan.validate()?;
    let default_function = engine.config().default_function.clone();

    let mut layers: Vec<OccupancyGrid> = Vec::with_capacity(plan.count);
    let mut functions = Vec::with_capacity(plan.count);
    let mut reports = Vec::with_capacity(plan.count);

    for index in 0..plan.count {
        let function = plan.function(index, &default_function).to_string();
        let mut grid = engine.new_grid();
        for s in engine.seeds() {
            grid.set(s.x, s.y, CellState::Occupied);
        }

        let report = match layers.last() {
            None => {
                let report = engine.grow_layer(&mut grid, &LayerContext::base(&function), rng);
                let voids = engine.record_voids(&grid);
                info!(voids, "recorded vertical voids from base layer");
                report
            }
            Some(lower) => {
                engine.voids().apply(&mut grid);
                let ctx = LayerContext::above(index, &function, lower);
                let report = engine.grow_layer(&mut grid, &ctx, rng);
                engine.voids().apply(&mut grid);
                report
            }
        };

        layers.push(grid);
        functions.push(function);
        reports.push(report);
    }

    let mut voids: Vec<Cell> = engine.voids().cells().iter().copied().collect();
    voids.sort_by_key(|c| (c.y, c.x));

    let stack = LayerStack {
        layers,
        functions,
        seeds: engine.seeds().to_vec(),
        reports,
        voids,
    };
    info!(
        layers = stack.layers.len(),
        total_cells = stack.total_cells(),
        voids = stack.void_count(),
        "stack grown"
    );
    Ok(stack)
}
