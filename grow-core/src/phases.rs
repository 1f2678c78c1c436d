//! Per-layer growth pipeline.
//!
//! [`GrowthEngine::grow_layer`] runs the phases in order:
//! 1. [`growth_phase`](GrowthEngine::growth_phase) - repeatedly discover the
//!    frontier, filter it through [`can_place`](GrowthEngine::can_place),
//!    score the survivors and place one by weighted roulette.
//! 2. [`enforce_minimum`](GrowthEngine::enforce_minimum) - unscored,
//!    first-legal placements until the layer minimum is met or the retry
//!    budget runs out.
//! 3. [`prune_to_max`](GrowthEngine::prune_to_max) - remove weakly attached
//!    cells one at a time without ever splitting the seed component.
//! 4. [`remove_isolated`](GrowthEngine::remove_isolated) - drop non-seed
//!    cells with no occupied 4-neighbor.
//! 5. [`enforce_seeds`](GrowthEngine::enforce_seeds) - force legal seeds
//!    back to occupied.
//!
//! Starvation is not an error: the layer keeps whatever it reached and the
//! shortfall is reported in [`LayerReport`].

use crate::engine::{GrowthEngine, LayerContext};
use crate::geometry::GeometryOracle;
use crate::grid::OccupancyGrid;
use crate::selection::{Candidate, Score, weighted_pick};
use crate::types::{Cell, CellState};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::Serialize;
use tracing::{debug, info, warn};

/// Outcome of one layer's pipeline.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LayerReport {
    pub index: usize,
    pub function: String,
    /// Cells the main growth loop was asked to place.
    pub target: usize,
    /// Cells the main growth loop actually placed.
    pub placed: usize,
    /// Cells placed while enforcing the minimum.
    pub extra_placed: usize,
    pub pruned: usize,
    pub isolated_removed: usize,
    pub seeds_restored: usize,
    pub final_count: usize,
    pub min_cells: usize,
    pub max_cells: usize,
    pub min_reached: bool,
    /// The main loop stopped before reaching `target`.
    pub starved: bool,
}

/// Result of [`GrowthEngine::growth_phase`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GrowthOutcome {
    pub placed: usize,
    pub starved: bool,
}

impl<O: GeometryOracle> GrowthEngine<'_, O> {
    /// Grows, repairs and reports one layer in place.
    ///
    /// ### Parameters
    /// - `grid` - Layer grid, already holding its seeds and with vertical
    ///   voids applied.
    /// - `ctx` - Layer index, function label and the finished layer below.
    /// - `rng` - Source of randomness for selection and shuffling.
    ///
    /// ### Returns
    /// A [`LayerReport`] describing every phase.
    pub fn grow_layer<R: Rng + ?Sized>(
        &self,
        grid: &mut OccupancyGrid,
        ctx: &LayerContext<'_>,
        rng: &mut R,
    ) -> LayerReport {
        let targets = self.config().layer_targets(ctx.index);

        let growth = self.growth_phase(grid, ctx, targets.grow, rng);
        let extra_placed = self.enforce_minimum(grid, ctx, targets.min_cells, rng);
        let pruned = self.prune_to_max(grid, targets.max_cells);
        let isolated_removed = self.remove_isolated(grid);
        let seeds_restored = self.enforce_seeds(grid);

        let final_count = grid.alive_count();
        let report = LayerReport {
            index: ctx.index,
            function: ctx.function.to_string(),
            target: targets.grow,
            placed: growth.placed,
            extra_placed,
            pruned,
            isolated_removed,
            seeds_restored,
            final_count,
            min_cells: targets.min_cells,
            max_cells: targets.max_cells,
            min_reached: final_count >= targets.min_cells,
            starved: growth.starved,
        };

        if !report.min_reached {
            warn!(
                layer = ctx.index,
                cells = final_count,
                min = targets.min_cells,
                "layer minimum not reached"
            );
        }
        info!(
            layer = ctx.index,
            function = ctx.function,
            placed = report.placed,
            extra = report.extra_placed,
            pruned = report.pruned,
            cells = final_count,
            "layer grown"
        );
        report
    }

    /// Main scored growth loop.
    ///
    /// Each round rescans the frontier, keeps the candidates that pass every
    /// hard filter and are not blockaded, and places one by weighted
    /// roulette. `max_grow_attempts` caps consecutive failed rounds and the
    /// count resets after every placement. A round without candidates
    /// leaves the grid unchanged, so the loop ends there as starved.
    pub fn growth_phase<R: Rng + ?Sized>(
        &self,
        grid: &mut OccupancyGrid,
        ctx: &LayerContext<'_>,
        target: usize,
        rng: &mut R,
    ) -> GrowthOutcome {
        let mut placed = 0;
        let mut failed_rounds = 0;
        while placed < target && failed_rounds < self.config().max_grow_attempts {

            let frontier = self.frontier_candidates(grid);
            let mut scored = Vec::with_capacity(frontier.len());
            for cell in frontier {
                if !self.can_place(grid, cell.x, cell.y, ctx) {
                    continue;
                }
                if let Score::Scored(score) = self.score_candidate(grid, cell.x, cell.y, ctx) {
                    scored.push(Candidate { cell, score });
                }
            }

            match weighted_pick(&mut scored, self.config(), rng) {
                Some(pick) => {
                    grid.set(pick.x, pick.y, CellState::Occupied);
                    placed += 1;
                    failed_rounds = 0;
                }
                None => {
                    failed_rounds += 1;
                    debug!(layer = ctx.index, placed, target, "no placeable candidates");
                    if scored.is_empty() {
                        break;
                    }
                }
            }
        }
        GrowthOutcome {
            placed,
            starved: placed < target,
        }
    }

    /// Greedy, unscored growth towards `min_cells`.
    ///
    /// Runs up to `max_extra_rounds` rounds of
    /// [`grow_extra`](GrowthEngine::grow_extra) and stops early after a
    /// round that placed nothing.
    ///
    /// ### Returns
    /// Total cells placed.
    pub fn enforce_minimum<R: Rng + ?Sized>(
        &self,
        grid: &mut OccupancyGrid,
        ctx: &LayerContext<'_>,
        min_cells: usize,
        rng: &mut R,
    ) -> usize {
        let mut total = 0;
        for _ in 0..self.config().max_extra_rounds {
            let count = grid.alive_count();
            if count >= min_cells {
                break;
            }
            let grew = self.grow_extra(grid, ctx, min_cells - count, rng);
            total += grew;
            if grew == 0 {
                break;
            }
        }
        if total > 0 {
            debug!(layer = ctx.index, placed = total, "extra growth towards minimum");
        }
        total
    }

    /// One round of extra growth: up to `max_extra_attempts` attempts, each
    /// shuffling the frontier and placing the first legal, non-blockaded
    /// cell among the first `extra_candidate_sample` of it.
    pub fn grow_extra<R: Rng + ?Sized>(
        &self,
        grid: &mut OccupancyGrid,
        ctx: &LayerContext<'_>,
        count: usize,
        rng: &mut R,
    ) -> usize {
        let threshold = self.config().hard_blockade_threshold;
        let mut placed = 0;
        let mut attempts = 0;
        while placed < count && attempts < self.config().max_extra_attempts {
            attempts += 1;

            let mut frontier = self.frontier_candidates(grid);
            if frontier.is_empty() {
                break;
            }
            frontier.shuffle(rng);

            let pick = frontier
                .into_iter()
                .take(self.config().extra_candidate_sample)
                .find(|c| {
                    !self.influence().is_blockaded(c.x, c.y, threshold)
                        && self.can_place(grid, c.x, c.y, ctx)
                });
            if let Some(c) = pick {
                grid.set(c.x, c.y, CellState::Occupied);
                placed += 1;
            }
        }
        placed
    }

    /// Removes cells until at most `max_cells` remain, or until no cell
    /// can go without splitting the seed component.
    ///
    /// Every removal re-ranks the whole live set, so a full prune is
    /// quadratic in the cell count. `max_prune_iterations` caps removals.
    pub fn prune_to_max(&self, grid: &mut OccupancyGrid, max_cells: usize) -> usize {
        let mut pruned = 0;
        while grid.alive_count() > max_cells && pruned < self.config().max_prune_iterations {
            if self.prune_step(grid).is_none() {
                debug!(
                    cells = grid.alive_count(),
                    max = max_cells,
                    "pruning stalled; every remaining cell holds the structure together"
                );
                break;
            }
            pruned += 1;
        }
        pruned
    }

    /// Removes the least connected non-seed cell whose removal keeps every
    /// occupied cell in the component of the first live seed.
    ///
    /// Cells are ranked by live 4-neighbor count; ties keep row-major order.
    /// A removal that would disconnect the structure is undone and the next
    /// cell in the ranking is tried. Without a live seed, connectivity is
    /// not checked.
    ///
    /// ### Returns
    /// The removed cell, or `None` when no cell can be removed.
    pub fn prune_step(&self, grid: &mut OccupancyGrid) -> Option<Cell> {
        let mut ranked: Vec<(Cell, usize)> = grid
            .alive_cells()
            .filter(|c| !self.is_seed(*c))
            .map(|c| (c, grid.count_alive_neighbors_4(c.x, c.y)))
            .collect();
        ranked.sort_by_key(|&(_, n)| n);

        let anchor = self.live_seed(grid);
        for (cell, _) in ranked {
            let probe = grid.tentative(cell.x, cell.y, CellState::Empty);
            let intact = anchor.is_none_or(|a| {
                probe.connected_component(a.x, a.y).len() == probe.alive_count()
            });
            if intact {
                probe.commit();
                return Some(cell);
            }
        }
        None
    }

    /// Clears every non-seed cell without an occupied 4-neighbor.
    ///
    /// Isolation is judged on the grid as it was before any removal.
    pub fn remove_isolated(&self, grid: &mut OccupancyGrid) -> usize {
        let isolated: Vec<Cell> = grid
            .alive_cells()
            .filter(|c| !self.is_seed(*c) && !grid.has_alive_neighbor_4(c.x, c.y))
            .collect();
        for c in &isolated {
            grid.set(c.x, c.y, CellState::Empty);
        }
        isolated.len()
    }

    /// Sets every legal seed back to occupied.
    ///
    /// ### Returns
    /// How many seeds had to be restored.
    pub fn enforce_seeds(&self, grid: &mut OccupancyGrid) -> usize {
        let mut restored = 0;
        for s in self.seeds() {
            if !grid.is_alive(s.x, s.y) && self.constraints().is_allowed(s.x, s.y) {
                grid.set(s.x, s.y, CellState::Occupied);
                restored += 1;
            }
        }
        restored
    }
}
