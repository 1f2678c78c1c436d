use crate::grid::OccupancyGrid;
use crate::types::{Cell, CellState};
use std::collections::HashSet;

/// Plan positions that stay empty on every layer above the base.
///
/// Filled once from the finished base layer: an empty cell is a vertical
/// void when each of its four cardinal half-lines hits an occupied cell
/// somewhere along the row or column. Gaps open to one side are not voids.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VerticalVoidTracker {
    cells: HashSet<Cell>,
}

impl VerticalVoidTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, cell: Cell) {
        self.cells.insert(cell);
    }

    #[inline]
    pub fn is_void(&self, x: i32, y: i32) -> bool {
        self.cells.contains(&Cell::new(x, y))
    }

    pub fn cells(&self) -> &HashSet<Cell> {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Scans the occupied bounding box of `base` and records every enclosed
    /// empty cell.
    ///
    /// ### Returns
    /// The number of voids newly recorded.
    pub fn record_base(&mut self, base: &OccupancyGrid) -> usize {
        let Some((min, max)) = occupied_bounds(base) else {
            return 0;
        };
        let before = self.cells.len();
        for y in min.y..=max.y {
            for x in min.x..=max.x {
                if base.is_empty(x, y) && enclosed(base, x, y, min, max) {
                    self.cells.insert(Cell::new(x, y));
                }
            }
        }
        self.cells.len() - before
    }

    /// Forces every recorded void on `grid` back to empty.
    ///
    /// ### Returns
    /// The number of cells that were occupied and got cleared.
    pub fn apply(&self, grid: &mut OccupancyGrid) -> usize {
        let mut cleared = 0;
        for c in &self.cells {
            if grid.is_alive(c.x, c.y) {
                grid.set(c.x, c.y, CellState::Empty);
                cleared += 1;
            }
        }
        cleared
    }
}

fn occupied_bounds(grid: &OccupancyGrid) -> Option<(Cell, Cell)> {
    grid.alive_cells().fold(None, |bounds, c| match bounds {
        None => Some((c, c)),
        Some((min, max)) => Some((min.min(c), max.max(c))),
    })
}

fn enclosed(grid: &OccupancyGrid, x: i32, y: i32, min: Cell, max: Cell) -> bool {
    let alive = |c: (i32, i32)| grid.is_alive(c.0, c.1);
    (min.x..x).map(|i| (i, y)).any(alive)
        && (x + 1..=max.x).map(|i| (i, y)).any(alive)
        && (min.y..y).map(|j| (x, j)).any(alive)
        && (y + 1..=max.y).map(|j| (x, j)).any(alive)
}
