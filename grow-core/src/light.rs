use crate::grid::{OccupancyGrid, Visit};
use crate::types::Cell;

/// Hop count from `(x, y)` to the nearest empty cell, searching through
/// occupied cells only.
///
/// Cells on the grid border count as lit and return `Some(1)` without a
/// search. `None` means the cell is sealed inside occupied cells with no
/// empty cell reachable at all.
pub fn distance_to_void(grid: &OccupancyGrid, x: i32, y: i32) -> Option<u32> {
    if grid.on_border(x, y) {
        return Some(1);
    }
    grid.breadth_first(Cell::new(x, y), |c, _| {
        if grid.is_empty(c.x, c.y) {
            Visit::Stop
        } else {
            Visit::Expand
        }
    })
    .map(|(_, dist)| dist)
}

/// `true` when a light distance is known and does not exceed `max`.
#[inline]
pub fn within(dist: Option<u32>, max: u32) -> bool {
    dist.is_some_and(|d| d <= max)
}
