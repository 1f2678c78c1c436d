//! Local shape-quality heuristics for candidate cells.
//!
//! Both scores look only at the 3x3 neighborhood of an empty candidate and
//! are tuned constants, not curvature measures.

use crate::grid::OccupancyGrid;
use crate::types::DIAGONAL;

const CARDINAL_NEIGHBOR: f64 = 2.0;
const DIAGONAL_NEIGHBOR: f64 = 1.5;
const PENINSULA_PENALTY: f64 = 2.0;
const CORNER_FILL_BONUS: f64 = 3.0;
const BAY_FILL_BONUS: f64 = 4.0;
const FILLED_CORNER: f64 = 0.5;
const CONCAVE_NOTCH: f64 = 2.0;

/// Rewards candidates that fill gaps rather than extend thin spurs.
pub fn smoothness(grid: &OccupancyGrid, x: i32, y: i32) -> f64 {
    let n4 = grid.count_alive_neighbors_4(x, y);
    let n8 = grid.count_alive_neighbors_8(x, y);

    let mut score = n4 as f64 * CARDINAL_NEIGHBOR + (n8 - n4) as f64 * DIAGONAL_NEIGHBOR;

    match n4 {
        1 => score -= PENINSULA_PENALTY,
        2 => {
            let mut live = grid
                .neighbors_4(x, y)
                .filter(|c| grid.is_alive(c.x, c.y));
            if let (Some(a), Some(b)) = (live.next(), live.next())
                && a.x != b.x
                && a.y != b.y
            {
                score += CORNER_FILL_BONUS;
            }
        }
        _ => {}
    }
    if n4 >= 3 {
        score += BAY_FILL_BONUS;
    }
    score
}

/// Rewards occupied diagonal corners and, more strongly, notches the
/// candidate would close: an empty corner whose two flanking cells are
/// both occupied.
pub fn convexity(grid: &OccupancyGrid, x: i32, y: i32) -> f64 {
    let mut corners = 0usize;
    let mut notches = 0usize;
    for (dx, dy) in DIAGONAL {
        let corner_alive = grid.is_alive(x + dx, y + dy);
        if corner_alive {
            corners += 1;
        } else if grid.is_alive(x + dx, y) && grid.is_alive(x, y + dy) {
            notches += 1;
        }
    }
    corners as f64 * FILLED_CORNER + notches as f64 * CONCAVE_NOTCH
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CellState;

    fn grid_from(rows: &[&str]) -> OccupancyGrid {
        let mut grid = OccupancyGrid::with_size(rows[0].len(), rows.len());
        for (y, row) in rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                if ch == '#' {
                    grid.set(x as i32, y as i32, CellState::Occupied);
                }
            }
        }
        grid
    }

    #[test]
    fn isolated_candidate_scores_zero() {
        let grid = grid_from(&["...", "...", "..."]);
        assert_eq!(smoothness(&grid, 1, 1), 0.0);
        assert_eq!(convexity(&grid, 1, 1), 0.0);
    }

    #[test]
    fn single_neighbor_is_a_peninsula() {
        let grid = grid_from(&["...", "#..", "..."]);
        // 2.0 for the neighbor, -2.0 peninsula penalty.
        assert_eq!(smoothness(&grid, 1, 1), 0.0);
    }

    #[test]
    fn orthogonal_pair_fills_a_corner() {
        let grid = grid_from(&[".#.", "#..", "..."]);
        // 2 * 2.0 + 3.0 corner bonus.
        assert_eq!(smoothness(&grid, 1, 1), 7.0);
        // Corner (0,0) is empty and flanked by (0,1) and (1,0).
        assert_eq!(convexity(&grid, 1, 1), 2.0);
    }

    #[test]
    fn opposite_pair_gets_no_corner_bonus() {
        let grid = grid_from(&["...", "#.#", "..."]);
        assert_eq!(smoothness(&grid, 1, 1), 4.0);
    }

    #[test]
    fn bay_and_diagonals_add_up() {
        let grid = grid_from(&["#..", "#.#", ".#."]);
        // n4 = 3, n8 = 4: 3 * 2.0 + 1 * 1.5 + 4.0.
        assert_eq!(smoothness(&grid, 1, 1), 11.5);
        // One filled corner (0,0); notches at (2,2) flanked by (2,1) and (1,2),
        // and at (0,2) flanked by (0,1) and (1,2).
        assert_eq!(convexity(&grid, 1, 1), 0.5 + 2.0 * 2.0);
    }

    #[test]
    fn scores_are_total_at_grid_edges() {
        let grid = grid_from(&["##", "#."]);
        assert_eq!(smoothness(&grid, 1, 1), 2.0 * 2.0 + 1.5 + 3.0);
        assert_eq!(convexity(&grid, 1, 1), 0.5);
        assert_eq!(smoothness(&grid, 5, 5), 0.0);
    }
}
