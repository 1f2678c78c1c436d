use crate::types::{CARDINAL, Cell, CellState};
use glam::DVec2;
use std::collections::{HashSet, VecDeque};
use std::ops::Deref;

/// World placement shared by every layer grid of one run.
///
/// Cell `(x, y)` covers the square starting at
/// `origin + (x, y) * cell_size`; its center lies half a cell further.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridFrame {
    pub origin: DVec2,
    pub cell_size: f64,
    pub cols: usize,
    pub rows: usize,
}

impl GridFrame {
    /// Derives a frame covering the box `min..max`.
    ///
    /// Each axis gets `ceil(extent / cell_size) + 1` cells so the far edge
    /// stays covered regardless of rounding.
    pub fn covering(min: DVec2, max: DVec2, cell_size: f64) -> Self {
        let extent = max - min;
        Self {
            origin: min,
            cell_size,
            cols: ((extent.x / cell_size).ceil() as usize).saturating_add(1),
            rows: ((extent.y / cell_size).ceil() as usize).saturating_add(1),
        }
    }

    #[inline]
    pub fn cell_count(&self) -> usize {
        self.cols * self.rows
    }

    #[inline]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.cols && (y as usize) < self.rows
    }

    /// World-space center of cell `(x, y)`.
    pub fn cell_center(&self, x: i32, y: i32) -> DVec2 {
        self.origin + (DVec2::new(x as f64, y as f64) + 0.5) * self.cell_size
    }

    /// Cell containing the world point `p` (may be out of bounds).
    pub fn world_to_cell(&self, p: DVec2) -> Cell {
        let local = ((p - self.origin) / self.cell_size).floor();
        Cell::new(local.x as i32, local.y as i32)
    }
}

/// What [`OccupancyGrid::breadth_first`] should do with a newly reached cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Visit {
    /// End the search and report this cell and its hop count.
    Stop,
    /// Enqueue the cell and continue through it.
    Expand,
    /// Mark the cell seen but do not search through it.
    Skip,
}

/// Binary occupancy of one layer.
///
/// Cells are stored row-major. Every query is total: coordinates outside
/// the grid read as empty and writes to them are ignored, so scoring code
/// never has to special-case the border.
#[derive(Clone, Debug, PartialEq)]
pub struct OccupancyGrid {
    frame: GridFrame,
    cells: Vec<CellState>,
}

impl OccupancyGrid {
    pub fn new(frame: GridFrame) -> Self {
        Self {
            frame,
            cells: vec![CellState::Empty; frame.cell_count()],
        }
    }

    /// Unit-cell grid anchored at the world origin.
    pub fn with_size(cols: usize, rows: usize) -> Self {
        Self::new(GridFrame {
            origin: DVec2::ZERO,
            cell_size: 1.0,
            cols,
            rows,
        })
    }

    #[inline]
    pub fn frame(&self) -> &GridFrame {
        &self.frame
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.frame.cols
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.frame.rows
    }

    #[inline]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        self.frame.in_bounds(x, y)
    }

    /// `true` for cells in the outermost ring of the grid.
    pub fn on_border(&self, x: i32, y: i32) -> bool {
        x == 0 || y == 0 || x as usize == self.cols() - 1 || y as usize == self.rows() - 1
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        self.in_bounds(x, y)
            .then(|| y as usize * self.frame.cols + x as usize)
    }

    #[inline]
    pub fn get(&self, x: i32, y: i32) -> CellState {
        self.index(x, y)
            .map_or(CellState::Empty, |i| self.cells[i])
    }

    #[inline]
    pub fn set(&mut self, x: i32, y: i32, state: CellState) {
        if let Some(i) = self.index(x, y) {
            self.cells[i] = state;
        }
    }

    /// In bounds and empty.
    #[inline]
    pub fn is_empty(&self, x: i32, y: i32) -> bool {
        self.in_bounds(x, y) && !self.get(x, y).is_occupied()
    }

    /// In bounds and occupied.
    #[inline]
    pub fn is_alive(&self, x: i32, y: i32) -> bool {
        self.get(x, y).is_occupied()
    }

    /// In-bounds 4-neighbors in E, W, S, N order.
    pub fn neighbors_4(&self, x: i32, y: i32) -> impl Iterator<Item = Cell> + '_ {
        CARDINAL
            .into_iter()
            .map(move |(dx, dy)| Cell::new(x + dx, y + dy))
            .filter(move |c| self.in_bounds(c.x, c.y))
    }

    /// In-bounds 8-neighbors, row by row from the top-left.
    pub fn neighbors_8(&self, x: i32, y: i32) -> impl Iterator<Item = Cell> + '_ {
        (-1..=1)
            .flat_map(move |dy| (-1..=1).map(move |dx| (dx, dy)))
            .filter(|&(dx, dy)| dx != 0 || dy != 0)
            .map(move |(dx, dy)| Cell::new(x + dx, y + dy))
            .filter(move |c| self.in_bounds(c.x, c.y))
    }

    pub fn count_alive_neighbors_4(&self, x: i32, y: i32) -> usize {
        self.neighbors_4(x, y)
            .filter(|c| self.is_alive(c.x, c.y))
            .count()
    }

    pub fn count_alive_neighbors_8(&self, x: i32, y: i32) -> usize {
        self.neighbors_8(x, y)
            .filter(|c| self.is_alive(c.x, c.y))
            .count()
    }

    pub fn has_alive_neighbor_4(&self, x: i32, y: i32) -> bool {
        self.neighbors_4(x, y).any(|c| self.is_alive(c.x, c.y))
    }

    pub fn alive_count(&self) -> usize {
        self.cells.iter().filter(|s| s.is_occupied()).count()
    }

    /// Occupied cells in row-major order.
    pub fn alive_cells(&self) -> impl Iterator<Item = Cell> + '_ {
        let cols = self.frame.cols;
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_occupied())
            .map(move |(i, _)| Cell::new((i % cols) as i32, (i / cols) as i32))
    }

    pub fn all_alive_cells(&self) -> Vec<Cell> {
        self.alive_cells().collect()
    }

    /// Breadth-first search over the 4-connected grid from `start`.
    ///
    /// Every in-bounds cell reached for the first time is handed to
    /// `visit` together with its hop count from `start`; the returned
    /// [`Visit`] decides whether the search stops there, continues through
    /// it, or ignores it.
    ///
    /// ### Returns
    /// The cell and hop count that triggered [`Visit::Stop`], or `None` if
    /// the search ran out of cells to expand.
    pub fn breadth_first<F>(&self, start: Cell, mut visit: F) -> Option<(Cell, u32)>
    where
        F: FnMut(Cell, u32) -> Visit,
    {
        let mut seen = HashSet::from([start]);
        let mut queue = VecDeque::from([(start, 0u32)]);

        while let Some((cell, dist)) = queue.pop_front() {
            for next in self.neighbors_4(cell.x, cell.y) {
                if !seen.insert(next) {
                    continue;
                }
                match visit(next, dist + 1) {
                    Visit::Stop => return Some((next, dist + 1)),
                    Visit::Expand => queue.push_back((next, dist + 1)),
                    Visit::Skip => {}
                }
            }
        }
        None
    }

    /// Occupied cells 4-connected to `(x, y)`, including it.
    ///
    /// Empty when the start cell itself is not occupied.
    pub fn connected_component(&self, x: i32, y: i32) -> HashSet<Cell> {
        if !self.is_alive(x, y) {
            return HashSet::new();
        }
        let mut component = HashSet::from([Cell::new(x, y)]);
        self.breadth_first(Cell::new(x, y), |c, _| {
            if self.is_alive(c.x, c.y) {
                component.insert(c);
                Visit::Expand
            } else {
                Visit::Skip
            }
        });
        component
    }

    /// Sets `(x, y)` to `state` until the returned guard is dropped.
    ///
    /// The previous state is restored on every exit path, including early
    /// returns and unwinding, so simulated placements never leak.
    pub fn tentative(&mut self, x: i32, y: i32, state: CellState) -> Tentative<'_> {
        let previous = self.get(x, y);
        self.set(x, y, state);
        Tentative {
            grid: self,
            cell: Cell::new(x, y),
            previous,
        }
    }
}

/// Scoped single-cell mutation created by [`OccupancyGrid::tentative`].
pub struct Tentative<'g> {
    grid: &'g mut OccupancyGrid,
    cell: Cell,
    previous: CellState,
}

impl Tentative<'_> {
    /// Keeps the tentative state instead of restoring the previous one.
    pub fn commit(mut self) {
        self.previous = self.grid.get(self.cell.x, self.cell.y);
    }
}

impl Deref for Tentative<'_> {
    type Target = OccupancyGrid;

    fn deref(&self) -> &OccupancyGrid {
        self.grid
    }
}

impl Drop for Tentative<'_> {
    fn drop(&mut self) {
        self.grid.set(self.cell.x, self.cell.y, self.previous);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use CellState::{Empty, Occupied};

    fn grid_from(rows: &[&str]) -> OccupancyGrid {
        let mut grid = OccupancyGrid::with_size(rows[0].len(), rows.len());
        for (y, row) in rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                if ch == '#' {
                    grid.set(x as i32, y as i32, Occupied);
                }
            }
        }
        grid
    }

    #[test]
    fn out_of_bounds_reads_empty_and_ignores_writes() {
        let mut grid = OccupancyGrid::with_size(3, 2);
        grid.set(-1, 0, Occupied);
        grid.set(3, 1, Occupied);

        assert_eq!(grid.alive_count(), 0);
        assert_eq!(grid.get(-1, 0), Empty);
        assert!(!grid.is_alive(5, 5));
        assert!(!grid.is_empty(5, 5));
        assert!(grid.is_empty(2, 1));
    }

    #[test]
    fn neighbors_are_clipped_at_edges() {
        let grid = OccupancyGrid::with_size(4, 4);
        assert_eq!(grid.neighbors_4(0, 0).count(), 2);
        assert_eq!(grid.neighbors_8(0, 0).count(), 3);
        assert_eq!(grid.neighbors_4(1, 1).count(), 4);
        assert_eq!(grid.neighbors_8(1, 1).count(), 8);

        let order: Vec<Cell> = grid.neighbors_4(1, 1).collect();
        assert_eq!(
            order,
            vec![
                Cell::new(2, 1),
                Cell::new(0, 1),
                Cell::new(1, 2),
                Cell::new(1, 0)
            ]
        );
    }

    #[test]
    fn neighbor_iterators_are_restartable() {
        let grid = grid_from(&["#.#", "...", "#.#"]);
        let first: Vec<Cell> = grid.neighbors_8(1, 1).collect();
        let second: Vec<Cell> = grid.neighbors_8(1, 1).collect();
        assert_eq!(first, second);
        assert_eq!(grid.count_alive_neighbors_8(1, 1), 4);
        assert_eq!(grid.count_alive_neighbors_4(1, 1), 0);
        assert!(!grid.has_alive_neighbor_4(1, 1));
    }

    #[test]
    fn alive_cells_are_row_major() {
        let grid = grid_from(&[".#.", "#..", "..#"]);
        assert_eq!(
            grid.all_alive_cells(),
            vec![Cell::new(1, 0), Cell::new(0, 1), Cell::new(2, 2)]
        );
        assert_eq!(grid.alive_count(), 3);
    }

    #[test]
    fn connected_component_follows_four_connectivity() {
        let grid = grid_from(&["##..", ".#..", "..##", "...#"]);

        let upper = grid.connected_component(0, 0);
        assert_eq!(upper.len(), 3);
        assert!(upper.contains(&Cell::new(1, 1)));
        // (2,2) only touches (1,1) diagonally.
        assert!(!upper.contains(&Cell::new(2, 2)));

        assert_eq!(grid.connected_component(3, 3).len(), 3);
        assert!(grid.connected_component(3, 0).is_empty());
    }

    #[test]
    fn breadth_first_reports_hop_count() {
        let grid = grid_from(&["....", "....", "...#"]);
        let hit = grid.breadth_first(Cell::new(0, 0), |c, _| {
            if grid.is_alive(c.x, c.y) {
                Visit::Stop
            } else {
                Visit::Expand
            }
        });
        assert_eq!(hit, Some((Cell::new(3, 2), 5)));
    }

    #[test]
    fn tentative_restores_previous_state() {
        let mut grid = grid_from(&["#..", "...", "..."]);
        let before = grid.clone();

        {
            let probe = grid.tentative(1, 0, Occupied);
            assert!(probe.is_alive(1, 0));
            assert_eq!(probe.connected_component(0, 0).len(), 2);
        }
        assert_eq!(grid, before);

        {
            let probe = grid.tentative(0, 0, Empty);
            assert_eq!(probe.alive_count(), 0);
        }
        assert_eq!(grid, before);

        // Out-of-bounds probes are inert.
        drop(grid.tentative(9, 9, Occupied));
        assert_eq!(grid, before);
    }

    #[test]
    fn committed_placement_keeps_its_state() {
        let mut grid = grid_from(&["#..", "...", "..."]);
        grid.tentative(1, 0, Occupied).commit();
        assert!(grid.is_alive(1, 0));
        grid.tentative(0, 0, Empty).commit();
        assert_eq!(grid.all_alive_cells(), vec![Cell::new(1, 0)]);
    }

    #[test]
    fn frame_maps_between_cells_and_world() {
        let frame = GridFrame::covering(DVec2::new(10.0, 20.0), DVec2::new(19.0, 26.0), 3.0);
        assert_eq!((frame.cols, frame.rows), (4, 3));
        assert_eq!(frame.cell_center(0, 0), DVec2::new(11.5, 21.5));
        assert_eq!(frame.cell_center(2, 1), DVec2::new(17.5, 24.5));
        assert_eq!(frame.world_to_cell(DVec2::new(17.9, 24.0)), Cell::new(2, 1));
        assert_eq!(frame.world_to_cell(DVec2::new(9.0, 20.0)), Cell::new(-1, 0));
    }
}
