use glam::IVec2;

/// Integer coordinate of one cell in a layer grid.
///
/// `x` indexes columns and `y` indexes rows. Coordinates are only
/// meaningful relative to the [`crate::grid::GridFrame`] shared by all
/// layers of one run.
pub type Cell = IVec2;

/// Binary state of one grid cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CellState {
    #[default]
    Empty,
    Occupied,
}

impl CellState {
    #[inline]
    pub fn is_occupied(self) -> bool {
        self == CellState::Occupied
    }
}

/// Offsets of the four cardinal neighbors, in scan order E, W, S, N.
pub const CARDINAL: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

/// Offsets of the four diagonal corners.
pub const DIAGONAL: [(i32, i32); 4] = [(-1, -1), (-1, 1), (1, -1), (1, 1)];
