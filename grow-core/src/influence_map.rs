use crate::attractor::GrowthField;
use crate::geometry::GeometryOracle;
use crate::grid::GridFrame;
use crate::types::Cell;
use tracing::warn;

/// Dense per-cell buffer of summed growth-field influence.
///
/// The growth field never changes during a run, so every cell's influence
/// is accumulated once up front. The engine then reads it for both the
/// hard blockade and the score term without touching the oracle again.
///
/// Internally `values[i]` belongs to the cell at row-major index `i`.
#[derive(Clone, Debug)]
pub struct InfluenceMap {
    cols: usize,
    rows: usize,
    /// Accumulated influence for each cell.
    values: Vec<f64>,
}

impl InfluenceMap {
    /// Creates a map of `cols * rows` cells with zero influence everywhere.
    pub fn zeroed(cols: usize, rows: usize) -> Self {
        Self {
            cols,
            rows,
            values: vec![0.0; cols * rows],
        }
    }

    /// Accumulates `field` over every cell of `frame`.
    ///
    /// Attractors whose oracle query fails contribute nothing to that
    /// cell. Failures are summed and reported in a single warning.
    ///
    /// ### Parameters
    /// - `field` - Attractors and repellers of the run.
    /// - `oracle` - Geometry oracle answering line-attractor distances.
    /// - `frame` - Grid placement; cell centers are sampled.
    ///
    /// ### Returns
    /// A fully populated [`InfluenceMap`] covering `frame`.
    pub fn compute<O: GeometryOracle>(
        field: &GrowthField<O::Shape>,
        oracle: &O,
        frame: &GridFrame,
    ) -> Self {
        let mut map = Self::zeroed(frame.cols, frame.rows);
        if field.is_empty() {
            return map;
        }

        let mut failures = 0usize;
        for y in 0..frame.rows as i32 {
            for x in 0..frame.cols as i32 {
                let (value, failed) = field.influence(oracle, frame, x, y);
                map.add(Cell::new(x, y), value);
                failures += failed;
            }
        }
        if failures > 0 {
            warn!(
                failures,
                "growth attractor queries failed; treated as zero influence"
            );
        }
        map
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        (x >= 0 && y >= 0 && (x as usize) < self.cols && (y as usize) < self.rows)
            .then(|| y as usize * self.cols + x as usize)
    }

    /// Adds `value` to the influence of `cell`; out-of-range cells are ignored.
    #[inline]
    pub fn add(&mut self, cell: Cell, value: f64) {
        if let Some(i) = self.index(cell.x, cell.y) {
            self.values[i] += value;
        }
    }

    /// Summed influence at `(x, y)`, or `0.0` outside the map.
    #[inline]
    pub fn get(&self, x: i32, y: i32) -> f64 {
        self.index(x, y).map_or(0.0, |i| self.values[i])
    }

    /// Returns `true` if the influence at `(x, y)` is below `threshold`,
    /// i.e. the field vetoes the cell outright.
    #[inline]
    pub fn is_blockaded(&self, x: i32, y: i32, threshold: f64) -> bool {
        self.get(x, y) < threshold
    }

    /// Cells whose influence is non-zero, in row-major order.
    pub fn influenced_cells(&self) -> impl Iterator<Item = Cell> + '_ {
        let cols = self.cols;
        self.values
            .iter()
            .enumerate()
            .filter(|(_, v)| **v != 0.0)
            .map(move |(i, _)| Cell::new((i % cols) as i32, (i / cols) as i32))
    }
}
