use crate::config::GrowthConfig;
use crate::error::SetupError;
use crate::geometry::GeometryOracle;
use crate::grid::GridFrame;
use crate::types::{CARDINAL, Cell};
use glam::DVec2;
use std::collections::HashSet;
use tracing::{debug, trace, warn};

/// Spatial legality of cells, shared read-only by every layer.
///
/// Owns the geometry oracle and every constraint shape. Obstacle clearance
/// is resolved into a cell set once, when the obstacle is added; all other
/// predicates query the oracle on demand. Oracle failures never block a
/// cell.
pub struct SpatialConstraints<O: GeometryOracle> {
    oracle: O,
    frame: GridFrame,
    boundary: O::Shape,
    membranes: Vec<O::Shape>,
    outer_lines: Vec<O::Shape>,
    obstacles: Vec<O::Shape>,
    obstacle_cells: HashSet<Cell>,
    obstacle_clearance: f64,
    outer_line_clearance: f64,
    max_grid_cells: usize,
}

impl<O: GeometryOracle> SpatialConstraints<O> {
    /// Builds constraints for `boundary`, deriving the grid frame from its
    /// bounding box. `config` is validated first.
    pub fn new(oracle: O, boundary: O::Shape, config: &GrowthConfig) -> Result<Self, SetupError> {
        config.validate()?;
        let frame = derive_frame(&oracle, &boundary, config.cell_size, config.max_grid_cells)?;
        debug!(cols = frame.cols, rows = frame.rows, "derived grid frame from boundary");
        Ok(Self {
            oracle,
            frame,
            boundary,
            membranes: Vec::new(),
            outer_lines: Vec::new(),
            obstacles: Vec::new(),
            obstacle_cells: HashSet::new(),
            obstacle_clearance: config.obstacle_clearance,
            outer_line_clearance: config.outer_line_clearance,
            max_grid_cells: config.max_grid_cells,
        })
    }

    /// Replaces the boundary and re-derives the frame.
    ///
    /// Cached obstacle cells are recomputed against the new frame.
    pub fn set_boundary(&mut self, boundary: O::Shape) -> Result<(), SetupError> {
        self.frame = derive_frame(
            &self.oracle,
            &boundary,
            self.frame.cell_size,
            self.max_grid_cells,
        )?;
        self.boundary = boundary;
        self.obstacle_cells.clear();
        for i in 0..self.obstacles.len() {
            let blocked = self.blocked_by(&self.obstacles[i]);
            self.obstacle_cells.extend(blocked);
        }
        Ok(())
    }

    pub fn add_membrane(&mut self, membrane: O::Shape) {
        self.membranes.push(membrane);
    }

    pub fn add_outer_line(&mut self, line: O::Shape) {
        self.outer_lines.push(line);
    }

    /// Adds an obstacle and caches every cell whose center lies within
    /// the obstacle clearance of it.
    pub fn add_obstacle(&mut self, obstacle: O::Shape) {
        let blocked = self.blocked_by(&obstacle);
        debug!(cells = blocked.len(), "obstacle blocks cells");
        self.obstacle_cells.extend(blocked);
        self.obstacles.push(obstacle);
    }

    fn blocked_by(&self, obstacle: &O::Shape) -> Vec<Cell> {
        let reach = self.obstacle_clearance * self.frame.cell_size;
        let mut blocked = Vec::new();
        let mut failures = 0usize;
        for y in 0..self.frame.rows as i32 {
            for x in 0..self.frame.cols as i32 {
                match self
                    .oracle
                    .nearest_distance(obstacle, self.frame.cell_center(x, y))
                {
                    Ok(d) if d <= reach => blocked.push(Cell::new(x, y)),
                    Ok(_) => {}
                    Err(_) => failures += 1,
                }
            }
        }
        if failures > 0 {
            warn!(failures, "obstacle distance queries failed; cells left unblocked");
        }
        blocked
    }

    #[inline]
    pub fn frame(&self) -> &GridFrame {
        &self.frame
    }

    #[inline]
    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    pub fn cols(&self) -> usize {
        self.frame.cols
    }

    pub fn rows(&self) -> usize {
        self.frame.rows
    }

    #[inline]
    pub fn is_obstacle(&self, x: i32, y: i32) -> bool {
        self.obstacle_cells.contains(&Cell::new(x, y))
    }

    /// Number of cardinal neighbors of `(x, y)` blocked by obstacles.
    pub fn adjacent_obstacles(&self, x: i32, y: i32) -> usize {
        CARDINAL
            .into_iter()
            .filter(|(dx, dy)| self.is_obstacle(x + dx, y + dy))
            .count()
    }

    pub fn obstacle_cells(&self) -> &HashSet<Cell> {
        &self.obstacle_cells
    }

    fn center(&self, x: i32, y: i32) -> DVec2 {
        self.frame.cell_center(x, y)
    }

    pub fn is_in_boundary(&self, x: i32, y: i32) -> bool {
        match self.oracle.contains(&self.boundary, self.center(x, y)) {
            Ok(inside) => inside,
            Err(err) => {
                trace!(x, y, %err, "boundary containment failed; allowing cell");
                true
            }
        }
    }

    pub fn is_in_membrane(&self, x: i32, y: i32) -> bool {
        let p = self.center(x, y);
        self.membranes
            .iter()
            .any(|m| match self.oracle.contains(m, p) {
                Ok(inside) => inside,
                Err(err) => {
                    trace!(x, y, %err, "membrane containment failed; ignoring membrane");
                    false
                }
            })
    }

    pub fn is_blocked_by_outer_line(&self, x: i32, y: i32) -> bool {
        let p = self.center(x, y);
        let reach = self.outer_line_clearance * self.frame.cell_size;
        self.outer_lines
            .iter()
            .any(|line| match self.oracle.nearest_distance(line, p) {
                Ok(d) => d <= reach,
                Err(err) => {
                    trace!(x, y, %err, "outer line distance failed; ignoring line");
                    false
                }
            })
    }

    /// Single legality gate for a cell: in bounds, not obstacle-blocked,
    /// inside the boundary, outside every membrane and clear of every
    /// outer line.
    pub fn is_allowed(&self, x: i32, y: i32) -> bool {
        self.frame.in_bounds(x, y)
            && !self.is_obstacle(x, y)
            && self.is_in_boundary(x, y)
            && !self.is_in_membrane(x, y)
            && !self.is_blocked_by_outer_line(x, y)
    }
}

fn derive_frame<O: GeometryOracle>(
    oracle: &O,
    boundary: &O::Shape,
    cell_size: f64,
    max_cells: usize,
) -> Result<GridFrame, SetupError> {
    let (min, max) = oracle
        .bounding_box(boundary)
        .map_err(SetupError::BoundaryExtent)?;
    if !(min.is_finite() && max.is_finite()) || max.x < min.x || max.y < min.y {
        return Err(SetupError::DegenerateGrid { cols: 0, rows: 0 });
    }
    let frame = GridFrame::covering(min, max, cell_size);
    if frame.cols < 2 || frame.rows < 2 {
        return Err(SetupError::DegenerateGrid {
            cols: frame.cols,
            rows: frame.rows,
        });
    }
    let cells = frame.cols.checked_mul(frame.rows).unwrap_or(usize::MAX);
    if cells > max_cells {
        return Err(SetupError::GridTooLarge {
            cells,
            limit: max_cells,
        });
    }
    Ok(frame)
}
