use crate::config::ConfigError;
use crate::geometry::GeometryError;
use thiserror::Error;

/// Unrecoverable problems detected before any layer is grown.
///
/// No partial output is produced when one of these is returned.
#[derive(Debug, Error, PartialEq)]
pub enum SetupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("no boundary was configured")]
    MissingBoundary,
    #[error("boundary extent could not be determined: {0}")]
    BoundaryExtent(GeometryError),
    #[error("boundary extent yields a degenerate {cols}x{rows} grid")]
    DegenerateGrid { cols: usize, rows: usize },
    #[error("grid of {cells} cells exceeds the limit of {limit}")]
    GridTooLarge { cells: usize, limit: usize },
    #[error("no seed cell lies inside the allowed region")]
    NoValidSeeds,
}
