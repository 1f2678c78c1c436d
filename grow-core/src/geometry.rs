//! Geometry oracle seam.
//!
//! The growth engine never inspects shapes itself. Boundaries, membranes,
//! outer lines, obstacles and line attractors are opaque
//! [`GeometryOracle::Shape`] values, queried through three pure calls.
//! Callers treat every [`GeometryError`] as a soft failure and fall back
//! to the permissive answer.
//!
//! [`PlanarOracle`] is a self-contained implementation over polygons and
//! polylines, used by the command line runner and by tests.

use glam::DVec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure of a single geometry query.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GeometryError {
    #[error("shape has no vertices")]
    EmptyShape,
    #[error("containment is undefined for an open curve")]
    OpenCurve,
    #[error("geometry query failed: {0}")]
    Query(String),
}

/// Host-provided geometry queries.
pub trait GeometryOracle {
    type Shape;

    /// Returns `true` if `point` lies inside the closed `region`.
    fn contains(&self, region: &Self::Shape, point: DVec2) -> Result<bool, GeometryError>;

    /// Distance from `point` to the nearest point on `curve`.
    fn nearest_distance(&self, curve: &Self::Shape, point: DVec2) -> Result<f64, GeometryError>;

    /// Axis-aligned bounds of `shape` as `(min, max)`.
    fn bounding_box(&self, shape: &Self::Shape) -> Result<(DVec2, DVec2), GeometryError>;
}

/// Planar shape understood by [`PlanarOracle`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "points", rename_all = "snake_case")]
pub enum PlanarShape {
    /// Closed ring; the closing edge from last to first vertex is implied.
    Polygon(Vec<DVec2>),
    /// Open chain of segments.
    Polyline(Vec<DVec2>),
}

impl PlanarShape {
    pub fn rectangle(min: DVec2, max: DVec2) -> Self {
        PlanarShape::Polygon(vec![
            min,
            DVec2::new(max.x, min.y),
            max,
            DVec2::new(min.x, max.y),
        ])
    }

    pub fn segment(a: DVec2, b: DVec2) -> Self {
        PlanarShape::Polyline(vec![a, b])
    }

    pub fn vertices(&self) -> &[DVec2] {
        match self {
            PlanarShape::Polygon(points) | PlanarShape::Polyline(points) => points,
        }
    }

    fn edges(&self) -> impl Iterator<Item = (DVec2, DVec2)> + '_ {
        let points = self.vertices();
        let closing = match self {
            PlanarShape::Polygon(p) if p.len() > 2 => Some((p[p.len() - 1], p[0])),
            _ => None,
        };
        points
            .windows(2)
            .map(|w| (w[0], w[1]))
            .chain(closing)
    }
}

/// Reference oracle over [`PlanarShape`]s.
#[derive(Clone, Copy, Debug, Default)]
pub struct PlanarOracle;

impl GeometryOracle for PlanarOracle {
    type Shape = PlanarShape;

    fn contains(&self, region: &PlanarShape, point: DVec2) -> Result<bool, GeometryError> {
        let ring = match region {
            PlanarShape::Polygon(ring) => ring,
            PlanarShape::Polyline(_) => return Err(GeometryError::OpenCurve),
        };
        if ring.len() < 3 {
            return Err(GeometryError::EmptyShape);
        }

        // Even-odd crossing test.
        let mut inside = false;
        let mut j = ring.len() - 1;
        for i in 0..ring.len() {
            let (a, b) = (ring[i], ring[j]);
            if (a.y > point.y) != (b.y > point.y) {
                let cross_x = (b.x - a.x) * (point.y - a.y) / (b.y - a.y) + a.x;
                if point.x < cross_x {
                    inside = !inside;
                }
            }
            j = i;
        }
        Ok(inside)
    }

    fn nearest_distance(&self, curve: &PlanarShape, point: DVec2) -> Result<f64, GeometryError> {
        match curve.vertices() {
            [] => Err(GeometryError::EmptyShape),
            [only] => Ok(only.distance(point)),
            _ => Ok(curve
                .edges()
                .map(|(a, b)| segment_distance(a, b, point))
                .fold(f64::INFINITY, f64::min)),
        }
    }

    fn bounding_box(&self, shape: &PlanarShape) -> Result<(DVec2, DVec2), GeometryError> {
        let points = shape.vertices();
        if points.is_empty() {
            return Err(GeometryError::EmptyShape);
        }
        let min = points.iter().copied().fold(DVec2::INFINITY, DVec2::min);
        let max = points.iter().copied().fold(DVec2::NEG_INFINITY, DVec2::max);
        Ok((min, max))
    }
}

fn segment_distance(a: DVec2, b: DVec2, p: DVec2) -> f64 {
    let ab = b - a;
    let len2 = ab.length_squared();
    if len2 == 0.0 {
        return a.distance(p);
    }
    let t = ((p - a).dot(ab) / len2).clamp(0.0, 1.0);
    (a + ab * t).distance(p)
}
