use crate::config::ConfigError;
use crate::geometry::{GeometryError, GeometryOracle};
use crate::grid::GridFrame;
use glam::DVec2;

/// Point or line source of growth influence.
///
/// Positive strength attracts, negative strength repels. `radius` is given
/// in cells; influence falls off linearly to zero at that distance.
#[derive(Clone, Debug, PartialEq)]
pub enum GrowthAttractor<S> {
    Point {
        position: DVec2,
        strength: f64,
        radius: f64,
    },
    Line {
        curve: S,
        strength: f64,
        radius: f64,
    },
}

impl<S> GrowthAttractor<S> {
    pub fn point(position: DVec2, strength: f64, radius: f64) -> Self {
        GrowthAttractor::Point {
            position,
            strength,
            radius,
        }
    }

    pub fn line(curve: S, strength: f64, radius: f64) -> Self {
        GrowthAttractor::Line {
            curve,
            strength,
            radius,
        }
    }

    pub fn strength(&self) -> f64 {
        match self {
            GrowthAttractor::Point { strength, .. } | GrowthAttractor::Line { strength, .. } => {
                *strength
            }
        }
    }

    pub fn radius(&self) -> f64 {
        match self {
            GrowthAttractor::Point { radius, .. } | GrowthAttractor::Line { radius, .. } => *radius,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let radius = self.radius();
        if !(radius.is_finite() && radius > 0.0) {
            return Err(ConfigError::InvalidAttractorRadius(radius));
        }
        if !self.strength().is_finite() {
            return Err(ConfigError::InvalidAttractorStrength(self.strength()));
        }
        Ok(())
    }

    fn falloff(&self, dist: f64, cell_size: f64) -> f64 {
        let reach = self.radius() * cell_size;
        if dist > reach {
            0.0
        } else {
            self.strength() * (1.0 - dist / reach)
        }
    }

    /// Influence of this attractor on the center of cell `(x, y)`.
    pub fn influence<O>(
        &self,
        oracle: &O,
        frame: &GridFrame,
        x: i32,
        y: i32,
    ) -> Result<f64, GeometryError>
    where
        O: GeometryOracle<Shape = S>,
    {
        let center = frame.cell_center(x, y);
        let dist = match self {
            GrowthAttractor::Point { position, .. } => center.distance(*position),
            GrowthAttractor::Line { curve, .. } => oracle.nearest_distance(curve, center)?,
        };
        Ok(self.falloff(dist, frame.cell_size))
    }
}

/// Ordered attractors of one run. Immutable once growth starts.
#[derive(Clone, Debug)]
pub struct GrowthField<S> {
    pub attractors: Vec<GrowthAttractor<S>>,
}

impl<S> Default for GrowthField<S> {
    fn default() -> Self {
        Self {
            attractors: Vec::new(),
        }
    }
}

impl<S> GrowthField<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_attractors(attractors: Vec<GrowthAttractor<S>>) -> Result<Self, ConfigError> {
        attractors.iter().try_for_each(GrowthAttractor::validate)?;
        Ok(Self { attractors })
    }

    pub fn add(&mut self, attractor: GrowthAttractor<S>) -> Result<(), ConfigError> {
        attractor.validate()?;
        self.attractors.push(attractor);
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.attractors.is_empty()
    }

    /// Summed influence of every attractor on cell `(x, y)`.
    ///
    /// ### Returns
    /// The sum over attractors that could be evaluated, and the number of
    /// attractors whose oracle query failed (those contribute nothing).
    pub fn influence<O>(&self, oracle: &O, frame: &GridFrame, x: i32, y: i32) -> (f64, usize)
    where
        O: GeometryOracle<Shape = S>,
    {
        self.attractors
            .iter()
            .fold((0.0, 0), |(sum, failures), a| {
                match a.influence(oracle, frame, x, y) {
                    Ok(v) => (sum + v, failures),
                    Err(_) => (sum, failures + 1),
                }
            })
    }
}
