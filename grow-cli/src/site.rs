//! Site descriptions: boundary, constraint shapes, attractors, seed and
//! layer plan, loaded from JSON.

use glam::DVec2;
use grow_core::{
    attractor::{GrowthAttractor, GrowthField},
    config::GrowthConfig,
    constraints::SpatialConstraints,
    error::SetupError,
    geometry::{PlanarOracle, PlanarShape},
    stack::{LayerPlan, SeedPattern, seed_anchor, seed_cells},
    types::Cell,
};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AttractorSpec {
    Point {
        position: DVec2,
        strength: f64,
        radius: f64,
    },
    Line {
        curve: PlanarShape,
        strength: f64,
        radius: f64,
    },
}

impl From<AttractorSpec> for GrowthAttractor<PlanarShape> {
    fn from(spec: AttractorSpec) -> Self {
        match spec {
            AttractorSpec::Point {
                position,
                strength,
                radius,
            } => GrowthAttractor::point(position, strength, radius),
            AttractorSpec::Line {
                curve,
                strength,
                radius,
            } => GrowthAttractor::line(curve, strength, radius),
        }
    }
}

/// Seed anchor in world coordinates; the grid center when absent.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedSpec {
    pub point: Option<DVec2>,
    pub pattern: SeedPattern,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Site {
    pub boundary: Option<PlanarShape>,
    pub membranes: Vec<PlanarShape>,
    pub outer_lines: Vec<PlanarShape>,
    pub obstacles: Vec<PlanarShape>,
    pub attractors: Vec<AttractorSpec>,
    pub seed: SeedSpec,
    pub layers: LayerPlan,
}

/// Everything the engine needs from a site.
pub struct BuiltSite {
    pub constraints: SpatialConstraints<PlanarOracle>,
    pub field: GrowthField<PlanarShape>,
    pub seeds: Vec<Cell>,
}

impl Site {
    /// A 60 x 45 plot with a courtyard membrane, a fence line along the
    /// north edge, a wall obstacle, a street attractor and a noisy corner.
    pub fn demo() -> Self {
        Self {
            boundary: Some(PlanarShape::rectangle(
                DVec2::ZERO,
                DVec2::new(60.0, 45.0),
            )),
            membranes: vec![PlanarShape::rectangle(
                DVec2::new(36.0, 27.0),
                DVec2::new(45.0, 36.0),
            )],
            outer_lines: vec![PlanarShape::segment(
                DVec2::new(0.0, 44.0),
                DVec2::new(60.0, 44.0),
            )],
            obstacles: vec![PlanarShape::segment(
                DVec2::new(12.0, 6.0),
                DVec2::new(12.0, 18.0),
            )],
            attractors: vec![
                AttractorSpec::Line {
                    curve: PlanarShape::segment(DVec2::new(0.0, 22.5), DVec2::new(60.0, 22.5)),
                    strength: 1.5,
                    radius: 4.0,
                },
                AttractorSpec::Point {
                    position: DVec2::new(58.0, 2.0),
                    strength: -12.0,
                    radius: 3.0,
                },
            ],
            seed: SeedSpec {
                point: Some(DVec2::new(30.0, 22.5)),
                pattern: SeedPattern::Square2,
            },
            layers: LayerPlan::new(
                4,
                vec!["Industry".into(), "Work".into(), "Living".into()],
            ),
        }
    }

    /// Resolves the site against `config`.
    ///
    /// Obstacles are added after membranes and outer lines; seeds are
    /// expanded last, once every constraint is in place.
    pub fn build(self, config: &GrowthConfig) -> Result<BuiltSite, SetupError> {
        let boundary = self.boundary.ok_or(SetupError::MissingBoundary)?;
        let mut constraints = SpatialConstraints::new(PlanarOracle, boundary, config)?;
        for m in self.membranes {
            constraints.add_membrane(m);
        }
        for l in self.outer_lines {
            constraints.add_outer_line(l);
        }
        for o in self.obstacles {
            constraints.add_obstacle(o);
        }

        let field =
            GrowthField::from_attractors(self.attractors.into_iter().map(Into::into).collect())?;

        let anchor = seed_anchor(constraints.frame(), self.seed.point);
        let seeds = seed_cells(&constraints, anchor, self.seed.pattern)?;
        Ok(BuiltSite {
            constraints,
            field,
            seeds,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_site_builds() {
        let config = GrowthConfig::default();
        let built = Site::demo().build(&config).unwrap();
        // 60 / 3 + 1 by 45 / 3 + 1.
        assert_eq!(built.constraints.cols(), 21);
        assert_eq!(built.constraints.rows(), 16);
        assert_eq!(built.seeds.len(), 4);
        assert_eq!(built.field.attractors.len(), 2);
        assert!(!built.constraints.obstacle_cells().is_empty());
    }

    #[test]
    fn missing_boundary_aborts() {
        let err = Site::default().build(&GrowthConfig::default()).err();
        assert_eq!(err, Some(SetupError::MissingBoundary));
    }

    #[test]
    fn site_parses_from_json() {
        let json = r#"{
            "boundary": { "kind": "polygon", "points": [[0, 0], [30, 0], [30, 30], [0, 30]] },
            "attractors": [
                { "kind": "point", "position": [15, 15], "strength": 2.0, "radius": 5.0 },
                { "kind": "line",
                  "curve": { "kind": "polyline", "points": [[0, 10], [30, 10]] },
                  "strength": -1.0, "radius": 2.0 }
            ],
            "seed": { "pattern": "square3" },
            "layers": { "count": 2, "functions": ["Work"] }
        }"#;
        let site: Site = serde_json::from_str(json).unwrap();
        assert_eq!(site.attractors.len(), 2);
        assert_eq!(site.seed.pattern, SeedPattern::Square3);
        assert_eq!(site.layers.count, 2);

        let built = site.build(&GrowthConfig::default()).unwrap();
        // Centered 3x3 seed on an 11x11 grid.
        assert_eq!(built.seeds.len(), 9);
        assert!(built.seeds.contains(&Cell::new(5, 5)));
    }

    #[test]
    fn unreachable_seed_aborts() {
        let site = Site {
            seed: SeedSpec {
                point: Some(DVec2::new(-50.0, -50.0)),
                pattern: SeedPattern::Single,
            },
            ..Site::demo()
        };
        let err = site.build(&GrowthConfig::default()).err();
        assert_eq!(err, Some(SetupError::NoValidSeeds));
    }
}
