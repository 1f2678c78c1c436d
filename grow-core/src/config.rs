use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors raised when validating a [`GrowthConfig`] before a run starts.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("cell_size must be finite and positive, got {0}")]
    InvalidCellSize(f64),
    #[error("min_width must be at least 1")]
    ZeroMinWidth,
    #[error("max_line must be at least 1")]
    ZeroMaxLine,
    #[error("{table} table must contain at least one entry")]
    EmptyLayerTable { table: &'static str },
    #[error("layer {index}: min_cells {min} exceeds max_cells {max}")]
    MinExceedsMax { index: usize, min: usize, max: usize },
    #[error("{name} must lie in 0.0..=1.0, got {value}")]
    OutOfUnitRange { name: &'static str, value: f64 },
    #[error("strongly_negative_threshold {strongly} must not exceed 0.0")]
    InvalidNegativeThreshold { strongly: f64 },
    #[error("selection_pool must be at least 1")]
    EmptySelectionPool,
    #[error("selection weight {name} must be finite and non-negative, got {value}")]
    InvalidSelectionWeight { name: &'static str, value: f64 },
    #[error("light distance for {function:?} must be at least 1")]
    ZeroLightDistance { function: String },
    #[error("{name} clearance must be finite and non-negative, got {value}")]
    InvalidClearance { name: &'static str, value: f64 },
    #[error("frontier_radius must be at least 1")]
    ZeroFrontierRadius,
    #[error("{name} retry budget must be at least 1")]
    ZeroRetryBudget { name: &'static str },
    #[error("{name} must be finite, got {value}")]
    NonFiniteParameter { name: &'static str, value: f64 },
    #[error("sun_direction components must be finite")]
    InvalidSunDirection,
    #[error("attractor radius must be finite and positive, got {0}")]
    InvalidAttractorRadius(f64),
    #[error("attractor strength must be finite, got {0}")]
    InvalidAttractorStrength(f64),
    #[error("layer plan must contain at least one layer")]
    NoLayers,
}

/// Per-term multipliers of the candidate score.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScoreWeights {
    /// Multiplier of the summed growth-field influence.
    pub growth_point: f64,
    /// Multiplier of the live 4-neighbor count.
    pub connected: f64,
    pub smoothness: f64,
    pub convexity: f64,
    /// Multiplier of the sun-direction light term.
    pub light: f64,
    /// Multiplier of the obstacle proximity magnitude; negative values penalize.
    pub obstacle: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            growth_point: 2.0,
            connected: 1.8,
            smoothness: 1.5,
            convexity: 1.2,
            light: 0.6,
            obstacle: -1.2,
        }
    }
}

/// Growth targets of one layer, resolved from the per-layer tables.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LayerTargets {
    pub grow: usize,
    pub min_cells: usize,
    pub max_cells: usize,
}

/// Immutable configuration of one growth run.
///
/// Built once, validated with [`GrowthConfig::validate`], and threaded
/// by reference through every engine call.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GrowthConfig {
    /// Edge length of one cell in world units.
    pub cell_size: f64,
    /// Minimum run length a candidate must complete on at least one axis.
    pub min_width: usize,
    /// Maximum run length a candidate may create on at least one axis.
    pub max_line: usize,
    /// Cells to place per layer in the main growth loop, by layer index.
    pub growth_per_layer: Vec<usize>,
    /// Minimum occupied cells per layer, by layer index.
    pub min_cells_per_layer: Vec<usize>,
    /// Maximum occupied cells per layer, by layer index.
    pub max_cells_per_layer: Vec<usize>,
    pub weights: ScoreWeights,

    /// Summed field influence below which a cell is vetoed outright.
    pub hard_blockade_threshold: f64,
    /// Selection weight of candidates with a slightly negative score.
    pub negative_score_weight: f64,
    /// Score below which a candidate only gets `strongly_negative_weight`.
    pub strongly_negative_threshold: f64,
    pub strongly_negative_weight: f64,
    /// Number of best candidates entering the roulette draw.
    pub selection_pool: usize,
    /// Exponent scale for non-negative scores: weight = exp(score * scale).
    pub selection_exponent: f64,

    /// How strongly an upper layer follows the footprint below (0..=1).
    pub layer_inheritance: f64,
    /// Permitted share of unsupported growth (0..=1).
    pub layer_growth_freedom: f64,
    pub layer_support_bonus: f64,
    pub layer_overhang_penalty: f64,
    /// Below this freedom, cells may only grow above occupied cells.
    pub strict_support_threshold: f64,

    /// Maximum light distance by layer function label.
    pub light_distance: BTreeMap<String, u32>,
    pub default_light_distance: u32,
    /// Function label used for layers without an explicit one.
    pub default_function: String,

    /// Simulated light distance at or below which the edge bonus applies.
    pub edge_distance_threshold: u32,
    pub edge_bonus: f64,

    pub sun_direction: [f64; 3],
    /// Light term bonus added per layer index.
    pub light_height_bonus: f64,

    /// Obstacle clearance in cells.
    pub obstacle_clearance: f64,
    /// Outer-line clearance in cells.
    pub outer_line_clearance: f64,
    pub obstacle_cell_penalty: f64,
    pub obstacle_adjacent_penalty: f64,

    /// Consecutive failed rounds after which the main loop gives up.
    pub max_grow_attempts: usize,
    /// Chebyshev radius around live cells searched for candidates.
    pub frontier_radius: i32,
    pub max_extra_rounds: usize,
    pub max_extra_attempts: usize,
    /// Shuffled frontier cells tried per extra-growth attempt.
    pub extra_candidate_sample: usize,
    pub max_prune_iterations: usize,
    /// Largest grid (cols * rows) accepted at setup.
    pub max_grid_cells: usize,
}

impl Default for GrowthConfig {
    fn default() -> Self {
        Self {
            cell_size: 3.0,
            min_width: 1,
            max_line: 4,
            growth_per_layer: vec![
                50, 50, 35, 30, 25, 20, 28, 32, 30, 25, 20, 18, 15, 22, 25, 22, 18, 15, 12, 10,
            ],
            min_cells_per_layer: vec![
                300, 300, 200, 160, 120, 80, 120, 150, 140, 110, 80, 60, 50, 80, 100, 90, 70, 55,
                45, 35,
            ],
            max_cells_per_layer: vec![
                400, 400, 280, 220, 170, 120, 170, 200, 190, 160, 120, 90, 75, 120, 150, 130, 100,
                80, 65, 50,
            ],
            weights: ScoreWeights::default(),
            hard_blockade_threshold: -5.0,
            negative_score_weight: 0.3,
            strongly_negative_threshold: -20.0,
            strongly_negative_weight: 0.001,
            selection_pool: 20,
            selection_exponent: 0.5,
            layer_inheritance: 0.5,
            layer_growth_freedom: 0.3,
            layer_support_bonus: 3.0,
            layer_overhang_penalty: 2.0,
            strict_support_threshold: 0.1,
            light_distance: BTreeMap::from([
                ("Work".to_string(), 5),
                ("Living".to_string(), 7),
                ("Industry".to_string(), 10),
            ]),
            default_light_distance: 3,
            default_function: "Living".to_string(),
            edge_distance_threshold: 2,
            edge_bonus: 3.0,
            sun_direction: [0.5, 0.7, 0.8],
            light_height_bonus: 0.05,
            obstacle_clearance: 1.0,
            outer_line_clearance: 0.5,
            obstacle_cell_penalty: 10.0,
            obstacle_adjacent_penalty: 0.5,
            max_grow_attempts: 2000,
            frontier_radius: 2,
            max_extra_rounds: 10,
            max_extra_attempts: 500,
            extra_candidate_sample: 10,
            max_prune_iterations: 10_000,
            max_grid_cells: 300_000,
        }
    }
}

impl GrowthConfig {
    /// Resolves the growth targets of `layer`, clamping to the last table
    /// entry for layers beyond the table length.
    pub fn layer_targets(&self, layer: usize) -> LayerTargets {
        LayerTargets {
            grow: clamped(&self.growth_per_layer, layer),
            min_cells: clamped(&self.min_cells_per_layer, layer),
            max_cells: clamped(&self.max_cells_per_layer, layer),
        }
    }

    /// Maximum light distance for a layer function, falling back to
    /// `default_light_distance` for unknown labels.
    pub fn light_distance_for(&self, function: &str) -> u32 {
        self.light_distance
            .get(function)
            .copied()
            .unwrap_or(self.default_light_distance)
    }

    /// `true` when overhangs are forbidden outright.
    pub fn requires_strict_support(&self) -> bool {
        self.layer_growth_freedom < self.strict_support_threshold
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_grid()?;
        self.validate_layer_tables()?;
        self.validate_selection()?;
        self.validate_scoring()?;
        self.validate_inheritance()?;
        self.validate_light()?;
        self.validate_budgets()
    }

    fn validate_grid(&self) -> Result<(), ConfigError> {
        if !(self.cell_size.is_finite() && self.cell_size > 0.0) {
            return Err(ConfigError::InvalidCellSize(self.cell_size));
        }
        if self.min_width == 0 {
            return Err(ConfigError::ZeroMinWidth);
        }
        if self.max_line == 0 {
            return Err(ConfigError::ZeroMaxLine);
        }
        for (name, value) in [
            ("obstacle", self.obstacle_clearance),
            ("outer_line", self.outer_line_clearance),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::InvalidClearance { name, value });
            }
        }
        if self.frontier_radius < 1 {
            return Err(ConfigError::ZeroFrontierRadius);
        }
        Ok(())
    }

    fn validate_layer_tables(&self) -> Result<(), ConfigError> {
        for (table, values) in [
            ("growth_per_layer", &self.growth_per_layer),
            ("min_cells_per_layer", &self.min_cells_per_layer),
            ("max_cells_per_layer", &self.max_cells_per_layer),
        ] {
            if values.is_empty() {
                return Err(ConfigError::EmptyLayerTable { table });
            }
        }
        let longest = self
            .min_cells_per_layer
            .len()
            .max(self.max_cells_per_layer.len());
        for index in 0..longest {
            let LayerTargets {
                min_cells, max_cells, ..
            } = self.layer_targets(index);
            if min_cells > max_cells {
                return Err(ConfigError::MinExceedsMax {
                    index,
                    min: min_cells,
                    max: max_cells,
                });
            }
        }
        Ok(())
    }

    fn validate_selection(&self) -> Result<(), ConfigError> {
        if self.strongly_negative_threshold > 0.0 {
            return Err(ConfigError::InvalidNegativeThreshold {
                strongly: self.strongly_negative_threshold,
            });
        }
        if self.selection_pool == 0 {
            return Err(ConfigError::EmptySelectionPool);
        }
        for (name, value) in [
            ("negative_score_weight", self.negative_score_weight),
            ("strongly_negative_weight", self.strongly_negative_weight),
            ("selection_exponent", self.selection_exponent),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::InvalidSelectionWeight { name, value });
            }
        }
        Ok(())
    }

    fn validate_scoring(&self) -> Result<(), ConfigError> {
        let w = &self.weights;
        for (name, value) in [
            ("weights.growth_point", w.growth_point),
            ("weights.connected", w.connected),
            ("weights.smoothness", w.smoothness),
            ("weights.convexity", w.convexity),
            ("weights.light", w.light),
            ("weights.obstacle", w.obstacle),
            ("hard_blockade_threshold", self.hard_blockade_threshold),
            ("strongly_negative_threshold", self.strongly_negative_threshold),
            ("layer_support_bonus", self.layer_support_bonus),
            ("layer_overhang_penalty", self.layer_overhang_penalty),
            ("edge_bonus", self.edge_bonus),
            ("light_height_bonus", self.light_height_bonus),
            ("obstacle_cell_penalty", self.obstacle_cell_penalty),
            ("obstacle_adjacent_penalty", self.obstacle_adjacent_penalty),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::NonFiniteParameter { name, value });
            }
        }
        Ok(())
    }

    fn validate_inheritance(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("layer_inheritance", self.layer_inheritance),
            ("layer_growth_freedom", self.layer_growth_freedom),
            ("strict_support_threshold", self.strict_support_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::OutOfUnitRange { name, value });
            }
        }
        Ok(())
    }

    fn validate_light(&self) -> Result<(), ConfigError> {
        if self.default_light_distance == 0 {
            return Err(ConfigError::ZeroLightDistance {
                function: self.default_function.clone(),
            });
        }
        if let Some((function, _)) = self.light_distance.iter().find(|(_, d)| **d == 0) {
            return Err(ConfigError::ZeroLightDistance {
                function: function.clone(),
            });
        }
        if self.sun_direction.iter().any(|c| !c.is_finite()) {
            return Err(ConfigError::InvalidSunDirection);
        }
        Ok(())
    }

    fn validate_budgets(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("max_grow_attempts", self.max_grow_attempts),
            ("max_extra_attempts", self.max_extra_attempts),
            ("extra_candidate_sample", self.extra_candidate_sample),
            ("max_prune_iterations", self.max_prune_iterations),
            ("max_grid_cells", self.max_grid_cells),
        ] {
            if value == 0 {
                return Err(ConfigError::ZeroRetryBudget { name });
            }
        }
        Ok(())
    }
}

fn clamped(table: &[usize], index: usize) -> usize {
    table
        .get(index)
        .or_else(|| table.last())
        .copied()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(GrowthConfig::default().validate(), Ok(()));
    }

    #[test]
    fn layer_targets_clamp_to_last_entry() {
        let cfg = GrowthConfig {
            growth_per_layer: vec![10, 5],
            min_cells_per_layer: vec![20, 8],
            max_cells_per_layer: vec![30, 12],
            ..GrowthConfig::default()
        };

        assert_eq!(
            cfg.layer_targets(0),
            LayerTargets {
                grow: 10,
                min_cells: 20,
                max_cells: 30
            }
        );
        assert_eq!(cfg.layer_targets(1), cfg.layer_targets(7));
        assert_eq!(cfg.layer_targets(7).max_cells, 12);
    }

    #[test]
    fn light_distance_falls_back_to_default() {
        let cfg = GrowthConfig::default();
        assert_eq!(cfg.light_distance_for("Work"), 5);
        assert_eq!(cfg.light_distance_for("Industry"), 10);
        assert_eq!(cfg.light_distance_for("Storage"), 3);
    }

    #[test]
    fn validate_rejects_min_above_max() {
        let cfg = GrowthConfig {
            min_cells_per_layer: vec![10, 50],
            max_cells_per_layer: vec![20, 40],
            ..GrowthConfig::default()
        };
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::MinExceedsMax {
                index: 1,
                min: 50,
                max: 40
            })
        );
    }

    #[test]
    fn validate_rejects_bad_cell_size_and_ranges() {
        let cfg = GrowthConfig {
            cell_size: 0.0,
            ..GrowthConfig::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::InvalidCellSize(0.0)));

        let cfg = GrowthConfig {
            layer_growth_freedom: 1.5,
            ..GrowthConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::OutOfUnitRange {
                name: "layer_growth_freedom",
                ..
            })
        ));

        let cfg = GrowthConfig {
            growth_per_layer: Vec::new(),
            ..GrowthConfig::default()
        };
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::EmptyLayerTable {
                table: "growth_per_layer"
            })
        );
    }

    #[test]
    fn validate_rejects_zero_light_distance_entry() {
        let mut cfg = GrowthConfig::default();
        cfg.light_distance.insert("Storage".to_string(), 0);
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::ZeroLightDistance {
                function: "Storage".to_string()
            })
        );
    }

    #[test]
    fn validate_rejects_non_finite_scoring_parameters() {
        let mut cfg = GrowthConfig::default();
        cfg.weights.smoothness = f64::NAN;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::NonFiniteParameter {
                name: "weights.smoothness",
                ..
            })
        ));

        let cfg = GrowthConfig {
            edge_bonus: f64::INFINITY,
            ..GrowthConfig::default()
        };
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::NonFiniteParameter {
                name: "edge_bonus",
                value: f64::INFINITY
            })
        );

        let cfg = GrowthConfig {
            hard_blockade_threshold: f64::NEG_INFINITY,
            ..GrowthConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::NonFiniteParameter {
                name: "hard_blockade_threshold",
                ..
            })
        ));
    }

    #[test]
    fn strict_support_follows_threshold() {
        let mut cfg = GrowthConfig::default();
        assert!(!cfg.requires_strict_support());
        cfg.layer_growth_freedom = 0.05;
        assert!(cfg.requires_strict_support());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let json = r#"{
            "cell_size": 1.5,
            "weights": { "light": 0.0 },
            "light_distance": { "Work": 4 }
        }"#;
        let cfg: GrowthConfig = serde_json::from_str(json).expect("partial config should parse");
        assert_eq!(cfg.cell_size, 1.5);
        assert_eq!(cfg.weights.light, 0.0);
        assert_eq!(cfg.weights.smoothness, 1.5);
        assert_eq!(cfg.light_distance_for("Work"), 4);
        assert_eq!(cfg.light_distance_for("Living"), 3);
        assert_eq!(cfg.max_grow_attempts, 2000);
        assert_eq!(cfg.validate(), Ok(()));
    }
}
