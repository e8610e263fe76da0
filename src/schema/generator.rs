//! Infill generator parameters.

use serde::{Deserialize, Serialize};

use super::config::{
    ConfigError, check_count, check_order, check_positive, check_range, unknown_type,
};
use super::evaluator::EvaluatorParameters;

/// Default values for the anchor-pair random generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RandomDefaults {
    pub num_rods: usize,
    pub min_rod_length_cm: f64,
    pub max_rod_length_cm: f64,
    pub max_angle_deviation_deg: f64,
    pub num_layers: u32,
    pub min_anchor_distance_cm: f64,
    pub max_iterations: usize,
    pub max_duration_sec: f64,
    pub infill_weight_per_meter_kg_m: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub random_seed: Option<u64>,
}

impl Default for RandomDefaults {
    fn default() -> Self {
        Self {
            num_rods: 30,
            min_rod_length_cm: 50.0,
            max_rod_length_cm: 200.0,
            max_angle_deviation_deg: 30.0,
            num_layers: 2,
            min_anchor_distance_cm: 10.0,
            max_iterations: 1000,
            max_duration_sec: 60.0,
            infill_weight_per_meter_kg_m: 0.3,
            random_seed: None,
        }
    }
}

/// Limits shared by both random generators.
#[allow(clippy::too_many_arguments)]
fn check_rod_limits(
    num_rods: usize,
    min_rod_length_cm: f64,
    max_rod_length_cm: f64,
    max_angle_deviation_deg: f64,
    max_angle_limit_deg: f64,
    num_layers: u32,
    max_iterations: usize,
    max_duration_sec: f64,
    infill_weight_per_meter_kg_m: f64,
) -> Result<(), ConfigError> {
    check_count("num_rods", num_rods, 1, 200)?;
    check_positive("min_rod_length_cm", min_rod_length_cm)?;
    check_positive("max_rod_length_cm", max_rod_length_cm)?;
    check_order(
        "min_rod_length_cm",
        min_rod_length_cm,
        "max_rod_length_cm",
        max_rod_length_cm,
        false,
    )?;
    check_range(
        "max_angle_deviation_deg",
        max_angle_deviation_deg,
        0.0,
        max_angle_limit_deg,
    )?;
    check_count("num_layers", num_layers as usize, 1, 5)?;
    check_count("max_iterations", max_iterations, 1, usize::MAX)?;
    check_positive("max_duration_sec", max_duration_sec)?;
    check_positive("infill_weight_per_meter_kg_m", infill_weight_per_meter_kg_m)
}

/// Validated random generator parameters.
///
/// Read through [`RandomParameters::values`]; the only way in is
/// `TryFrom<RandomDefaults>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RandomDefaults", into = "RandomDefaults")]
pub struct RandomParameters {
    values: RandomDefaults,
}

impl TryFrom<RandomDefaults> for RandomParameters {
    type Error = ConfigError;

    fn try_from(d: RandomDefaults) -> Result<Self, Self::Error> {
        check_rod_limits(
            d.num_rods,
            d.min_rod_length_cm,
            d.max_rod_length_cm,
            d.max_angle_deviation_deg,
            45.0,
            d.num_layers,
            d.max_iterations,
            d.max_duration_sec,
            d.infill_weight_per_meter_kg_m,
        )?;
        check_positive("min_anchor_distance_cm", d.min_anchor_distance_cm)?;
        Ok(Self { values: d })
    }
}

impl From<RandomParameters> for RandomDefaults {
    fn from(p: RandomParameters) -> Self {
        p.values
    }
}

impl Default for RandomParameters {
    fn default() -> Self {
        Self {
            values: RandomDefaults::default(),
        }
    }
}

impl RandomParameters {
    pub fn values(&self) -> &RandomDefaults {
        &self.values
    }

    /// Same parameters with a fixed RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.values.random_seed = Some(seed);
        self
    }
}

/// Default values for the layered generator (`random_v2`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayeredDefaults {
    pub num_rods: usize,
    pub min_rod_length_cm: f64,
    pub max_rod_length_cm: f64,
    pub max_angle_deviation_deg: f64,
    pub num_layers: u32,
    /// Iteration budget per arrangement, shared by all layers.
    pub max_iterations: usize,
    pub max_duration_sec: f64,
    pub infill_weight_per_meter_kg_m: f64,
    pub max_evaluation_attempts: usize,
    pub max_evaluation_duration_sec: f64,
    pub min_acceptable_fitness: f64,
    pub min_anchor_distance_vertical_cm: f64,
    pub min_anchor_distance_other_cm: f64,
    pub main_direction_range_min_deg: f64,
    pub main_direction_range_max_deg: f64,
    pub random_angle_deviation_deg: f64,
    /// Arrangements generated and scored concurrently per batch.
    pub parallel_attempts: usize,
    pub evaluator: EvaluatorParameters,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub random_seed: Option<u64>,
}

impl Default for LayeredDefaults {
    fn default() -> Self {
        Self {
            num_rods: 30,
            min_rod_length_cm: 50.0,
            max_rod_length_cm: 200.0,
            max_angle_deviation_deg: 40.0,
            num_layers: 3,
            max_iterations: 1000,
            max_duration_sec: 60.0,
            infill_weight_per_meter_kg_m: 0.3,
            max_evaluation_attempts: 10,
            max_evaluation_duration_sec: 60.0,
            min_acceptable_fitness: 0.7,
            min_anchor_distance_vertical_cm: 15.0,
            min_anchor_distance_other_cm: 5.0,
            main_direction_range_min_deg: -30.0,
            main_direction_range_max_deg: 10.0,
            random_angle_deviation_deg: 20.0,
            parallel_attempts: 1,
            evaluator: EvaluatorParameters::default(),
            random_seed: None,
        }
    }
}

/// Validated layered generator parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "LayeredDefaults", into = "LayeredDefaults")]
pub struct LayeredParameters {
    values: LayeredDefaults,
}

impl TryFrom<LayeredDefaults> for LayeredParameters {
    type Error = ConfigError;

    fn try_from(d: LayeredDefaults) -> Result<Self, Self::Error> {
        check_rod_limits(
            d.num_rods,
            d.min_rod_length_cm,
            d.max_rod_length_cm,
            d.max_angle_deviation_deg,
            75.0,
            d.num_layers,
            d.max_iterations,
            d.max_duration_sec,
            d.infill_weight_per_meter_kg_m,
        )?;
        check_count("max_evaluation_attempts", d.max_evaluation_attempts, 1, usize::MAX)?;
        check_positive("max_evaluation_duration_sec", d.max_evaluation_duration_sec)?;
        check_range("min_acceptable_fitness", d.min_acceptable_fitness, 0.0, 1.0)?;
        check_positive(
            "min_anchor_distance_vertical_cm",
            d.min_anchor_distance_vertical_cm,
        )?;
        check_positive("min_anchor_distance_other_cm", d.min_anchor_distance_other_cm)?;
        check_range(
            "main_direction_range_min_deg",
            d.main_direction_range_min_deg,
            -90.0,
            90.0,
        )?;
        check_range(
            "main_direction_range_max_deg",
            d.main_direction_range_max_deg,
            -90.0,
            90.0,
        )?;
        check_order(
            "main_direction_range_min_deg",
            d.main_direction_range_min_deg,
            "main_direction_range_max_deg",
            d.main_direction_range_max_deg,
            true,
        )?;
        check_range(
            "random_angle_deviation_deg",
            d.random_angle_deviation_deg,
            0.0,
            f64::MAX,
        )?;
        check_count("parallel_attempts", d.parallel_attempts, 1, usize::MAX)?;
        Ok(Self { values: d })
    }
}

impl From<LayeredParameters> for LayeredDefaults {
    fn from(p: LayeredParameters) -> Self {
        p.values
    }
}

impl Default for LayeredParameters {
    fn default() -> Self {
        Self {
            values: LayeredDefaults::default(),
        }
    }
}

impl LayeredParameters {
    pub fn values(&self) -> &LayeredDefaults {
        &self.values
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.values.random_seed = Some(seed);
        self
    }

    /// Same parameters scored by a different evaluator.
    pub fn with_evaluator(mut self, evaluator: EvaluatorParameters) -> Self {
        self.values.evaluator = evaluator;
        self
    }

    /// Main direction of each layer (1-based order), linearly spaced over
    /// the configured range. A single layer uses the midpoint.
    pub fn layer_directions_deg(&self) -> Vec<f64> {
        let v = &self.values;
        let (min, max) = (v.main_direction_range_min_deg, v.main_direction_range_max_deg);
        let layers = v.num_layers as usize;
        if layers == 1 {
            return vec![(min + max) / 2.0];
        }
        (0..layers)
            .map(|i| min + (max - min) * i as f64 / (layers - 1) as f64)
            .collect()
    }
}

/// Generator selection by `"type"` discriminator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GeneratorParameters {
    /// Anchor pairs sampled along the boundary ring.
    Random(RandomParameters),
    /// Per-layer main directions with evaluator-driven attempts.
    #[serde(rename = "random_v2")]
    Layered(LayeredParameters),
}

/// Registered generator discriminators.
pub const GENERATOR_TYPES: &[&str] = &["random", "random_v2"];

impl Default for GeneratorParameters {
    fn default() -> Self {
        Self::Layered(LayeredParameters::default())
    }
}

impl GeneratorParameters {
    pub fn defaults_for(type_name: &str) -> Result<Self, ConfigError> {
        match type_name {
            "random" => Ok(Self::Random(RandomParameters::default())),
            "random_v2" => Ok(Self::Layered(LayeredParameters::default())),
            other => Err(unknown_type("generator", other, GENERATOR_TYPES)),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Random(_) => "random",
            Self::Layered(_) => "random_v2",
        }
    }
}
