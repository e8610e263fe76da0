//! Shape parameters.
//!
//! Each shape kind has a plain `*Defaults` record (no invariants) and a
//! validated `*Parameters` type that can only be built through
//! `TryFrom<*Defaults>`. Deserialization goes through the same check.

use serde::{Deserialize, Serialize};

use super::config::{ConfigError, check_count, check_positive, unknown_type};

fn default_frame_weight() -> f64 {
    0.5
}

/// Default values for staircase railings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StaircaseDefaults {
    pub post_length_cm: f64,
    pub stair_width_cm: f64,
    pub stair_height_cm: f64,
    pub num_steps: usize,
    pub frame_weight_per_meter_kg_m: f64,
}

impl Default for StaircaseDefaults {
    fn default() -> Self {
        Self {
            post_length_cm: 150.0,
            stair_width_cm: 280.0,
            stair_height_cm: 280.0,
            num_steps: 10,
            frame_weight_per_meter_kg_m: default_frame_weight(),
        }
    }
}

/// Validated staircase parameters.
///
/// Dimensions and weight are positive, `num_steps` is in 1..=50.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StaircaseDefaults", into = "StaircaseDefaults")]
pub struct StaircaseParameters {
    post_length_cm: f64,
    stair_width_cm: f64,
    stair_height_cm: f64,
    num_steps: usize,
    frame_weight_per_meter_kg_m: f64,
}

impl TryFrom<StaircaseDefaults> for StaircaseParameters {
    type Error = ConfigError;

    fn try_from(d: StaircaseDefaults) -> Result<Self, Self::Error> {
        check_positive("post_length_cm", d.post_length_cm)?;
        check_positive("stair_width_cm", d.stair_width_cm)?;
        check_positive("stair_height_cm", d.stair_height_cm)?;
        check_count("num_steps", d.num_steps, 1, 50)?;
        check_positive("frame_weight_per_meter_kg_m", d.frame_weight_per_meter_kg_m)?;
        Ok(Self::from_checked(d))
    }
}

impl Default for StaircaseParameters {
    fn default() -> Self {
        Self::from_checked(StaircaseDefaults::default())
    }
}

impl From<StaircaseParameters> for StaircaseDefaults {
    fn from(p: StaircaseParameters) -> Self {
        Self {
            post_length_cm: p.post_length_cm,
            stair_width_cm: p.stair_width_cm,
            stair_height_cm: p.stair_height_cm,
            num_steps: p.num_steps,
            frame_weight_per_meter_kg_m: p.frame_weight_per_meter_kg_m,
        }
    }
}

impl StaircaseParameters {
    fn from_checked(d: StaircaseDefaults) -> Self {
        Self {
            post_length_cm: d.post_length_cm,
            stair_width_cm: d.stair_width_cm,
            stair_height_cm: d.stair_height_cm,
            num_steps: d.num_steps,
            frame_weight_per_meter_kg_m: d.frame_weight_per_meter_kg_m,
        }
    }

    pub fn post_length_cm(&self) -> f64 {
        self.post_length_cm
    }

    pub fn stair_width_cm(&self) -> f64 {
        self.stair_width_cm
    }

    pub fn stair_height_cm(&self) -> f64 {
        self.stair_height_cm
    }

    pub fn num_steps(&self) -> usize {
        self.num_steps
    }

    pub fn frame_weight_per_meter_kg_m(&self) -> f64 {
        self.frame_weight_per_meter_kg_m
    }

    pub fn step_width_cm(&self) -> f64 {
        self.stair_width_cm / self.num_steps as f64
    }

    pub fn step_height_cm(&self) -> f64 {
        self.stair_height_cm / self.num_steps as f64
    }
}

/// Default values for rectangular railings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RectangularDefaults {
    pub width_cm: f64,
    pub height_cm: f64,
    pub frame_weight_per_meter_kg_m: f64,
}

impl Default for RectangularDefaults {
    fn default() -> Self {
        Self {
            width_cm: 200.0,
            height_cm: 100.0,
            frame_weight_per_meter_kg_m: default_frame_weight(),
        }
    }
}

/// Validated rectangular parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RectangularDefaults", into = "RectangularDefaults")]
pub struct RectangularParameters {
    width_cm: f64,
    height_cm: f64,
    frame_weight_per_meter_kg_m: f64,
}

impl TryFrom<RectangularDefaults> for RectangularParameters {
    type Error = ConfigError;

    fn try_from(d: RectangularDefaults) -> Result<Self, Self::Error> {
        check_positive("width_cm", d.width_cm)?;
        check_positive("height_cm", d.height_cm)?;
        check_positive("frame_weight_per_meter_kg_m", d.frame_weight_per_meter_kg_m)?;
        Ok(Self::from_checked(d))
    }
}

impl Default for RectangularParameters {
    fn default() -> Self {
        Self::from_checked(RectangularDefaults::default())
    }
}

impl From<RectangularParameters> for RectangularDefaults {
    fn from(p: RectangularParameters) -> Self {
        Self {
            width_cm: p.width_cm,
            height_cm: p.height_cm,
            frame_weight_per_meter_kg_m: p.frame_weight_per_meter_kg_m,
        }
    }
}

impl RectangularParameters {
    fn from_checked(d: RectangularDefaults) -> Self {
        Self {
            width_cm: d.width_cm,
            height_cm: d.height_cm,
            frame_weight_per_meter_kg_m: d.frame_weight_per_meter_kg_m,
        }
    }

    pub fn width_cm(&self) -> f64 {
        self.width_cm
    }

    pub fn height_cm(&self) -> f64 {
        self.height_cm
    }

    pub fn frame_weight_per_meter_kg_m(&self) -> f64 {
        self.frame_weight_per_meter_kg_m
    }
}

/// Default values for parallelogram railings (sloped top and bottom rails).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParallelogramDefaults {
    pub post_length_cm: f64,
    /// Horizontal distance between the posts.
    pub slope_width_cm: f64,
    /// Rise from the left post base to the right post base.
    pub slope_height_cm: f64,
    pub frame_weight_per_meter_kg_m: f64,
}

impl Default for ParallelogramDefaults {
    fn default() -> Self {
        Self {
            post_length_cm: 100.0,
            slope_width_cm: 300.0,
            slope_height_cm: 150.0,
            frame_weight_per_meter_kg_m: default_frame_weight(),
        }
    }
}

/// Validated parallelogram parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ParallelogramDefaults", into = "ParallelogramDefaults")]
pub struct ParallelogramParameters {
    post_length_cm: f64,
    slope_width_cm: f64,
    slope_height_cm: f64,
    frame_weight_per_meter_kg_m: f64,
}

impl TryFrom<ParallelogramDefaults> for ParallelogramParameters {
    type Error = ConfigError;

    fn try_from(d: ParallelogramDefaults) -> Result<Self, Self::Error> {
        check_positive("post_length_cm", d.post_length_cm)?;
        check_positive("slope_width_cm", d.slope_width_cm)?;
        check_positive("slope_height_cm", d.slope_height_cm)?;
        check_positive("frame_weight_per_meter_kg_m", d.frame_weight_per_meter_kg_m)?;
        Ok(Self::from_checked(d))
    }
}

impl Default for ParallelogramParameters {
    fn default() -> Self {
        Self::from_checked(ParallelogramDefaults::default())
    }
}

impl From<ParallelogramParameters> for ParallelogramDefaults {
    fn from(p: ParallelogramParameters) -> Self {
        Self {
            post_length_cm: p.post_length_cm,
            slope_width_cm: p.slope_width_cm,
            slope_height_cm: p.slope_height_cm,
            frame_weight_per_meter_kg_m: p.frame_weight_per_meter_kg_m,
        }
    }
}

impl ParallelogramParameters {
    fn from_checked(d: ParallelogramDefaults) -> Self {
        Self {
            post_length_cm: d.post_length_cm,
            slope_width_cm: d.slope_width_cm,
            slope_height_cm: d.slope_height_cm,
            frame_weight_per_meter_kg_m: d.frame_weight_per_meter_kg_m,
        }
    }

    pub fn post_length_cm(&self) -> f64 {
        self.post_length_cm
    }

    pub fn slope_width_cm(&self) -> f64 {
        self.slope_width_cm
    }

    pub fn slope_height_cm(&self) -> f64 {
        self.slope_height_cm
    }

    pub fn frame_weight_per_meter_kg_m(&self) -> f64 {
        self.frame_weight_per_meter_kg_m
    }
}

/// Shape selection by `"type"` discriminator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ShapeParameters {
    /// Stepped stair profile with posts and a sloped handrail.
    Staircase(StaircaseParameters),
    /// Axis-aligned rectangle.
    Rectangular(RectangularParameters),
    /// Two equal posts joined by parallel sloped rails.
    Parallelogram(ParallelogramParameters),
}

/// Registered shape discriminators.
pub const SHAPE_TYPES: &[&str] = &["staircase", "rectangular", "parallelogram"];

impl Default for ShapeParameters {
    fn default() -> Self {
        Self::Staircase(StaircaseParameters::default())
    }
}

impl ShapeParameters {
    /// Validated defaults for a registered discriminator.
    pub fn defaults_for(type_name: &str) -> Result<Self, ConfigError> {
        match type_name {
            "staircase" => Ok(Self::Staircase(StaircaseParameters::default())),
            "rectangular" => Ok(Self::Rectangular(RectangularParameters::default())),
            "parallelogram" => Ok(Self::Parallelogram(ParallelogramParameters::default())),
            other => Err(unknown_type("shape", other, SHAPE_TYPES)),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Staircase(_) => "staircase",
            Self::Rectangular(_) => "rectangular",
            Self::Parallelogram(_) => "parallelogram",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_staircase_defaults_valid() {
        let params = StaircaseParameters::try_from(StaircaseDefaults::default()).unwrap();
        assert_eq!(params.num_steps(), 10);
        assert!((params.step_width_cm() - 28.0).abs() < 1e-9);
        assert!((params.step_height_cm() - 28.0).abs() < 1e-9);
    }

    #[test]
    fn test_staircase_rejects_invalid() {
        let zero_steps = StaircaseDefaults {
            num_steps: 0,
            ..Default::default()
        };
        assert!(matches!(
            StaircaseParameters::try_from(zero_steps),
            Err(ConfigError::OutOfRange { field: "num_steps", .. })
        ));

        let too_many = StaircaseDefaults {
            num_steps: 51,
            ..Default::default()
        };
        assert!(StaircaseParameters::try_from(too_many).is_err());

        let negative = StaircaseDefaults {
            stair_width_cm: -1.0,
            ..Default::default()
        };
        assert!(matches!(
            StaircaseParameters::try_from(negative),
            Err(ConfigError::NotPositive { field: "stair_width_cm", .. })
        ));
    }

    #[test]
    fn test_single_step_is_valid() {
        let one = StaircaseDefaults {
            num_steps: 1,
            ..Default::default()
        };
        assert!(StaircaseParameters::try_from(one).is_ok());
    }

    #[test]
    fn test_shape_parameters_tagged_serde() {
        let json = r#"{"type":"rectangular","width_cm":120.0}"#;
        let parsed: ShapeParameters = serde_json::from_str(json).unwrap();
        match &parsed {
            ShapeParameters::Rectangular(p) => {
                assert!((p.width_cm() - 120.0).abs() < 1e-9);
                assert!((p.height_cm() - 100.0).abs() < 1e-9);
            }
            other => panic!("unexpected shape {other:?}"),
        }

        let bad = r#"{"type":"parallelogram","slope_width_cm":0.0}"#;
        assert!(serde_json::from_str::<ShapeParameters>(bad).is_err());
    }

    #[test]
    fn test_defaults_for_registry() {
        for name in SHAPE_TYPES {
            assert_eq!(ShapeParameters::defaults_for(name).unwrap().type_name(), *name);
        }
        assert!(matches!(
            ShapeParameters::defaults_for("circle"),
            Err(ConfigError::UnknownType { .. })
        ));
    }
}
