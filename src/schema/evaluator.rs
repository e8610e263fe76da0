//! Evaluator parameters and evaluation outcome types.

use std::fmt;
use std::ops::AddAssign;

use serde::{Deserialize, Serialize};

use super::config::{ConfigError, check_order, check_positive, check_range, unknown_type};

/// Default values for the quality evaluator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityDefaults {
    pub min_hole_area_cm2: f64,
    pub max_hole_area_cm2: f64,
    pub hole_uniformity_weight: f64,
    pub incircle_uniformity_weight: f64,
    pub angle_distribution_weight: f64,
    pub anchor_spacing_horizontal_weight: f64,
    pub anchor_spacing_vertical_weight: f64,
}

impl Default for QualityDefaults {
    fn default() -> Self {
        Self {
            min_hole_area_cm2: 10.0,
            max_hole_area_cm2: 10000.0,
            hole_uniformity_weight: 0.3,
            incircle_uniformity_weight: 0.2,
            angle_distribution_weight: 0.2,
            anchor_spacing_horizontal_weight: 0.15,
            anchor_spacing_vertical_weight: 0.15,
        }
    }
}

/// Validated quality evaluator parameters.
///
/// Each weight is in [0, 1]; their sum is deliberately not constrained.
/// Hole bounds satisfy `0 <= min < max`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "QualityDefaults", into = "QualityDefaults")]
pub struct QualityParameters {
    min_hole_area_cm2: f64,
    max_hole_area_cm2: f64,
    weights: CriterionWeights,
}

/// Weights of the five quality criteria.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CriterionWeights {
    pub hole_uniformity: f64,
    pub incircle_uniformity: f64,
    pub angle_distribution: f64,
    pub anchor_spacing_horizontal: f64,
    pub anchor_spacing_vertical: f64,
}

impl CriterionWeights {
    pub fn weight(&self, criterion: QualityCriterion) -> f64 {
        match criterion {
            QualityCriterion::HoleUniformity => self.hole_uniformity,
            QualityCriterion::IncircleUniformity => self.incircle_uniformity,
            QualityCriterion::AngleDistribution => self.angle_distribution,
            QualityCriterion::AnchorSpacingHorizontal => self.anchor_spacing_horizontal,
            QualityCriterion::AnchorSpacingVertical => self.anchor_spacing_vertical,
        }
    }
}

impl TryFrom<QualityDefaults> for QualityParameters {
    type Error = ConfigError;

    fn try_from(d: QualityDefaults) -> Result<Self, Self::Error> {
        check_range("min_hole_area_cm2", d.min_hole_area_cm2, 0.0, f64::MAX)?;
        check_positive("max_hole_area_cm2", d.max_hole_area_cm2)?;
        check_order(
            "min_hole_area_cm2",
            d.min_hole_area_cm2,
            "max_hole_area_cm2",
            d.max_hole_area_cm2,
            true,
        )?;
        check_range("hole_uniformity_weight", d.hole_uniformity_weight, 0.0, 1.0)?;
        check_range("incircle_uniformity_weight", d.incircle_uniformity_weight, 0.0, 1.0)?;
        check_range("angle_distribution_weight", d.angle_distribution_weight, 0.0, 1.0)?;
        check_range(
            "anchor_spacing_horizontal_weight",
            d.anchor_spacing_horizontal_weight,
            0.0,
            1.0,
        )?;
        check_range(
            "anchor_spacing_vertical_weight",
            d.anchor_spacing_vertical_weight,
            0.0,
            1.0,
        )?;
        Ok(Self::from_checked(d))
    }
}

impl From<QualityParameters> for QualityDefaults {
    fn from(p: QualityParameters) -> Self {
        Self {
            min_hole_area_cm2: p.min_hole_area_cm2,
            max_hole_area_cm2: p.max_hole_area_cm2,
            hole_uniformity_weight: p.weights.hole_uniformity,
            incircle_uniformity_weight: p.weights.incircle_uniformity,
            angle_distribution_weight: p.weights.angle_distribution,
            anchor_spacing_horizontal_weight: p.weights.anchor_spacing_horizontal,
            anchor_spacing_vertical_weight: p.weights.anchor_spacing_vertical,
        }
    }
}

impl Default for QualityParameters {
    fn default() -> Self {
        Self::from_checked(QualityDefaults::default())
    }
}

impl QualityParameters {
    fn from_checked(d: QualityDefaults) -> Self {
        Self {
            min_hole_area_cm2: d.min_hole_area_cm2,
            max_hole_area_cm2: d.max_hole_area_cm2,
            weights: CriterionWeights {
                hole_uniformity: d.hole_uniformity_weight,
                incircle_uniformity: d.incircle_uniformity_weight,
                angle_distribution: d.angle_distribution_weight,
                anchor_spacing_horizontal: d.anchor_spacing_horizontal_weight,
                anchor_spacing_vertical: d.anchor_spacing_vertical_weight,
            },
        }
    }

    pub fn min_hole_area_cm2(&self) -> f64 {
        self.min_hole_area_cm2
    }

    pub fn max_hole_area_cm2(&self) -> f64 {
        self.max_hole_area_cm2
    }

    pub fn weights(&self) -> &CriterionWeights {
        &self.weights
    }
}

/// Evaluator selection by `"type"` discriminator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EvaluatorParameters {
    /// Neutral score, accepts every well-formed arrangement.
    #[default]
    Passthrough,
    /// Weighted multi-criteria scoring with hole-area bounds.
    Quality(QualityParameters),
}

/// Registered evaluator discriminators.
pub const EVALUATOR_TYPES: &[&str] = &["passthrough", "quality"];

impl EvaluatorParameters {
    pub fn defaults_for(type_name: &str) -> Result<Self, ConfigError> {
        match type_name {
            "passthrough" => Ok(Self::Passthrough),
            "quality" => Ok(Self::Quality(QualityParameters::default())),
            other => Err(unknown_type("evaluator", other, EVALUATOR_TYPES)),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Passthrough => "passthrough",
            Self::Quality(_) => "quality",
        }
    }
}

/// The five quality criteria.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityCriterion {
    HoleUniformity,
    IncircleUniformity,
    AngleDistribution,
    AnchorSpacingHorizontal,
    AnchorSpacingVertical,
}

impl QualityCriterion {
    pub const ALL: [QualityCriterion; 5] = [
        QualityCriterion::HoleUniformity,
        QualityCriterion::IncircleUniformity,
        QualityCriterion::AngleDistribution,
        QualityCriterion::AnchorSpacingHorizontal,
        QualityCriterion::AnchorSpacingVertical,
    ];
}

/// Score of one criterion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CriterionScore {
    pub criterion: QualityCriterion,
    /// Sub-score in [0, 1].
    pub score: f64,
    pub weight: f64,
}

impl CriterionScore {
    pub fn weighted_score(&self) -> f64 {
        self.score * self.weight
    }
}

/// Counts of why an arrangement was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RejectionReasons {
    /// 1 when the generator could not place every requested rod.
    pub incomplete: u32,
    /// Cells above the maximum hole area.
    pub hole_too_large: u32,
    /// Cells below the minimum hole area.
    pub hole_too_small: u32,
}

impl RejectionReasons {
    pub fn total(&self) -> u32 {
        self.incomplete + self.hole_too_large + self.hole_too_small
    }

    pub fn has_rejections(&self) -> bool {
        self.total() > 0
    }
}

impl AddAssign for RejectionReasons {
    fn add_assign(&mut self, other: Self) {
        self.incomplete += other.incomplete;
        self.hole_too_large += other.hole_too_large;
        self.hole_too_small += other.hole_too_small;
    }
}

impl fmt::Display for RejectionReasons {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = [
            ("incomplete", self.incomplete),
            ("hole_too_large", self.hole_too_large),
            ("hole_too_small", self.hole_too_small),
        ]
        .into_iter()
        .filter(|(_, count)| *count > 0)
        .map(|(name, count)| format!("{name}({count})"))
        .collect();

        if parts.is_empty() {
            write!(f, "none")
        } else {
            write!(f, "{}", parts.join(", "))
        }
    }
}

/// Outcome of an acceptance check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub is_acceptable: bool,
    pub rejection_reasons: RejectionReasons,
}

impl EvaluationResult {
    pub fn accepted() -> Self {
        Self {
            is_acceptable: true,
            rejection_reasons: RejectionReasons::default(),
        }
    }

    pub fn rejected(reasons: RejectionReasons) -> Self {
        Self {
            is_acceptable: false,
            rejection_reasons: reasons,
        }
    }

    /// Accepted when no reason has a non-zero count.
    pub fn from_reasons(reasons: RejectionReasons) -> Self {
        if reasons.has_rejections() {
            Self::rejected(reasons)
        } else {
            Self::accepted()
        }
    }
}

/// Score change after a manual edit.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FitnessUpdate {
    pub old_score: Option<f64>,
    pub new_score: Option<f64>,
    pub is_acceptable: Option<bool>,
}

impl FitnessUpdate {
    /// `new - old`, when both scores exist.
    pub fn fitness_change(&self) -> Option<f64> {
        Some(self.new_score? - self.old_score?)
    }

    /// Relative change in percent, `None` when the old score is missing or zero.
    pub fn fitness_change_percent(&self) -> Option<f64> {
        let old = self.old_score?;
        if old == 0.0 {
            return None;
        }
        Some((self.new_score? - old) / old * 100.0)
    }
}
