//! Weighted multi-criteria quality evaluator.
//!
//! Cells come from the planar arrangement of frame and infill rods. Every
//! sub-score lies in [0, 1]:
//!
//! - hole uniformity and incircle uniformity are `1 - cv` of cell areas and
//!   incircle radii, clamped;
//! - angle distribution is the mean evenness of junctions touching infill;
//! - anchor spacing is `1 - cv` of the gaps between consecutive attachment
//!   points (rod ends included) along frame rods, split into non-vertical
//!   ("horizontal") and vertical frame rods.
//!
//! A criterion without samples scores 1. The fitness is the weighted sum,
//! without normalising the weights.

use serde::Serialize;

use crate::compute::anchors::is_vertical_segment;
use crate::compute::planar::{Cell, PlanarArrangement};
use crate::compute::railing::{RailingFrame, RailingInfill};
use crate::schema::{
    BOUNDARY_TOLERANCE_CM, CriterionScore, EvaluationResult, QualityCriterion, QualityParameters,
    RejectionReasons, project_parameter,
};

use super::{Assessment, EvaluationError, Evaluator, check_preconditions};

/// Area and incircle radius of one cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CellSummary {
    pub area_cm2: f64,
    pub incircle_radius_cm: f64,
}

/// Everything the quality evaluator derives from one arrangement pass.
#[derive(Debug, Clone, Serialize)]
pub struct QualityBreakdown {
    pub criteria: Vec<CriterionScore>,
    pub cells: Vec<CellSummary>,
    pub fitness: f64,
    pub result: EvaluationResult,
}

impl QualityBreakdown {
    pub fn score_of(&self, criterion: QualityCriterion) -> Option<f64> {
        self.criteria
            .iter()
            .find(|c| c.criterion == criterion)
            .map(|c| c.score)
    }
}

/// Scores hole uniformity, incircle uniformity, junction angles and anchor
/// spacing; rejects incomplete infills and cells outside the area bounds.
#[derive(Debug, Clone, Default)]
pub struct QualityEvaluator {
    params: QualityParameters,
}

/// `1 - cv` clamped to [0, 1]; 1 for fewer than two samples or a zero mean.
fn uniformity(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 1.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    if mean <= 0.0 {
        return 1.0;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (1.0 - variance.sqrt() / mean).clamp(0.0, 1.0)
}

impl QualityEvaluator {
    pub fn new(params: QualityParameters) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &QualityParameters {
        &self.params
    }

    /// Sub-scores, cells and acceptance from a single arrangement pass.
    pub fn breakdown(
        &self,
        infill: &RailingInfill,
        frame: &RailingFrame,
    ) -> Result<QualityBreakdown, EvaluationError> {
        check_preconditions(infill, frame)?;

        let arrangement = PlanarArrangement::build(frame.rods().iter().chain(infill.rods()));
        let cells: Vec<CellSummary> = arrangement
            .cells()
            .iter()
            .map(|cell: &Cell| CellSummary {
                area_cm2: cell.area(),
                incircle_radius_cm: cell.incircle_radius(),
            })
            .collect();

        let areas: Vec<f64> = cells.iter().map(|c| c.area_cm2).collect();
        let radii: Vec<f64> = cells.iter().map(|c| c.incircle_radius_cm).collect();
        let (horizontal_gaps, vertical_gaps) = attachment_gaps(infill, frame);

        let weights = self.params.weights();
        let criteria: Vec<CriterionScore> = QualityCriterion::ALL
            .iter()
            .map(|&criterion| {
                let score = match criterion {
                    QualityCriterion::HoleUniformity => uniformity(&areas),
                    QualityCriterion::IncircleUniformity => uniformity(&radii),
                    QualityCriterion::AngleDistribution => angle_distribution(&arrangement),
                    QualityCriterion::AnchorSpacingHorizontal => uniformity(&horizontal_gaps),
                    QualityCriterion::AnchorSpacingVertical => uniformity(&vertical_gaps),
                };
                CriterionScore {
                    criterion,
                    score,
                    weight: weights.weight(criterion),
                }
            })
            .collect();
        let fitness = criteria.iter().map(CriterionScore::weighted_score).sum();

        let mut reasons = RejectionReasons::default();
        if !infill.is_complete {
            reasons.incomplete = 1;
        }
        for cell in &cells {
            if cell.area_cm2 < self.params.min_hole_area_cm2() {
                reasons.hole_too_small += 1;
            } else if cell.area_cm2 > self.params.max_hole_area_cm2() {
                reasons.hole_too_large += 1;
            }
        }

        Ok(QualityBreakdown {
            criteria,
            cells,
            fitness,
            result: EvaluationResult::from_reasons(reasons),
        })
    }
}

/// Mean evenness over junctions that involve an infill rod.
fn angle_distribution(arrangement: &PlanarArrangement) -> f64 {
    let evenness: Vec<f64> = arrangement
        .junctions()
        .iter()
        .filter(|j| j.touches_infill)
        .map(|j| j.evenness())
        .collect();
    if evenness.is_empty() {
        1.0
    } else {
        evenness.iter().sum::<f64>() / evenness.len() as f64
    }
}

/// Gaps between consecutive attachment points along frame rods, split into
/// (non-vertical, vertical) frame rods. Frame rods without attachments are
/// skipped.
fn attachment_gaps(infill: &RailingInfill, frame: &RailingFrame) -> (Vec<f64>, Vec<f64>) {
    let mut horizontal = Vec::new();
    let mut vertical = Vec::new();

    for frame_rod in frame.rods() {
        let length = frame_rod.length_cm();
        let mut stations: Vec<f64> = infill
            .rods()
            .iter()
            .flat_map(|rod| [rod.start(), rod.end()])
            .filter(|p| frame_rod.distance_to(*p) <= BOUNDARY_TOLERANCE_CM)
            .map(|p| project_parameter(p, frame_rod.start(), frame_rod.end()).clamp(0.0, 1.0) * length)
            .collect();
        if stations.is_empty() {
            continue;
        }
        stations.push(0.0);
        stations.push(length);
        stations.sort_by(f64::total_cmp);

        let target = if is_vertical_segment(frame_rod) {
            &mut vertical
        } else {
            &mut horizontal
        };
        target.extend(
            stations
                .windows(2)
                .map(|w| w[1] - w[0])
                .filter(|gap| *gap > BOUNDARY_TOLERANCE_CM),
        );
    }
    (horizontal, vertical)
}

impl Evaluator for QualityEvaluator {
    fn type_name(&self) -> &'static str {
        "quality"
    }

    fn evaluate(
        &self,
        infill: &RailingInfill,
        frame: &RailingFrame,
    ) -> Result<f64, EvaluationError> {
        Ok(self.breakdown(infill, frame)?.fitness)
    }

    fn check_acceptance(
        &self,
        infill: &RailingInfill,
        frame: &RailingFrame,
    ) -> Result<EvaluationResult, EvaluationError> {
        Ok(self.breakdown(infill, frame)?.result)
    }

    fn assess(
        &self,
        infill: &RailingInfill,
        frame: &RailingFrame,
    ) -> Result<Assessment, EvaluationError> {
        let breakdown = self.breakdown(infill, frame)?;
        Ok(Assessment {
            score: breakdown.fitness,
            result: breakdown.result,
        })
    }
}
