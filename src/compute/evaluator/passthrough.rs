//! Pass-through evaluator: fixed score, accepts well-formed input.

use crate::compute::railing::{RailingFrame, RailingInfill};
use crate::schema::EvaluationResult;

use super::{EvaluationError, Evaluator, check_preconditions};

/// Score returned for every arrangement.
pub const NEUTRAL_SCORE: f64 = 1.0;

/// Accepts every well-formed arrangement with a fixed score.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThroughEvaluator;

impl Evaluator for PassThroughEvaluator {
    fn type_name(&self) -> &'static str {
        "passthrough"
    }

    fn evaluate(
        &self,
        infill: &RailingInfill,
        frame: &RailingFrame,
    ) -> Result<f64, EvaluationError> {
        check_preconditions(infill, frame)?;
        Ok(NEUTRAL_SCORE)
    }

    fn check_acceptance(
        &self,
        infill: &RailingInfill,
        frame: &RailingFrame,
    ) -> Result<EvaluationResult, EvaluationError> {
        check_preconditions(infill, frame)?;
        Ok(EvaluationResult::accepted())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::{RailingShape, StaircaseShape};
    use crate::schema::{Point, Rod, StaircaseDefaults, StaircaseParameters};

    fn staircase() -> RailingFrame {
        let params = StaircaseParameters::try_from(StaircaseDefaults {
            post_length_cm: 120.0,
            stair_width_cm: 280.0,
            stair_height_cm: 150.0,
            num_steps: 9,
            ..Default::default()
        })
        .unwrap();
        StaircaseShape::new(params).generate_frame().unwrap()
    }

    #[test]
    fn test_fixed_score_and_acceptance() {
        let frame = staircase();
        let evaluator = PassThroughEvaluator;

        let empty = RailingInfill::default();
        let rods = RailingInfill::new(vec![
            Rod::new(Point::new(50.0, 30.0), Point::new(60.0, 150.0), 1, 0.3).unwrap(),
            Rod::new(Point::new(100.0, 60.0), Point::new(140.0, 180.0), 2, 0.3).unwrap(),
        ])
        .unwrap();
        let mut incomplete = rods.clone();
        incomplete.is_complete = false;

        for infill in [&empty, &rods, &incomplete] {
            assert!((evaluator.evaluate(infill, &frame).unwrap() - NEUTRAL_SCORE).abs() < 1e-12);
            assert!(evaluator.is_acceptable(infill, &frame).unwrap());
            let assessment = evaluator.assess(infill, &frame).unwrap();
            assert_eq!(assessment.result, EvaluationResult::accepted());
        }
    }

    #[test]
    fn test_rejects_rod_outside_frame() {
        let frame = staircase();
        let infill = RailingInfill::new(vec![
            Rod::new(Point::new(-50.0, 30.0), Point::new(60.0, 150.0), 1, 0.3).unwrap(),
        ])
        .unwrap();
        assert!(PassThroughEvaluator.evaluate(&infill, &frame).is_err());
        assert!(PassThroughEvaluator.is_acceptable(&infill, &frame).is_err());
    }
}
