//! Scoring and acceptance of infill arrangements.

mod passthrough;
mod quality;

pub use passthrough::*;
pub use quality::*;

use crate::schema::{EvaluationResult, EvaluatorParameters};

use super::railing::{RailingFrame, RailingInfill};

/// Call-time precondition failures.
///
/// A low score or a rejected arrangement is an [`EvaluationResult`], never
/// one of these.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvaluationError {
    #[error("Infill rod {index} has an endpoint outside the frame boundary")]
    RodOutsideBoundary { index: usize },
}

/// Score and acceptance computed together.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Assessment {
    pub score: f64,
    pub result: EvaluationResult,
}

/// Scores arrangements and decides whether they are acceptable.
///
/// Implementations are pure: the same frame and infill always give the same
/// answer, so independent candidates can be scored from several threads.
pub trait Evaluator: Send + Sync {
    /// Registered discriminator of this evaluator.
    fn type_name(&self) -> &'static str;

    /// Fitness score, higher is better.
    fn evaluate(&self, infill: &RailingInfill, frame: &RailingFrame)
    -> Result<f64, EvaluationError>;

    /// Hard-constraint check with categorized rejection reasons.
    fn check_acceptance(
        &self,
        infill: &RailingInfill,
        frame: &RailingFrame,
    ) -> Result<EvaluationResult, EvaluationError>;

    fn is_acceptable(
        &self,
        infill: &RailingInfill,
        frame: &RailingFrame,
    ) -> Result<bool, EvaluationError> {
        Ok(self.check_acceptance(infill, frame)?.is_acceptable)
    }

    /// Score and acceptance in one call.
    fn assess(
        &self,
        infill: &RailingInfill,
        frame: &RailingFrame,
    ) -> Result<Assessment, EvaluationError> {
        Ok(Assessment {
            score: self.evaluate(infill, frame)?,
            result: self.check_acceptance(infill, frame)?,
        })
    }
}

/// Every infill rod endpoint must lie on or within the frame boundary.
///
/// Rod layers and frame structure are already enforced when the infill and
/// frame are built.
pub fn check_preconditions(
    infill: &RailingInfill,
    frame: &RailingFrame,
) -> Result<(), EvaluationError> {
    match infill
        .rods()
        .iter()
        .position(|rod| !frame.contains(rod.start()) || !frame.contains(rod.end()))
    {
        Some(index) => Err(EvaluationError::RodOutsideBoundary { index }),
        None => Ok(()),
    }
}

/// Evaluator for a parameter record.
pub fn create_evaluator(params: &EvaluatorParameters) -> Box<dyn Evaluator> {
    match params {
        EvaluatorParameters::Passthrough => Box::new(PassThroughEvaluator),
        EvaluatorParameters::Quality(p) => Box::new(QualityEvaluator::new(p.clone())),
    }
}

pub fn available_evaluator_types() -> &'static [&'static str] {
    crate::schema::EVALUATOR_TYPES
}
