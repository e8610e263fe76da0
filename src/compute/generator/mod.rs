//! Infill generators: rod arrangements inside a railing frame.

mod layered;
mod random;

pub use layered::*;
pub use random::*;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crate::schema::{
    EvaluationResult, GENERATOR_TYPES, GenerationProgress, GenerationStatistics,
    GeneratorParameters, GeometryError, Rod, StopReason,
};

use super::evaluator::EvaluationError;
use super::railing::{RailingFrame, RailingInfill};

/// Progress callback type.
pub type ProgressCallback = Box<dyn Fn(&GenerationProgress) + Send + Sync>;

static NEXT_GENERATION_ID: AtomicU64 = AtomicU64::new(1);

/// Process-wide unique identity for a generation run.
pub fn next_generation_id() -> u64 {
    NEXT_GENERATION_ID.fetch_add(1, Ordering::Relaxed)
}

/// Cancellation flag and progress sink for one generation run.
///
/// Cancellation is advisory: generators check the flag between iterations
/// and return the best arrangement found so far.
#[derive(Default)]
pub struct GenerationControl {
    cancelled: Arc<AtomicBool>,
    progress: Option<ProgressCallback>,
}

impl GenerationControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(&GenerationProgress) + Send + Sync + 'static,
    {
        self.progress = Some(Box::new(callback));
        self
    }

    /// Get a handle that can be used to cancel the run from another thread.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    pub(crate) fn report(&self, progress: &GenerationProgress) {
        if let Some(callback) = &self.progress {
            callback(progress);
        }
    }
}

/// Result of a generation run.
#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    /// Best arrangement found; may be incomplete.
    pub infill: RailingInfill,
    /// Acceptance of `infill` under the generator's evaluator.
    pub evaluation: EvaluationResult,
    /// Fitness of `infill`, when the generator scores arrangements.
    pub fitness: Option<f64>,
    pub statistics: GenerationStatistics,
    pub stop_reason: StopReason,
}

/// Generation failures. Incomplete or rejected arrangements are not errors.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

/// Produces infill arrangements for a frame.
pub trait InfillGenerator: Send + Sync {
    /// Registered discriminator of this generator.
    fn type_name(&self) -> &'static str;

    fn generate(
        &self,
        frame: &RailingFrame,
        control: &GenerationControl,
    ) -> Result<GenerationOutcome, GenerationError>;
}

/// Generator for a parameter record.
pub fn create_generator(params: &GeneratorParameters) -> Box<dyn InfillGenerator> {
    match params {
        GeneratorParameters::Random(p) => Box::new(RandomGenerator::new(p.clone())),
        GeneratorParameters::Layered(p) => Box::new(LayeredGenerator::new(p.clone())),
    }
}

pub fn available_generator_types() -> &'static [&'static str] {
    GENERATOR_TYPES
}

/// Per-rod limits shared by both generators.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RodLimits {
    pub min_length_cm: f64,
    pub max_length_cm: f64,
    pub max_angle_deg: f64,
}

impl RodLimits {
    /// Check a candidate against length, containment, angle and same-layer
    /// crossings, in that order. The first failure is counted in `stats`.
    pub(crate) fn accepts(
        &self,
        rod: &Rod,
        frame: &RailingFrame,
        layer_rods: &[Rod],
        stats: &mut GenerationStatistics,
    ) -> bool {
        let length = rod.length_cm();
        let counter = if length < self.min_length_cm {
            &mut stats.too_short
        } else if length > self.max_length_cm {
            &mut stats.too_long
        } else if !frame.covers(rod) {
            &mut stats.outside_boundary
        } else if rod.angle_from_vertical_deg().abs() > self.max_angle_deg {
            &mut stats.angle_too_large
        } else if layer_rods.iter().any(|other| rod.crosses(other)) {
            &mut stats.crosses_same_layer
        } else {
            return true;
        };
        *counter += 1;
        false
    }
}

/// Rod quotas per layer (index 0 is layer 1): the remainder goes to the
/// lowest layers.
pub(crate) fn layer_targets(num_rods: usize, num_layers: u32) -> Vec<usize> {
    let layers = num_layers.max(1) as usize;
    (0..layers)
        .map(|i| num_rods / layers + usize::from(i < num_rods % layers))
        .collect()
}
