//! Generation progress reports and run statistics.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::evaluator::RejectionReasons;

/// Snapshot emitted while a generator runs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationProgress {
    /// Arrangement attempt (random v1: iteration) counter, 1-based.
    pub iteration: usize,
    pub elapsed_sec: f64,
    /// Best fitness so far, when the generator scores arrangements.
    pub best_fitness: Option<f64>,
}

impl GenerationProgress {
    /// `"prefix | Iteration N | Fitness 0.1234 | Elapsed 1.2s"`.
    pub fn to_status_message(&self, prefix: Option<&str>, fitness: Option<f64>) -> String {
        let mut parts = Vec::with_capacity(4);
        if let Some(prefix) = prefix {
            parts.push(prefix.to_string());
        }
        parts.push(format!("Iteration {}", self.iteration));
        if let Some(fitness) = fitness {
            parts.push(format!("Fitness {fitness:.4}"));
        }
        parts.push(format!("Elapsed {:.1}s", self.elapsed_sec));
        parts.join(" | ")
    }
}

/// Why a generation run stopped.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum StopReason {
    /// Every requested rod was placed (random generator).
    Completed,
    /// An acceptable arrangement reached the minimum fitness.
    TargetReached,
    /// All iterations or evaluation attempts were used.
    AttemptsExhausted,
    /// The time limit elapsed.
    DurationLimit,
    /// The cancellation flag was raised.
    Cancelled,
}

/// Counters collected over a generation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationStatistics {
    pub rods_created: usize,
    pub rods_requested: usize,
    pub too_short: usize,
    pub too_long: usize,
    pub outside_boundary: usize,
    pub angle_too_large: usize,
    pub crosses_same_layer: usize,
    pub no_anchors_left: usize,
    pub evaluator_rejections_total: usize,
    pub evaluator_rejections_incomplete: usize,
    pub evaluator_rejections_hole_too_large: usize,
    pub evaluator_rejections_hole_too_small: usize,
    pub iterations_used: usize,
    pub duration_sec: f64,
}

impl GenerationStatistics {
    pub fn total_failures(&self) -> usize {
        self.too_short
            + self.too_long
            + self.outside_boundary
            + self.angle_too_large
            + self.crosses_same_layer
            + self.no_anchors_left
    }

    /// Placed rods as a percentage of the request, 0 when nothing was requested.
    pub fn success_rate(&self) -> f64 {
        if self.rods_requested == 0 {
            0.0
        } else {
            self.rods_created as f64 / self.rods_requested as f64 * 100.0
        }
    }

    /// Count one rejected arrangement and its reasons.
    pub fn record_rejection(&mut self, reasons: &RejectionReasons) {
        self.evaluator_rejections_total += 1;
        self.evaluator_rejections_incomplete += reasons.incomplete as usize;
        self.evaluator_rejections_hole_too_large += reasons.hole_too_large as usize;
        self.evaluator_rejections_hole_too_small += reasons.hole_too_small as usize;
    }

    /// Add the rod-placement failure counters of another arrangement.
    /// Iteration counts stay with the caller.
    pub fn merge_failures(&mut self, other: &GenerationStatistics) {
        self.too_short += other.too_short;
        self.too_long += other.too_long;
        self.outside_boundary += other.outside_boundary;
        self.angle_too_large += other.angle_too_large;
        self.crosses_same_layer += other.crosses_same_layer;
        self.no_anchors_left += other.no_anchors_left;
    }
}

impl fmt::Display for GenerationStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Generation Statistics:")?;
        writeln!(
            f,
            "  Rods: {}/{} ({:.1}%)",
            self.rods_created,
            self.rods_requested,
            self.success_rate()
        )?;
        writeln!(f, "  Iterations: {}", self.iterations_used)?;
        writeln!(f, "  Duration: {:.2}s", self.duration_sec)?;
        writeln!(f)?;
        writeln!(f, "Failure Reasons:")?;
        writeln!(f, "  Too short: {}", self.too_short)?;
        writeln!(f, "  Too long: {}", self.too_long)?;
        writeln!(f, "  Outside boundary: {}", self.outside_boundary)?;
        writeln!(f, "  Angle too large: {}", self.angle_too_large)?;
        writeln!(f, "  Crosses same layer: {}", self.crosses_same_layer)?;
        writeln!(f, "  No anchors left: {}", self.no_anchors_left)?;
        writeln!(f, "  Total failures: {}", self.total_failures())?;
        writeln!(f)?;
        writeln!(f, "Evaluator Rejections:")?;
        writeln!(
            f,
            "  Total arrangements rejected: {}",
            self.evaluator_rejections_total
        )?;
        writeln!(f, "  Incomplete: {}", self.evaluator_rejections_incomplete)?;
        writeln!(
            f,
            "  Hole too large: {}",
            self.evaluator_rejections_hole_too_large
        )?;
        write!(
            f,
            "  Hole too small: {}",
            self.evaluator_rejections_hole_too_small
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_message() {
        let progress = GenerationProgress {
            iteration: 3,
            elapsed_sec: 1.25,
            best_fitness: None,
        };
        assert_eq!(
            progress.to_status_message(None, None),
            "Iteration 3 | Elapsed 1.2s"
        );
        assert_eq!(
            progress.to_status_message(Some("Layered"), Some(0.71234)),
            "Layered | Iteration 3 | Fitness 0.7123 | Elapsed 1.2s"
        );
    }

    #[test]
    fn test_success_rate() {
        let mut stats = GenerationStatistics::default();
        assert!(stats.success_rate().abs() < 1e-12);
        stats.rods_requested = 30;
        stats.rods_created = 15;
        assert!((stats.success_rate() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_failures_and_rejections() {
        let mut stats = GenerationStatistics {
            too_short: 1,
            too_long: 2,
            outside_boundary: 3,
            angle_too_large: 4,
            crosses_same_layer: 5,
            no_anchors_left: 6,
            ..Default::default()
        };
        assert_eq!(stats.total_failures(), 21);

        stats.record_rejection(&RejectionReasons {
            incomplete: 1,
            hole_too_large: 2,
            hole_too_small: 0,
        });
        stats.record_rejection(&RejectionReasons {
            hole_too_small: 4,
            ..Default::default()
        });
        assert_eq!(stats.evaluator_rejections_total, 2);
        assert_eq!(stats.evaluator_rejections_incomplete, 1);
        assert_eq!(stats.evaluator_rejections_hole_too_large, 2);
        assert_eq!(stats.evaluator_rejections_hole_too_small, 4);

        stats.iterations_used = 9;
        let other = stats.clone();
        stats.merge_failures(&other);
        assert_eq!(stats.total_failures(), 42);
        assert_eq!(stats.iterations_used, 9);
        assert_eq!(stats.evaluator_rejections_total, 2);
    }

    #[test]
    fn test_display_layout() {
        let stats = GenerationStatistics {
            rods_created: 24,
            rods_requested: 30,
            iterations_used: 512,
            duration_sec: 1.5,
            too_short: 7,
            ..Default::default()
        };
        let text = stats.to_string();
        assert!(text.starts_with("Generation Statistics:\n  Rods: 24/30 (80.0%)\n"));
        assert!(text.contains("  Iterations: 512\n  Duration: 1.50s\n\nFailure Reasons:\n"));
        assert!(text.contains("  Too short: 7\n"));
        assert!(text.contains("  Total failures: 7\n\nEvaluator Rejections:\n"));
        assert!(text.ends_with("  Hole too small: 0"));
    }
}
