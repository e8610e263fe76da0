//! Layered generator: per-layer main directions, evaluator-driven attempts.

use std::time::Instant;

use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::compute::anchors::{SegmentSpacing, cut_angles, distribute_to_layers, segment_anchors};
use crate::compute::evaluator::{Assessment, Evaluator, create_evaluator};
use crate::compute::railing::{RailingFrame, RailingInfill};
use crate::schema::{
    AnchorPoint, GenerationProgress, GenerationStatistics, LayeredParameters, Point, Rod,
    StopReason,
};

use super::{
    GenerationControl, GenerationError, GenerationOutcome, InfillGenerator, RodLimits,
    layer_targets, next_generation_id,
};

/// Failed placements in a row before a layer starts over.
const MAX_CONSECUTIVE_FAILURES: usize = 300;

/// Builds each layer from rods running close to that layer's main direction,
/// then scores whole arrangements with the configured evaluator.
///
/// Attempt `i` is seeded with `seed + i`, so results do not depend on how
/// many attempts run in parallel.
pub struct LayeredGenerator {
    params: LayeredParameters,
    evaluator: Box<dyn Evaluator>,
}

impl std::fmt::Debug for LayeredGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayeredGenerator")
            .field("params", &self.params)
            .field("evaluator", &self.evaluator.type_name())
            .finish()
    }
}

/// One generated and scored arrangement.
struct Attempt {
    index: usize,
    infill: RailingInfill,
    statistics: GenerationStatistics,
    assessment: Assessment,
}

impl Attempt {
    /// Acceptable beats rejected; then higher score wins.
    fn beats(&self, other: &Attempt) -> bool {
        let (mine, theirs) = (
            self.assessment.result.is_acceptable,
            other.assessment.result.is_acceptable,
        );
        (mine && !theirs) || (mine == theirs && self.assessment.score > other.assessment.score)
    }
}

impl LayeredGenerator {
    pub fn new(params: LayeredParameters) -> Self {
        let evaluator = create_evaluator(&params.values().evaluator);
        Self { params, evaluator }
    }

    pub fn params(&self) -> &LayeredParameters {
        &self.params
    }

    pub fn evaluator(&self) -> &dyn Evaluator {
        self.evaluator.as_ref()
    }

    /// Unused anchor nearest to where a line through `from` at `angle_deg`
    /// leaves the boundary on the far side.
    fn end_anchor(
        frame: &RailingFrame,
        anchors: &[AnchorPoint],
        candidates: &[usize],
        from: usize,
        angle_deg: f64,
    ) -> Option<usize> {
        let origin = anchors[from].position;
        let bounds = frame.boundary().bounds();
        let reach = 2.0 * bounds.width().max(bounds.height());
        let radians = angle_deg.to_radians();
        let (dx, dy) = (reach * radians.sin(), reach * radians.cos());
        let a = Point::new(origin.x - dx, origin.y - dy);
        let b = Point::new(origin.x + dx, origin.y + dy);

        let far = frame
            .boundary()
            .segment_crossings(a, b)
            .into_iter()
            .filter(|p| p.distance(origin) > 0.0)
            .max_by(|p, q| p.distance(origin).total_cmp(&q.distance(origin)))?;

        candidates
            .iter()
            .copied()
            .filter(|&i| i != from)
            .min_by(|&i, &j| {
                anchors[i]
                    .position
                    .distance(far)
                    .total_cmp(&anchors[j].position.distance(far))
            })
    }

    /// Generate one arrangement. Rods are placed layer by layer; the
    /// iteration budget and duration limit are shared by all layers.
    fn arrangement(
        &self,
        frame: &RailingFrame,
        rng: &mut StdRng,
        control: &GenerationControl,
    ) -> Result<(RailingInfill, GenerationStatistics), GenerationError> {
        let p = self.params.values();
        let start = Instant::now();
        let mut stats = GenerationStatistics::default();
        let limits = RodLimits {
            min_length_cm: p.min_rod_length_cm,
            max_length_cm: p.max_rod_length_cm,
            max_angle_deg: p.max_angle_deviation_deg,
        };
        let spacing = SegmentSpacing {
            vertical_cm: p.min_anchor_distance_vertical_cm,
            other_cm: p.min_anchor_distance_other_cm,
        };

        let mut anchors = segment_anchors(frame, spacing, rng);
        distribute_to_layers(&mut anchors, p.num_layers, rng);
        let directions = self.params.layer_directions_deg();
        let targets = layer_targets(p.num_rods, p.num_layers);

        let mut rods: Vec<Rod> = Vec::with_capacity(p.num_rods);
        let mut iterations = 0;

        for ((layer, &direction), &target) in (1..=p.num_layers).zip(&directions).zip(&targets) {
            if control.is_cancelled()
                || start.elapsed().as_secs_f64() > p.max_duration_sec
                || iterations >= p.max_iterations
            {
                break;
            }

            let members: Vec<usize> = (0..anchors.len())
                .filter(|&i| anchors[i].layer == Some(layer))
                .collect();
            debug!(
                "Layer {layer}: direction {direction:.1}°, {} anchors, {target} rods",
                members.len()
            );

            let mut layer_rods: Vec<Rod> = Vec::with_capacity(target);
            let mut failures = 0;
            while layer_rods.len() < target {
                if control.is_cancelled()
                    || iterations >= p.max_iterations
                    || start.elapsed().as_secs_f64() > p.max_duration_sec
                {
                    break;
                }
                iterations += 1;

                let unused: Vec<usize> = members
                    .iter()
                    .copied()
                    .filter(|&i| !anchors[i].used)
                    .collect();
                if unused.len() < 2 {
                    warn!(
                        "Layer {layer} stopped: only {} unused anchors left",
                        unused.len()
                    );
                    stats.no_anchors_left += 1;
                    break;
                }

                if failures >= MAX_CONSECUTIVE_FAILURES {
                    debug!("Layer {layer}: {failures} consecutive failures, resetting layer");
                    layer_rods.clear();
                    for &i in &members {
                        anchors[i].used = false;
                    }
                    failures = 0;
                    continue;
                }

                let Some(&from) = unused.choose(rng) else {
                    break;
                };
                let deviation = if p.random_angle_deviation_deg > 0.0 {
                    rng.gen_range(-p.random_angle_deviation_deg..=p.random_angle_deviation_deg)
                } else {
                    0.0
                };
                let Some(to) = Self::end_anchor(frame, &anchors, &unused, from, direction + deviation)
                else {
                    failures += 1;
                    continue;
                };

                let Ok(rod) = Rod::new(
                    anchors[from].position,
                    anchors[to].position,
                    layer,
                    p.infill_weight_per_meter_kg_m,
                ) else {
                    stats.too_short += 1;
                    failures += 1;
                    continue;
                };
                let (start_cut, end_cut) = cut_angles(
                    rod.angle_from_vertical_deg(),
                    anchors[from].frame_segment_angle_deg,
                    anchors[to].frame_segment_angle_deg,
                );
                let rod = rod.with_cut_angles(start_cut, end_cut)?;

                if !limits.accepts(&rod, frame, &layer_rods, &mut stats) {
                    failures += 1;
                    continue;
                }

                anchors[from].used = true;
                anchors[to].used = true;
                layer_rods.push(rod);
                failures = 0;
            }

            if layer_rods.len() < target {
                warn!(
                    "Layer {layer} incomplete: {}/{target} rods after {iterations} iterations",
                    layer_rods.len()
                );
            }
            rods.extend(layer_rods);
        }

        let is_complete = rods.len() == p.num_rods;
        let mut infill = RailingInfill::new(rods)?;
        infill.anchor_points = anchors;
        infill.is_complete = is_complete;
        infill.iteration_count = iterations;
        infill.duration_sec = start.elapsed().as_secs_f64();
        stats.iterations_used = iterations;
        Ok((infill, stats))
    }

    fn attempt(
        &self,
        frame: &RailingFrame,
        control: &GenerationControl,
        base_seed: u64,
        index: usize,
    ) -> Result<Attempt, GenerationError> {
        let mut rng = StdRng::seed_from_u64(base_seed.wrapping_add(index as u64));
        let (mut infill, statistics) = self.arrangement(frame, &mut rng, control)?;
        let assessment = self.evaluator.assess(&infill, frame)?;
        infill.record_fitness(assessment.score);
        Ok(Attempt {
            index,
            infill,
            statistics,
            assessment,
        })
    }
}

impl InfillGenerator for LayeredGenerator {
    fn type_name(&self) -> &'static str {
        "random_v2"
    }

    fn generate(
        &self,
        frame: &RailingFrame,
        control: &GenerationControl,
    ) -> Result<GenerationOutcome, GenerationError> {
        let p = self.params.values();
        let start = Instant::now();
        let seed = p.random_seed.unwrap_or_else(rand::random);
        let mut stats = GenerationStatistics {
            rods_requested: p.num_rods,
            ..Default::default()
        };
        info!(
            "Layered generation started: {} rods on {} layers, evaluator {}, seed {seed}",
            p.num_rods,
            p.num_layers,
            self.evaluator.type_name()
        );

        let mut best: Option<Attempt> = None;
        let mut attempts = 0;
        let stop_reason = loop {
            if control.is_cancelled() {
                break StopReason::Cancelled;
            }
            if start.elapsed().as_secs_f64() > p.max_evaluation_duration_sec {
                break StopReason::DurationLimit;
            }
            if attempts >= p.max_evaluation_attempts {
                break StopReason::AttemptsExhausted;
            }

            let batch_end = (attempts + p.parallel_attempts).min(p.max_evaluation_attempts);
            let batch: Vec<Attempt> = (attempts..batch_end)
                .into_par_iter()
                .map(|index| self.attempt(frame, control, seed, index))
                .collect::<Result<_, _>>()?;
            attempts = batch_end;

            let mut target_reached = false;
            for candidate in batch {
                stats.merge_failures(&candidate.statistics);
                let result = candidate.assessment.result;
                if result.is_acceptable {
                    debug!(
                        "Attempt {}: fitness {:.3}",
                        candidate.index + 1,
                        candidate.assessment.score
                    );
                    target_reached |= candidate.assessment.score >= p.min_acceptable_fitness;
                } else {
                    stats.record_rejection(&result.rejection_reasons);
                    info!(
                        "Arrangement rejected by evaluator: {} (attempt {}/{})",
                        result.rejection_reasons,
                        candidate.index + 1,
                        p.max_evaluation_attempts
                    );
                }
                if best.as_ref().is_none_or(|b| candidate.beats(b)) {
                    if result.is_acceptable {
                        info!(
                            "New best fitness: {:.3} (attempt {}/{})",
                            candidate.assessment.score,
                            candidate.index + 1,
                            p.max_evaluation_attempts
                        );
                    }
                    best = Some(candidate);
                }
            }

            control.report(&GenerationProgress {
                iteration: attempts,
                elapsed_sec: start.elapsed().as_secs_f64(),
                best_fitness: best
                    .as_ref()
                    .filter(|b| b.assessment.result.is_acceptable)
                    .map(|b| b.assessment.score),
            });

            if target_reached {
                break StopReason::TargetReached;
            }
        };

        let duration = start.elapsed().as_secs_f64();
        stats.iterations_used = attempts;
        stats.duration_sec = duration;

        let outcome = match best {
            Some(Attempt {
                mut infill,
                assessment,
                ..
            }) => {
                infill.generation_id = next_generation_id();
                infill.duration_sec = duration;
                stats.rods_created = infill.rod_count();
                if assessment.result.is_acceptable {
                    info!(
                        "Generation complete with fitness {:.3} ({stop_reason:?}):\n{stats}",
                        assessment.score
                    );
                } else {
                    warn!(
                        "No acceptable arrangement after {attempts} attempts, returning best rejected one:\n{stats}"
                    );
                }
                GenerationOutcome {
                    infill,
                    evaluation: assessment.result,
                    fitness: Some(assessment.score),
                    statistics: stats,
                    stop_reason,
                }
            }
            None => {
                let mut infill = RailingInfill::new(Vec::new())?;
                infill.is_complete = false;
                infill.generation_id = next_generation_id();
                infill.duration_sec = duration;
                let evaluation = self.evaluator.check_acceptance(&infill, frame)?;
                warn!("Generation stopped ({stop_reason:?}) before any arrangement:\n{stats}");
                GenerationOutcome {
                    infill,
                    evaluation,
                    fitness: None,
                    statistics: stats,
                    stop_reason,
                }
            }
        };
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::{RailingShape, RectangularShape, StaircaseShape};
    use crate::schema::{
        EvaluatorParameters, LayeredDefaults, QualityDefaults, QualityParameters,
        RectangularParameters, StaircaseParameters,
    };
    use proptest::prelude::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn rectangle() -> RailingFrame {
        RectangularShape::new(RectangularParameters::default())
            .generate_frame()
            .unwrap()
    }

    fn staircase() -> RailingFrame {
        StaircaseShape::new(StaircaseParameters::default())
            .generate_frame()
            .unwrap()
    }

    fn params(num_rods: usize, attempts: usize, seed: u64) -> LayeredParameters {
        LayeredParameters::try_from(LayeredDefaults {
            num_rods,
            min_rod_length_cm: 20.0,
            max_rod_length_cm: 300.0,
            max_angle_deviation_deg: 60.0,
            num_layers: 2,
            max_iterations: 500,
            max_evaluation_attempts: attempts,
            min_acceptable_fitness: 1.0,
            random_seed: Some(seed),
            ..Default::default()
        })
        .unwrap()
    }

    /// Every hole in a 200x100 frame is too small against this floor.
    fn strict_quality() -> EvaluatorParameters {
        EvaluatorParameters::Quality(
            QualityParameters::try_from(QualityDefaults {
                min_hole_area_cm2: 50_000.0,
                max_hole_area_cm2: 60_000.0,
                ..Default::default()
            })
            .unwrap(),
        )
    }

    #[test]
    fn test_end_anchor_on_far_side() {
        let frame = rectangle();
        let anchors = vec![
            AnchorPoint::new(Point::new(50.0, 0.0), 0, false),
            AnchorPoint::new(Point::new(52.0, 100.0), 2, false),
            AnchorPoint::new(Point::new(150.0, 100.0), 2, false),
            AnchorPoint::new(Point::new(55.0, 0.0), 0, false),
        ];
        let candidates = [0, 1, 2, 3];
        let to = LayeredGenerator::end_anchor(&frame, &anchors, &candidates, 0, 0.0);
        assert_eq!(to, Some(1));
    }

    #[test]
    fn test_rods_inside_frame_on_infill_layers() {
        let frame = rectangle();
        let generator = LayeredGenerator::new(params(6, 3, 42));
        let outcome = generator.generate(&frame, &GenerationControl::new()).unwrap();

        assert!(outcome.fitness.is_some());
        assert!(outcome.infill.fitness_score().is_some());
        assert!(outcome.infill.rod_count() <= 6);
        for rod in outcome.infill.rods() {
            assert!(rod.layer() == 1 || rod.layer() == 2);
            assert!(frame.covers(rod));
            assert!(rod.start_cut_angle_deg().abs() <= 90.0);
        }
    }

    #[test]
    fn test_passthrough_reaches_target_on_first_batch() {
        let frame = rectangle();
        let outcome = LayeredGenerator::new(params(4, 10, 7))
            .generate(&frame, &GenerationControl::new())
            .unwrap();
        assert_eq!(outcome.stop_reason, StopReason::TargetReached);
        assert_eq!(outcome.statistics.iterations_used, 1);
        assert!(outcome.evaluation.is_acceptable);
        assert!((outcome.fitness.unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_same_seed_same_result_regardless_of_parallelism() {
        let frame = staircase();
        let quality = EvaluatorParameters::Quality(QualityParameters::default());
        let sequential = params(6, 4, 99).with_evaluator(quality.clone());
        let mut parallel_values: LayeredDefaults = sequential.clone().into();
        parallel_values.parallel_attempts = 4;
        let parallel = LayeredParameters::try_from(parallel_values).unwrap();

        let a = LayeredGenerator::new(sequential)
            .generate(&frame, &GenerationControl::new())
            .unwrap();
        let b = LayeredGenerator::new(parallel)
            .generate(&frame, &GenerationControl::new())
            .unwrap();
        assert_eq!(a.infill.rods(), b.infill.rods());
        assert_eq!(a.fitness, b.fitness);
    }

    #[test]
    fn test_rejections_are_counted() {
        let frame = rectangle();
        let generator = LayeredGenerator::new(params(4, 3, 5).with_evaluator(strict_quality()));
        let outcome = generator.generate(&frame, &GenerationControl::new()).unwrap();

        assert_eq!(outcome.stop_reason, StopReason::AttemptsExhausted);
        assert!(!outcome.evaluation.is_acceptable);
        assert_eq!(outcome.statistics.evaluator_rejections_total, 3);
        assert!(outcome.statistics.evaluator_rejections_hole_too_small >= 3);
        assert_eq!(outcome.statistics.iterations_used, 3);
    }

    #[test]
    fn test_cancel_from_progress_callback() {
        let frame = rectangle();
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let control = GenerationControl::new();
        let handle = control.cancel_handle();
        let control = control.with_progress(move |_| {
            seen.fetch_add(1, Ordering::Relaxed);
            handle.store(true, Ordering::Relaxed);
        });

        let outcome = LayeredGenerator::new(params(4, 10, 3).with_evaluator(strict_quality()))
            .generate(&frame, &control)
            .unwrap();

        assert_eq!(outcome.stop_reason, StopReason::Cancelled);
        assert_eq!(calls.load(Ordering::Relaxed), 1);
        assert_eq!(outcome.statistics.iterations_used, 1);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(8))]

        #[test]
        fn prop_staircase_rods_contained(seed in 0u64..1000) {
            let frame = staircase();
            let outcome = LayeredGenerator::new(params(6, 2, seed))
                .generate(&frame, &GenerationControl::new())
                .unwrap();
            for rod in outcome.infill.rods() {
                prop_assert!(rod.layer() >= 1);
                prop_assert!(frame.contains(rod.start()));
                prop_assert!(frame.contains(rod.end()));
            }
        }
    }
}
