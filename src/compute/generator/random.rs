//! Anchor-pair random generator.

use std::time::Instant;

use log::{debug, info};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::compute::anchors::boundary_anchors;
use crate::compute::railing::{RailingFrame, RailingInfill};
use crate::schema::{
    AnchorPoint, EvaluationResult, GenerationProgress, GenerationStatistics, RandomParameters,
    RejectionReasons, Rod, StopReason,
};

use super::{
    GenerationControl, GenerationError, GenerationOutcome, InfillGenerator, RodLimits,
    layer_targets, next_generation_id,
};

const ANCHORS_PER_ROD: usize = 5;
const MIN_ANCHORS: usize = 20;
const PAIR_ATTEMPTS_PER_ROD: usize = 100;
const MAX_CONSECUTIVE_FAILURES: usize = 50;

/// Places rods between random pairs of anchors spread around the boundary.
///
/// Each iteration builds a fresh arrangement; the one with the most rods is
/// kept and the run stops as soon as one is complete.
#[derive(Debug, Clone)]
pub struct RandomGenerator {
    params: RandomParameters,
}

struct Arrangement {
    rods: Vec<Rod>,
    anchors: Vec<AnchorPoint>,
}

impl RandomGenerator {
    pub fn new(params: RandomParameters) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &RandomParameters {
        &self.params
    }

    /// Layer furthest below its quota, preferring lower layers on ties.
    fn select_layer(counts: &[usize], targets: &[usize]) -> usize {
        let mut chosen = 0;
        for layer in 1..counts.len() {
            if counts[layer] < targets[layer]
                && (counts[chosen] >= targets[chosen] || counts[layer] < counts[chosen])
            {
                chosen = layer;
            }
        }
        chosen
    }

    fn arrangement(
        &self,
        frame: &RailingFrame,
        rng: &mut StdRng,
        stats: &mut GenerationStatistics,
    ) -> Arrangement {
        let p = self.params.values();
        let anchor_count = (p.num_rods * ANCHORS_PER_ROD).max(MIN_ANCHORS);
        let mut anchors = boundary_anchors(frame, anchor_count, p.min_anchor_distance_cm, rng);
        anchors.shuffle(rng);

        let limits = RodLimits {
            min_length_cm: p.min_rod_length_cm,
            max_length_cm: p.max_rod_length_cm,
            max_angle_deg: p.max_angle_deviation_deg,
        };
        let targets = layer_targets(p.num_rods, p.num_layers);
        let mut by_layer: Vec<Vec<Rod>> = vec![Vec::new(); targets.len()];
        let mut rods: Vec<Rod> = Vec::with_capacity(p.num_rods);
        let mut consecutive_failures = 0;

        for _ in 0..p.num_rods {
            let counts: Vec<usize> = by_layer.iter().map(Vec::len).collect();
            let layer_index = Self::select_layer(&counts, &targets);
            let layer = layer_index as u32 + 1;

            let available: Vec<usize> = (0..anchors.len()).filter(|&i| !anchors[i].used).collect();
            if available.len() < 2 {
                stats.no_anchors_left += 1;
                break;
            }

            let pairs = available.len() * (available.len() - 1) / 2;
            let mut placed = false;
            for _ in 0..PAIR_ATTEMPTS_PER_ROD.min(pairs) {
                if consecutive_failures >= MAX_CONSECUTIVE_FAILURES {
                    break;
                }
                consecutive_failures += 1;

                let picked: Vec<usize> = available.choose_multiple(rng, 2).copied().collect();
                let (a, b) = (picked[0], picked[1]);
                let Ok(rod) = Rod::new(
                    anchors[a].position,
                    anchors[b].position,
                    layer,
                    p.infill_weight_per_meter_kg_m,
                ) else {
                    stats.too_short += 1;
                    continue;
                };

                if limits.accepts(&rod, frame, &by_layer[layer_index], stats) {
                    for i in [a, b] {
                        anchors[i].used = true;
                        anchors[i].layer = Some(layer);
                    }
                    by_layer[layer_index].push(rod.clone());
                    rods.push(rod);
                    consecutive_failures = 0;
                    placed = true;
                    break;
                }
            }
            if !placed {
                break;
            }
        }

        Arrangement { rods, anchors }
    }
}

impl InfillGenerator for RandomGenerator {
    fn type_name(&self) -> &'static str {
        "random"
    }

    fn generate(
        &self,
        frame: &RailingFrame,
        control: &GenerationControl,
    ) -> Result<GenerationOutcome, GenerationError> {
        let p = self.params.values();
        let start = Instant::now();
        let seed = p.random_seed.unwrap_or_else(rand::random);
        let mut rng = StdRng::seed_from_u64(seed);
        let mut stats = GenerationStatistics {
            rods_requested: p.num_rods,
            ..Default::default()
        };
        info!("Random generation started: {} rods, seed {seed}", p.num_rods);

        let mut best: Option<(Arrangement, usize)> = None;
        let mut iteration = 0;
        let stop_reason = loop {
            if control.is_cancelled() {
                break StopReason::Cancelled;
            }
            if start.elapsed().as_secs_f64() > p.max_duration_sec {
                break StopReason::DurationLimit;
            }
            if iteration >= p.max_iterations {
                break StopReason::AttemptsExhausted;
            }
            iteration += 1;

            let arrangement = self.arrangement(frame, &mut rng, &mut stats);
            debug!("Iteration {iteration}: {} rods placed", arrangement.rods.len());
            let improved = best
                .as_ref()
                .is_none_or(|(b, _)| arrangement.rods.len() > b.rods.len());
            if improved {
                best = Some((arrangement, iteration));
            }

            control.report(&GenerationProgress {
                iteration,
                elapsed_sec: start.elapsed().as_secs_f64(),
                best_fitness: None,
            });

            if best
                .as_ref()
                .is_some_and(|(b, _)| b.rods.len() == p.num_rods)
            {
                break StopReason::Completed;
            }
        };

        let (arrangement, found_at) = best.unwrap_or((
            Arrangement {
                rods: Vec::new(),
                anchors: Vec::new(),
            },
            0,
        ));
        let is_complete = arrangement.rods.len() == p.num_rods;
        let duration = start.elapsed().as_secs_f64();

        let mut infill = RailingInfill::new(arrangement.rods)?;
        infill.anchor_points = arrangement.anchors;
        infill.is_complete = is_complete;
        infill.generation_id = next_generation_id();
        infill.iteration_count = found_at;
        infill.duration_sec = duration;

        stats.rods_created = infill.rod_count();
        stats.iterations_used = iteration;
        stats.duration_sec = duration;
        info!("Random generation finished ({stop_reason:?}):\n{stats}");

        let evaluation = EvaluationResult::from_reasons(RejectionReasons {
            incomplete: u32::from(!is_complete),
            ..Default::default()
        });

        Ok(GenerationOutcome {
            infill,
            evaluation,
            fitness: None,
            statistics: stats,
            stop_reason,
        })
    }
}
