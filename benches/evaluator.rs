//! Benchmarks for infill evaluation and generation.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use railing_infill::{
    compute::{
        Evaluator, GenerationControl, InfillGenerator, LayeredGenerator, PlanarArrangement,
        QualityEvaluator, RailingShape, StaircaseShape,
    },
    schema::{
        EvaluatorParameters, LayeredDefaults, LayeredParameters, QualityParameters,
        StaircaseParameters,
    },
};

fn layered(num_rods: usize, parallel_attempts: usize) -> LayeredParameters {
    LayeredParameters::try_from(LayeredDefaults {
        num_rods,
        max_evaluation_attempts: 4,
        parallel_attempts,
        min_acceptable_fitness: 1.0,
        evaluator: EvaluatorParameters::Quality(QualityParameters::default()),
        random_seed: Some(42),
        ..Default::default()
    })
    .unwrap()
}

fn bench_quality_evaluation(c: &mut Criterion) {
    let mut group = c.benchmark_group("quality_evaluation");
    let frame = StaircaseShape::new(StaircaseParameters::default())
        .generate_frame()
        .unwrap();

    for num_rods in [10, 30, 60] {
        let outcome = LayeredGenerator::new(layered(num_rods, 1))
            .generate(&frame, &GenerationControl::new())
            .unwrap();
        let infill = outcome.infill;
        let evaluator = QualityEvaluator::default();

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{} rods", infill.rod_count())),
            &infill,
            |b, infill| {
                b.iter(|| evaluator.evaluate(black_box(infill), black_box(&frame)));
            },
        );
    }

    group.finish();
}

fn bench_planar_arrangement(c: &mut Criterion) {
    let frame = StaircaseShape::new(StaircaseParameters::default())
        .generate_frame()
        .unwrap();
    let outcome = LayeredGenerator::new(layered(30, 1))
        .generate(&frame, &GenerationControl::new())
        .unwrap();

    c.bench_function("planar_arrangement_30_rods", |b| {
        b.iter(|| {
            PlanarArrangement::build(
                black_box(frame.rods())
                    .iter()
                    .chain(black_box(outcome.infill.rods())),
            )
        });
    });
}

fn bench_layered_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("layered_generation");
    group.sample_size(10);
    let frame = StaircaseShape::new(StaircaseParameters::default())
        .generate_frame()
        .unwrap();

    for parallel in [1, 2, 4] {
        let generator = LayeredGenerator::new(layered(30, parallel));
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{} parallel", parallel)),
            &parallel,
            |b, _| {
                b.iter(|| generator.generate(black_box(&frame), &GenerationControl::new()));
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_quality_evaluation,
    bench_planar_arrangement,
    bench_layered_generation
);
criterion_main!(benches);
