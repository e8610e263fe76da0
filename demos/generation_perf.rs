//! Quick generation performance test

use railing_infill::{
    compute::{GenerationControl, create_generator, create_shape},
    schema::{
        EvaluatorParameters, GeneratorParameters, LayeredDefaults, LayeredParameters,
        QualityParameters, RandomDefaults, RandomParameters, ShapeParameters,
    },
};
use std::time::Instant;

fn main() {
    println!("=== Generation Performance Test ===\n");

    let frame = create_shape(&ShapeParameters::default())
        .generate_frame()
        .unwrap();

    // Test both generators at increasing rod counts
    for num_rods in [10, 30, 60] {
        println!("Rods requested: {}", num_rods);

        let generators = [
            GeneratorParameters::Random(
                RandomParameters::try_from(RandomDefaults {
                    num_rods,
                    max_iterations: 50,
                    random_seed: Some(42),
                    ..Default::default()
                })
                .unwrap(),
            ),
            GeneratorParameters::Layered(
                LayeredParameters::try_from(LayeredDefaults {
                    num_rods,
                    random_seed: Some(42),
                    evaluator: EvaluatorParameters::Quality(QualityParameters::default()),
                    ..Default::default()
                })
                .unwrap(),
            ),
        ];

        for params in &generators {
            let generator = create_generator(params);
            let start = Instant::now();
            let outcome = generator.generate(&frame, &GenerationControl::new()).unwrap();
            let elapsed = start.elapsed();

            println!("  {}:", generator.type_name());
            println!(
                "    Rods placed:    {}/{}",
                outcome.infill.rod_count(),
                num_rods
            );
            println!("    Iterations:     {}", outcome.statistics.iterations_used);
            println!("    Failures:       {}", outcome.statistics.total_failures());
            println!("    Elapsed:        {:.2}s", elapsed.as_secs_f64());
            if let Some(fitness) = outcome.fitness {
                println!("    Fitness:        {:.4}", fitness);
            }
        }
        println!();
    }

    println!("=== Scalability Test (layered, 30 rods, 16 attempts) ===\n");

    // Test different batch sizes
    for parallel_attempts in [1, 2, 4, 8] {
        let params = LayeredParameters::try_from(LayeredDefaults {
            num_rods: 30,
            max_evaluation_attempts: 16,
            min_acceptable_fitness: 1.0,
            parallel_attempts,
            evaluator: EvaluatorParameters::Quality(QualityParameters::default()),
            random_seed: Some(7),
            ..Default::default()
        })
        .unwrap();

        let generator = create_generator(&GeneratorParameters::Layered(params));
        let start = Instant::now();
        let outcome = generator.generate(&frame, &GenerationControl::new()).unwrap();
        let elapsed = start.elapsed();

        println!(
            "  Batch {:>2}: {:.2}s, {:.1} attempts/s, best fitness {:.4}",
            parallel_attempts,
            elapsed.as_secs_f64(),
            outcome.statistics.iterations_used as f64 / elapsed.as_secs_f64(),
            outcome.fitness.unwrap_or_default()
        );
    }
}
