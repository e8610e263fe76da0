//! Railing Infill CLI - Generate an infill from a JSON project file.

use std::fs;
use std::path::{Path, PathBuf};

use railing_infill::{
    compute::{GenerationControl, create_generator, create_shape},
    schema::ProjectConfig,
};

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <project.json> [output.json]", args[0]);
        eprintln!();
        eprintln!("Generate a railing frame and its infill from a JSON project file.");
        eprintln!();
        eprintln!("Arguments:");
        eprintln!("  project.json  Shape and generator parameters");
        eprintln!("  output.json   Optional file receiving the generated infill");
        eprintln!();
        eprintln!("Example project is generated with --example flag.");
        std::process::exit(1);
    }

    if args[1] == "--example" {
        print_example_project();
        return;
    }

    let project_path = PathBuf::from(&args[1]);
    let project = load_project(&project_path).unwrap_or_else(|e| {
        eprintln!("{}", e);
        std::process::exit(1);
    });

    let frame = create_shape(&project.shape)
        .generate_frame()
        .unwrap_or_else(|e| {
            eprintln!("Error building frame: {}", e);
            std::process::exit(1);
        });
    let generator = create_generator(&project.generator);

    println!("Railing Infill");
    println!("==============");
    println!("Shape: {}", project.shape.type_name());
    println!(
        "Frame: {} rods, {:.1} cm, {:.2} kg",
        frame.rod_count(),
        frame.total_length_cm(),
        frame.total_weight_kg()
    );
    println!("Boundary area: {:.1} cm²", frame.boundary().area());
    println!("Generator: {}", generator.type_name());
    println!();

    println!("Generating...");
    let control = GenerationControl::new().with_progress(|progress| {
        println!("  {}", progress.to_status_message(None, progress.best_fitness));
    });
    let outcome = generator.generate(&frame, &control).unwrap_or_else(|e| {
        eprintln!("Generation failed: {}", e);
        std::process::exit(1);
    });

    let infill = &outcome.infill;
    println!();
    println!("Stopped: {:?}", outcome.stop_reason);
    println!("{}", outcome.statistics);
    println!();
    println!("Result:");
    println!(
        "  Infill: {} rods, {:.1} cm, {:.2} kg",
        infill.rod_count(),
        infill.total_length_cm(),
        infill.total_weight_kg()
    );
    println!("  Complete: {}", infill.is_complete);
    if let Some(fitness) = outcome.fitness {
        println!("  Fitness: {:.3}", fitness);
    }
    println!(
        "  Acceptable: {} (rejections: {})",
        outcome.evaluation.is_acceptable, outcome.evaluation.rejection_reasons
    );

    if let Some(output) = args.get(2) {
        let json = serde_json::to_string_pretty(infill).unwrap_or_else(|e| {
            eprintln!("Error serializing infill: {}", e);
            std::process::exit(1);
        });
        fs::write(output, json).unwrap_or_else(|e| {
            eprintln!("Error writing {}: {}", output, e);
            std::process::exit(1);
        });
        println!("  Written to {}", output);
    }
}

/// Read and parse a project file. Parameter validation happens during
/// deserialization.
fn load_project(path: &Path) -> Result<ProjectConfig, String> {
    let text = fs::read_to_string(path)
        .map_err(|e| format!("Error reading project file {}: {}", path.display(), e))?;
    serde_json::from_str(&text).map_err(|e| format!("Error parsing project: {}", e))
}

fn print_example_project() {
    let project = ProjectConfig::default();
    match serde_json::to_string_pretty(&project) {
        Ok(json) => {
            println!("Example project (project.json):");
            println!("{}", json);
        }
        Err(e) => {
            eprintln!("Error serializing example: {}", e);
            std::process::exit(1);
        }
    }
}
