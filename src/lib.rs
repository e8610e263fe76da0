//! Railing Infill - frame geometry and infill generation for railings.
//!
//! This crate builds railing frames (staircase, rectangular, parallelogram),
//! fills them with layered infill rods, and scores the resulting
//! arrangements by the holes they leave.
//!
//! # Architecture
//!
//! The crate is split into two main modules:
//!
//! - `schema`: Parameter records, geometry values and statistics
//! - `compute`: Frame generation, infill generators, evaluators, editing
//!
//! # Example
//!
//! ```rust,no_run
//! use railing_infill::{
//!     compute::{GenerationControl, create_generator, create_shape},
//!     schema::ProjectConfig,
//! };
//!
//! let config = ProjectConfig::default();
//! let frame = create_shape(&config.shape).generate_frame()?;
//! let outcome = create_generator(&config.generator).generate(&frame, &GenerationControl::new())?;
//!
//! println!("{} rods, {}", outcome.infill.rod_count(), outcome.statistics);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod compute;
pub mod schema;

// Re-export commonly used types
pub use compute::{
    GenerationControl, GenerationOutcome, InfillEditSession, RailingFrame, RailingInfill,
    create_evaluator, create_generator, create_shape,
};
pub use schema::{GeneratorParameters, ProjectConfig, ShapeParameters};
