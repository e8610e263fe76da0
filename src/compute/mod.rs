//! Compute module - frame generation, infill generation and scoring.

mod anchors;
mod edit;
mod incircle;
mod planar;
mod railing;
mod shape;

pub mod evaluator;
pub mod generator;

pub use anchors::*;
pub use edit::*;
pub use evaluator::*;
pub use generator::*;
pub use incircle::*;
pub use planar::*;
pub use railing::*;
pub use shape::*;
