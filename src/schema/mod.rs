//! Schema module - Geometry primitives and parameter records for railings.

mod anchor;
mod config;
mod evaluator;
mod generator;
mod geometry;
mod progress;
mod shape;

pub use anchor::*;
pub use config::*;
pub use evaluator::*;
pub use generator::*;
pub use geometry::*;
pub use progress::*;
pub use shape::*;
