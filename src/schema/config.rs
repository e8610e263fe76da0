//! Project configuration and parameter validation errors.

use serde::{Deserialize, Serialize};

use super::{GeneratorParameters, ShapeParameters};

/// A complete railing project: which frame to build and how to fill it.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProjectConfig {
    /// Frame shape and its parameters.
    #[serde(default)]
    pub shape: ShapeParameters,
    /// Infill generator and its parameters (including its evaluator).
    #[serde(default)]
    pub generator: GeneratorParameters,
}

/// Configuration validation errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("{field} must be positive, got {value}")]
    NotPositive { field: &'static str, value: f64 },
    #[error("{field} must be within [{min}, {max}], got {value}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("{min_field} ({min}) must be below {max_field} ({max})")]
    InvertedRange {
        min_field: &'static str,
        max_field: &'static str,
        min: f64,
        max: f64,
    },
    #[error("Unknown {kind} type '{name}'. Available types: {available}")]
    UnknownType {
        kind: &'static str,
        name: String,
        available: String,
    },
}

/// Value must be finite and strictly positive.
pub(crate) fn check_positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { field, value })
    }
}

/// Value must be finite and within `[min, max]`.
pub(crate) fn check_range(
    field: &'static str,
    value: f64,
    min: f64,
    max: f64,
) -> Result<(), ConfigError> {
    if value.is_finite() && (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value,
            min,
            max,
        })
    }
}

/// Integer count within `[min, max]`.
pub(crate) fn check_count(
    field: &'static str,
    value: usize,
    min: usize,
    max: usize,
) -> Result<(), ConfigError> {
    check_range(field, value as f64, min as f64, max as f64)
}

/// `min` must not exceed `max` (or must be strictly below it).
pub(crate) fn check_order(
    min_field: &'static str,
    min: f64,
    max_field: &'static str,
    max: f64,
    strict: bool,
) -> Result<(), ConfigError> {
    let ordered = if strict { min < max } else { min <= max };
    if ordered {
        Ok(())
    } else {
        Err(ConfigError::InvertedRange {
            min_field,
            max_field,
            min,
            max,
        })
    }
}

pub(crate) fn unknown_type(kind: &'static str, name: &str, available: &[&str]) -> ConfigError {
    ConfigError::UnknownType {
        kind,
        name: name.to_string(),
        available: available.join(", "),
    }
}
