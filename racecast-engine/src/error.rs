//! Typed failures surfaced by the prediction core.
use thiserror::Error;

use crate::weights::Factor;

/// Errors raised by qualifying and race prediction calls.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PredictorError {
    #[error("track not found: {key}")]
    TrackNotFound { key: String },
    #[error("driver {code} is not in the registry")]
    UnknownDriver { code: String },
    #[error("driver {code} appears more than once in the grid")]
    DuplicateDriver { code: String },
    #[error("cannot rank an empty grid")]
    EmptyGrid,
    #[error(transparent)]
    InvalidWeight(#[from] WeightError),
}

/// Weight validation failures.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum WeightError {
    #[error("{factor} weight must be a finite number (got {value})")]
    NotFinite { factor: Factor, value: f64 },
    #[error("{factor} weight must be between 0 and 1 (got {value:.3})")]
    OutOfRange { factor: Factor, value: f64 },
}

/// Errors raised while loading the driver or track tables.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("table parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid code {code:?}: expected three ASCII letters")]
    InvalidCode { code: String },
    #[error("{entry}: {field} must be between {min} and {max} (got {value})")]
    FieldOutOfRange {
        entry: String,
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },
    #[error("{entry}: {field} must be a positive finite number (got {value})")]
    NotPositive {
        entry: String,
        field: &'static str,
        value: f64,
    },
    #[error("duplicate track key {key}")]
    DuplicateTrack { key: String },
    #[error("table contains no usable {kind}")]
    Empty { kind: &'static str },
}
