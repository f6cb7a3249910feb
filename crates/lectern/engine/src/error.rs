//! Engine-level errors.

use lectern_goldset::GoldSetError;
use lectern_latency::TelemetryError;
use thiserror::Error;

/// Errors surfaced by the engine facade.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Caller-supplied input failed boundary validation.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A sample or query referenced a variant the engine was not
    /// configured with.
    #[error("unknown monitoring-window variant: {0}")]
    UnknownVariant(String),

    #[error("telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),

    #[error("gold-set error: {0}")]
    GoldSet(#[from] GoldSetError),
}

pub type EngineResult<T> = Result<T, EngineError>;
