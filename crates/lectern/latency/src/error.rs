use thiserror::Error;

/// Errors from the latency telemetry subsystem.
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("invalid duration: {0} ms (must be finite and non-negative)")]
    InvalidDuration(f64),

    #[error("invalid window: {0} minutes (must be positive and finite)")]
    InvalidWindow(f64),

    #[error("invalid bucket size: {0} minutes (must be at least 1)")]
    InvalidBucket(u32),

    #[error("lock acquisition failed")]
    LockError,
}

pub type TelemetryResult<T> = Result<T, TelemetryError>;
