use std::path::PathBuf;

use thiserror::Error;

/// Errors from gold-set loading and evaluation.
///
/// Per-query search failures are not represented here: they are captured in
/// the per-query outcome and never abort a batch.
#[derive(Debug, Error)]
pub enum GoldSetError {
    #[error("failed to read gold set {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse gold set {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid k: {0} (must be at least 1)")]
    InvalidK(usize),
}

pub type GoldSetResult<T> = Result<T, GoldSetError>;

/// Error returned by the injected search capability.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search backend error: {0}")]
    Backend(String),
}
