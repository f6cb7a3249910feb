//! Lectern GoldSet - ranking-quality evaluation
//!
//! Runs a fixed, hand-labeled gold set against the injected search
//! capability and computes Mean Reciprocal Rank and coverage. The
//! capability is the engine's only outbound dependency; each call is
//! bounded by a per-query timeout so one unresponsive query cannot stall
//! the batch.

#![deny(unsafe_code)]

pub mod capability;
pub mod error;
pub mod evaluator;
pub mod gold;

pub use capability::SearchCapability;
pub use error::{GoldSetError, GoldSetResult, SearchError};
pub use evaluator::{GoldSetEvaluator, DEFAULT_QUERY_TIMEOUT};
pub use gold::{GoldSet, RECOMMENDED_MIN_QUERIES};
