//! Gold set loading.

use std::fs;
use std::path::Path;

use lectern_types::GoldQuery;
use tracing::{info, warn};

use crate::error::{GoldSetError, GoldSetResult};

/// Below this many queries the MRR figure is not statistically meaningful.
/// A documented precondition, surfaced as a warning rather than enforced.
pub const RECOMMENDED_MIN_QUERIES: usize = 30;

/// The fixed, hand-labeled query set used as ground truth.
///
/// Loaded once at startup and immutable for the process lifetime. A load
/// failure is one of the few fatal conditions in the engine.
#[derive(Clone, Debug)]
pub struct GoldSet {
    queries: Vec<GoldQuery>,
}

impl GoldSet {
    /// Load a gold set from a JSON array of [`GoldQuery`] entries.
    pub fn load(path: impl AsRef<Path>) -> GoldSetResult<Self> {
        let path = path.as_ref();
        let raw = fs::read(path).map_err(|source| GoldSetError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let queries: Vec<GoldQuery> =
            serde_json::from_slice(&raw).map_err(|source| GoldSetError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        info!(path = %path.display(), queries = queries.len(), "gold set loaded");
        Ok(Self::from_queries(queries))
    }

    /// Build a gold set from in-memory entries.
    pub fn from_queries(queries: Vec<GoldQuery>) -> Self {
        if queries.len() < RECOMMENDED_MIN_QUERIES {
            warn!(
                queries = queries.len(),
                recommended = RECOMMENDED_MIN_QUERIES,
                "gold set is small; MRR will not be statistically meaningful"
            );
        }
        Self { queries }
    }

    /// Queries in their labeled order.
    pub fn queries(&self) -> &[GoldQuery] {
        &self.queries
    }

    pub fn len(&self) -> usize {
        self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }
}
