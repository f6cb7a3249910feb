//! The injected search capability.

use async_trait::async_trait;
use lectern_types::{SearchHit, SearchType};

use crate::error::SearchError;

/// The external search engine, supplied by the caller.
///
/// The evaluator calls this synchronously per gold query; it is the only
/// outbound dependency of the engine. Each call is bounded by the
/// evaluator's per-query timeout.
#[async_trait]
pub trait SearchCapability: Send + Sync {
    /// Run a query and return results ordered by rank.
    async fn search(
        &self,
        query_text: &str,
        search_type: SearchType,
        k: usize,
    ) -> Result<Vec<SearchHit>, SearchError>;
}
