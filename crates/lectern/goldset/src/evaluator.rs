//! Batch evaluation of ranking quality against the gold set.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use lectern_types::{EvaluationResult, QueryOutcome, SearchType};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::capability::SearchCapability;
use crate::error::{GoldSetError, GoldSetResult};
use crate::gold::GoldSet;

/// Default bound on a single capability call during evaluation.
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Runs the gold set against the search capability and computes MRR and
/// coverage.
///
/// One bad query never aborts the batch: capability errors and timeouts are
/// recorded per query as `found = false` with an error message, and the run
/// continues. Given a deterministic capability, repeated runs with the same
/// `(search_type, k)` yield identical MRR.
pub struct GoldSetEvaluator {
    gold: GoldSet,
    search: Arc<dyn SearchCapability>,
    query_timeout: Duration,
}

impl GoldSetEvaluator {
    pub fn new(gold: GoldSet, search: Arc<dyn SearchCapability>) -> Self {
        Self::with_query_timeout(gold, search, DEFAULT_QUERY_TIMEOUT)
    }

    pub fn with_query_timeout(
        gold: GoldSet,
        search: Arc<dyn SearchCapability>,
        query_timeout: Duration,
    ) -> Self {
        Self {
            gold,
            search,
            query_timeout,
        }
    }

    /// Number of queries in the configured gold set.
    pub fn gold_set_size(&self) -> usize {
        self.gold.len()
    }

    /// Evaluate the whole gold set with the given search mode and depth.
    pub async fn run(&self, search_type: SearchType, k: usize) -> GoldSetResult<EvaluationResult> {
        if k == 0 {
            return Err(GoldSetError::InvalidK(k));
        }

        let started = Instant::now();
        let mut per_query = HashMap::with_capacity(self.gold.len());
        let mut reciprocal_sum = 0.0;
        let mut found_queries = 0;

        for query in self.gold.queries() {
            let outcome = self.evaluate_query(query, search_type, k).await;
            if outcome.found {
                found_queries += 1;
            }
            reciprocal_sum += outcome.reciprocal_rank;
            per_query.insert(query.query_text.clone(), outcome);
        }

        let total_queries = self.gold.len();
        let mrr = if total_queries > 0 {
            reciprocal_sum / total_queries as f64
        } else {
            0.0
        };
        let coverage = if total_queries > 0 {
            found_queries as f64 / total_queries as f64
        } else {
            0.0
        };
        let evaluation_time_ms = started.elapsed().as_secs_f64() * 1000.0;

        info!(
            %search_type,
            k,
            mrr,
            coverage,
            total_queries,
            found_queries,
            evaluation_time_ms,
            "gold-set evaluation complete"
        );

        Ok(EvaluationResult {
            run_id: uuid::Uuid::new_v4().to_string(),
            search_type,
            k,
            per_query,
            mrr,
            coverage,
            total_queries,
            found_queries,
            evaluation_time_ms,
            evaluated_at: Utc::now(),
        })
    }

    async fn evaluate_query(
        &self,
        query: &lectern_types::GoldQuery,
        search_type: SearchType,
        k: usize,
    ) -> QueryOutcome {
        let query_started = Instant::now();

        let hits = match timeout(
            self.query_timeout,
            self.search.search(&query.query_text, search_type, k),
        )
        .await
        {
            Err(_) => {
                warn!(
                    query = %query.query_text,
                    timeout_ms = self.query_timeout.as_millis() as u64,
                    "gold query timed out"
                );
                return QueryOutcome {
                    found: false,
                    rank: None,
                    reciprocal_rank: 0.0,
                    top_results: Vec::new(),
                    latency_ms: query_started.elapsed().as_secs_f64() * 1000.0,
                    error: Some(format!(
                        "search timed out after {}ms",
                        self.query_timeout.as_millis()
                    )),
                };
            }
            Ok(Err(err)) => {
                warn!(query = %query.query_text, error = %err, "gold query failed");
                return QueryOutcome {
                    found: false,
                    rank: None,
                    reciprocal_rank: 0.0,
                    top_results: Vec::new(),
                    latency_ms: query_started.elapsed().as_secs_f64() * 1000.0,
                    error: Some(err.to_string()),
                };
            }
            Ok(Ok(hits)) => hits,
        };

        // Rank is the 1-based position in returned order, bounded by k.
        let rank = hits
            .iter()
            .take(k)
            .position(|hit| hit.id == query.expected_target_id)
            .map(|index| index + 1);
        let reciprocal_rank = rank.map(|r| 1.0 / r as f64).unwrap_or(0.0);

        debug!(query = %query.query_text, ?rank, "gold query evaluated");

        QueryOutcome {
            found: rank.is_some(),
            rank,
            reciprocal_rank,
            top_results: hits.iter().take(k).map(|hit| hit.id.clone()).collect(),
            latency_ms: query_started.elapsed().as_secs_f64() * 1000.0,
            error: None,
        }
    }
}
