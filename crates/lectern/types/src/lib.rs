//! Lectern Types - shared data model for the telemetry and evaluation engine
//!
//! Payload types exchanged between the sample log, the alert evaluator, the
//! gold-set evaluator, the ablation analyzer, and the surfaces that consume
//! them. All of them serialize to JSON for the dashboard endpoints.

#![deny(unsafe_code)]

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single latency observation recorded by the search-completion path.
///
/// Immutable once recorded. The optional variant tag marks which
/// monitoring-window variant the sample belongs to.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LatencySample {
    /// When the observation was recorded.
    pub recorded_at: DateTime<Utc>,
    /// Observed search latency in milliseconds.
    pub duration_ms: f64,
    /// Monitoring-window variant this sample is tagged with, if any.
    pub variant: Option<String>,
}

impl LatencySample {
    /// Create a sample stamped with the current time.
    pub fn now(duration_ms: f64, variant: Option<String>) -> Self {
        Self {
            recorded_at: Utc::now(),
            duration_ms,
            variant,
        }
    }
}

/// Descriptive statistics over the samples inside a trailing time window.
///
/// Recomputed on every query, never cached across calls. When the window is
/// empty every numeric field is zero and `ready` is false.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WindowStats {
    /// Number of samples inside the window.
    pub count: usize,
    /// Arithmetic mean latency.
    pub mean_ms: f64,
    /// Nearest-rank 50th percentile.
    pub p50_ms: f64,
    /// Nearest-rank 95th percentile.
    pub p95_ms: f64,
    /// Nearest-rank 99th percentile.
    pub p99_ms: f64,
    /// Smallest observed latency.
    pub min_ms: f64,
    /// Largest observed latency.
    pub max_ms: f64,
    /// Width of the trailing window, in minutes.
    pub window_minutes: f64,
    /// Threshold the p95 is checked against.
    pub threshold_ms: f64,
    /// Whether `p95_ms` exceeds `threshold_ms`.
    pub threshold_exceeded: bool,
    /// False when the window held no samples.
    pub ready: bool,
}

impl WindowStats {
    /// Stats for an empty window: all zeros, not ready.
    pub fn empty(window_minutes: f64, threshold_ms: f64) -> Self {
        Self {
            count: 0,
            mean_ms: 0.0,
            p50_ms: 0.0,
            p95_ms: 0.0,
            p99_ms: 0.0,
            min_ms: 0.0,
            max_ms: 0.0,
            window_minutes,
            threshold_ms,
            threshold_exceeded: false,
            ready: false,
        }
    }
}

/// Which metric an alert decision was based on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertMetric {
    /// Nearest-rank 95th percentile (5 or more samples).
    P95,
    /// Window maximum (small-sample fallback, fewer than 5 samples).
    Max,
}

impl fmt::Display for AlertMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertMetric::P95 => write!(f, "p95"),
            AlertMetric::Max => write!(f, "max"),
        }
    }
}

/// Outcome of a threshold check over a trailing window.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AlertState {
    /// Whether the latency target is currently violated.
    pub alert: bool,
    /// Metric the decision used. None when the window was empty.
    pub metric: Option<AlertMetric>,
    /// Value of the decision metric, in milliseconds.
    pub metric_value_ms: f64,
    /// Threshold the metric was compared against.
    pub threshold_ms: f64,
    /// Samples in the evaluated window.
    pub count: usize,
    /// Width of the evaluated window, in minutes.
    pub window_minutes: f64,
    /// Human-readable explanation of the decision.
    pub message: String,
    /// The full statistics the decision was derived from.
    pub stats: WindowStats,
}

/// One bucket of a latency trend, ordered by `bucket_start`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrendBucket {
    /// Start of the bucket interval.
    pub bucket_start: DateTime<Utc>,
    /// Statistics over the samples that fell into the bucket.
    pub stats: WindowStats,
}

/// Search modes the external capability supports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    /// Embedding-based semantic retrieval.
    Semantic,
    /// Keyword/BM25 retrieval.
    Keyword,
}

impl fmt::Display for SearchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchType::Semantic => write!(f, "semantic"),
            SearchType::Keyword => write!(f, "keyword"),
        }
    }
}

/// Error for an unrecognized search type string.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownSearchType(pub String);

impl fmt::Display for UnknownSearchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown search type: {}", self.0)
    }
}

impl std::error::Error for UnknownSearchType {}

impl FromStr for SearchType {
    type Err = UnknownSearchType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "semantic" => Ok(SearchType::Semantic),
            "keyword" => Ok(SearchType::Keyword),
            other => Err(UnknownSearchType(other.to_string())),
        }
    }
}

/// One ranked result returned by the external search capability.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchHit {
    /// Identifier of the result (the unit the gold set labels).
    pub id: String,
    /// 1-based rank as reported by the capability.
    pub rank: usize,
    /// Relevance score.
    pub score: f64,
    /// Short text snippet for display.
    pub snippet: String,
}

/// A hand-labeled query with its expected answer.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GoldQuery {
    /// The query text to submit to the search capability.
    pub query_text: String,
    /// Identifier the capability is expected to return.
    pub expected_target_id: String,
    /// Rank the annotator expected the target at, if recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_rank: Option<usize>,
}

/// Per-query outcome of a gold-set evaluation run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QueryOutcome {
    /// Whether the expected target appeared within the top k.
    pub found: bool,
    /// 1-based rank the target was found at.
    pub rank: Option<usize>,
    /// `1/rank` when found, 0 otherwise.
    pub reciprocal_rank: f64,
    /// Identifiers of the results returned for the query, in order.
    pub top_results: Vec<String>,
    /// Wall-clock latency of the query, in milliseconds.
    pub latency_ms: f64,
    /// Capability error or timeout message, if the query failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Aggregate result of one gold-set evaluation run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// Unique identifier of this run.
    pub run_id: String,
    /// Search mode the run used.
    pub search_type: SearchType,
    /// Result depth the run used.
    pub k: usize,
    /// Outcome per gold query, keyed by query text.
    pub per_query: HashMap<String, QueryOutcome>,
    /// Mean reciprocal rank over all queries, in [0, 1].
    pub mrr: f64,
    /// `found_queries / total_queries`, 0 when the gold set is empty.
    pub coverage: f64,
    /// Number of gold queries evaluated.
    pub total_queries: usize,
    /// Number of queries whose target was found within the top k.
    pub found_queries: usize,
    /// Wall-clock span of the whole batch, in milliseconds.
    pub evaluation_time_ms: f64,
    /// When the run finished.
    pub evaluated_at: DateTime<Utc>,
}

/// A monitoring-window variant under ablation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VariantSpec {
    /// Variant tag, e.g. "30s" or "60s".
    pub name: String,
    /// Trailing window the variant monitors, in minutes.
    pub window_minutes: f64,
}

impl VariantSpec {
    pub fn new(name: impl Into<String>, window_minutes: f64) -> Self {
        Self {
            name: name.into(),
            window_minutes,
        }
    }
}

/// Coarse confidence label derived from sample count.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReliabilityLevel {
    Low,
    Medium,
    High,
}

impl ReliabilityLevel {
    /// Classify a sample count. Fewer than 5 samples is Low (the same floor
    /// the alert evaluator treats as statistically unreliable), fewer than
    /// 30 is Medium, 30 or more is High.
    pub fn from_sample_count(count: usize) -> Self {
        if count < 5 {
            ReliabilityLevel::Low
        } else if count < 30 {
            ReliabilityLevel::Medium
        } else {
            ReliabilityLevel::High
        }
    }
}

impl fmt::Display for ReliabilityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReliabilityLevel::Low => write!(f, "low"),
            ReliabilityLevel::Medium => write!(f, "medium"),
            ReliabilityLevel::High => write!(f, "high"),
        }
    }
}

/// Confidence attached to an ablation recommendation.
///
/// Bounded by the weakest compared variant: the recommendation can never be
/// more confident than its least reliable input.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    Low,
    Medium,
    High,
}

impl From<ReliabilityLevel> for ConfidenceLevel {
    fn from(level: ReliabilityLevel) -> Self {
        match level {
            ReliabilityLevel::Low => ConfidenceLevel::Low,
            ReliabilityLevel::Medium => ConfidenceLevel::Medium,
            ReliabilityLevel::High => ConfidenceLevel::High,
        }
    }
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfidenceLevel::Low => write!(f, "low"),
            ConfidenceLevel::Medium => write!(f, "medium"),
            ConfidenceLevel::High => write!(f, "high"),
        }
    }
}

/// Per-variant section of an ablation report.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VariantReport {
    /// Statistics over the variant's own samples and window.
    pub stats: WindowStats,
    /// Sample standard deviation of the variant's latencies.
    pub stddev_ms: f64,
    /// Latency consistency in [0, 1]; higher is steadier.
    pub stability_score: f64,
    /// How quickly the window reacts to regressions, normalized so the
    /// most responsive compared variant scores 1.
    pub responsiveness_score: f64,
    /// Coarse confidence label from the variant's sample count.
    pub reliability: ReliabilityLevel,
}

/// An observation produced while comparing variants.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Insight {
    /// Pairwise delta between two variants.
    Comparison {
        baseline: String,
        candidate: String,
        p95_difference_ms: f64,
        p95_change_percent: f64,
        stability_difference: f64,
        sample_size_difference: i64,
    },
    /// Call-out of the single most stable variant.
    MostStable {
        variant: String,
        stability_score: f64,
        sample_count: usize,
    },
    /// A variant could not be compared.
    Error { message: String },
}

/// Final verdict of an ablation run.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Recommendation {
    /// A variant was selected.
    Selected {
        recommended: String,
        composite_score: f64,
        reason: String,
        confidence: ConfidenceLevel,
    },
    /// At least one variant had no samples; no numeric recommendation.
    InsufficientData {
        data_needed: String,
        observed_counts: HashMap<String, usize>,
    },
}

/// Full output of a monitoring-window ablation comparison.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AblationReport {
    /// When the comparison ran.
    pub generated_at: DateTime<Utc>,
    /// Per-variant statistics and scores, keyed by variant name.
    pub per_variant: HashMap<String, VariantReport>,
    /// Pairwise deltas and call-outs.
    pub insights: Vec<Insight>,
    /// The verdict.
    pub recommendation: Recommendation,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_window_stats() {
        let stats = WindowStats::empty(10.0, 2000.0);
        assert_eq!(stats.count, 0);
        assert!(!stats.ready);
        assert!(!stats.threshold_exceeded);
        assert_eq!(stats.p95_ms, 0.0);
    }

    #[test]
    fn test_search_type_parsing() {
        assert_eq!("semantic".parse::<SearchType>().unwrap(), SearchType::Semantic);
        assert_eq!("Keyword".parse::<SearchType>().unwrap(), SearchType::Keyword);
        assert!("fuzzy".parse::<SearchType>().is_err());
    }

    #[test]
    fn test_reliability_thresholds() {
        assert_eq!(ReliabilityLevel::from_sample_count(0), ReliabilityLevel::Low);
        assert_eq!(ReliabilityLevel::from_sample_count(4), ReliabilityLevel::Low);
        assert_eq!(ReliabilityLevel::from_sample_count(5), ReliabilityLevel::Medium);
        assert_eq!(ReliabilityLevel::from_sample_count(29), ReliabilityLevel::Medium);
        assert_eq!(ReliabilityLevel::from_sample_count(30), ReliabilityLevel::High);
    }

    #[test]
    fn test_reliability_ordering() {
        assert!(ReliabilityLevel::Low < ReliabilityLevel::Medium);
        assert!(ReliabilityLevel::Medium < ReliabilityLevel::High);
    }
}
