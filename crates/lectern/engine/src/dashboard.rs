//! Composite dashboard payload.
//!
//! One snapshot combining the latest evaluation run, the current latency
//! window, and the ablation verdict, each checked against its fixed target.
//! The p95 gate only passes once the window holds enough samples for the
//! percentile to mean anything, matching the alert evaluator's cutoff.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use lectern_types::{ConfidenceLevel, SearchType, WindowStats};
use serde::{Deserialize, Serialize};

/// Ranking-quality block: last evaluation run against the MRR target.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MrrBlock {
    /// Pass target for mean reciprocal rank.
    pub target: f64,
    /// MRR of the most recent run, if any run has completed.
    pub current: Option<f64>,
    /// Coverage of the most recent run.
    pub coverage: Option<f64>,
    /// Search mode of the most recent run.
    pub search_type: Option<SearchType>,
    /// When the most recent run finished.
    pub evaluated_at: Option<DateTime<Utc>>,
    /// True when a run exists and met the target.
    pub passing: bool,
}

/// Latency block: current window statistics against the p95 target.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LatencyBlock {
    /// Pass target for p95 latency, in milliseconds.
    pub target_ms: f64,
    /// Statistics over the dashboard window.
    pub stats: WindowStats,
    /// True when the window holds at least 5 samples and p95 met the target.
    pub passing: bool,
}

/// Ablation block: the current window-size verdict.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WindowBlock {
    /// Recommended variant, when the comparison had enough data.
    pub recommended: Option<String>,
    /// Confidence of the recommendation.
    pub confidence: Option<ConfidenceLevel>,
    /// Samples observed per variant.
    pub variant_counts: HashMap<String, usize>,
}

/// Pass/fail roll-up across the dashboard blocks.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct OverallStatus {
    pub mrr_passing: bool,
    pub p95_passing: bool,
    /// True only when every gated block passes.
    pub all_passing: bool,
}

/// Full composite dashboard payload.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    /// When the snapshot was assembled.
    pub generated_at: DateTime<Utc>,
    pub mrr: MrrBlock,
    pub p95: LatencyBlock,
    pub windows: WindowBlock,
    pub overall: OverallStatus,
}
