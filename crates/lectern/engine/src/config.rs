//! Engine configuration.

use std::time::Duration;

use lectern_goldset::DEFAULT_QUERY_TIMEOUT;
use lectern_latency::{DEFAULT_CAPACITY, DEFAULT_THRESHOLD_MS};
use lectern_types::VariantSpec;
use serde::{Deserialize, Serialize};

/// Service-level target for mean reciprocal rank.
pub const DEFAULT_MRR_TARGET: f64 = 0.70;

/// Configuration for a [`TelemetryEngine`](crate::TelemetryEngine).
///
/// The defaults mirror the production targets: p95 under 2000 ms over a
/// 10-minute window, MRR at or above 0.70, and a 30-second versus 60-second
/// window ablation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Retention bound of the sample log.
    pub capacity: usize,
    /// p95 alert threshold, in milliseconds.
    pub threshold_ms: f64,
    /// Window used for the dashboard's latency block, in minutes.
    pub default_window_minutes: f64,
    /// MRR pass target for the dashboard.
    pub mrr_target: f64,
    /// p95 pass target for the dashboard, in milliseconds.
    pub p95_target_ms: f64,
    /// Monitoring-window variants under ablation.
    pub variants: Vec<VariantSpec>,
    /// Bound on a single gold query during evaluation.
    pub query_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            threshold_ms: DEFAULT_THRESHOLD_MS,
            default_window_minutes: 10.0,
            mrr_target: DEFAULT_MRR_TARGET,
            p95_target_ms: DEFAULT_THRESHOLD_MS,
            variants: vec![VariantSpec::new("30s", 0.5), VariantSpec::new("60s", 1.0)],
            query_timeout: DEFAULT_QUERY_TIMEOUT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_targets() {
        let config = EngineConfig::default();
        assert_eq!(config.mrr_target, 0.70);
        assert_eq!(config.p95_target_ms, 2000.0);
        assert_eq!(config.variants.len(), 2);
    }
}
