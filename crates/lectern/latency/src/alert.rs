//! Threshold alerting with a small-sample fallback.
//!
//! With fewer than five samples the p95 estimate is statistically
//! unreliable, so the evaluator falls back to the window maximum. This is a
//! deliberate policy the dashboards surface to operators, not an
//! approximation artifact.

use std::sync::Arc;

use lectern_types::{AlertMetric, AlertState};
use tracing::{debug, warn};

use crate::error::TelemetryResult;
use crate::log::SampleLog;
use crate::stats::WindowedStatsCalculator;

/// Below this many samples the alert decision uses the window maximum.
pub const SMALL_SAMPLE_CUTOFF: usize = 5;

/// Evaluates the latency target over a trailing window.
pub struct AlertEvaluator {
    log: Arc<SampleLog>,
    calculator: WindowedStatsCalculator,
}

impl AlertEvaluator {
    pub fn new(log: Arc<SampleLog>, calculator: WindowedStatsCalculator) -> Self {
        Self { log, calculator }
    }

    /// Evaluate the latency target over the trailing window.
    ///
    /// Insufficient data is not an error: an empty window yields
    /// `alert = false` with an explanatory message.
    pub fn evaluate(
        &self,
        window_minutes: f64,
        threshold_ms: Option<f64>,
    ) -> TelemetryResult<AlertState> {
        let threshold_ms = threshold_ms.unwrap_or_else(|| self.calculator.threshold_ms());
        let samples = self.log.snapshot(window_minutes, None)?;
        let stats = self
            .calculator
            .stats_with_threshold(&samples, window_minutes, threshold_ms);

        let state = if stats.count == 0 {
            AlertState {
                alert: false,
                metric: None,
                metric_value_ms: 0.0,
                threshold_ms,
                count: 0,
                window_minutes,
                message: "no data in window".to_string(),
                stats,
            }
        } else if stats.count < SMALL_SAMPLE_CUTOFF {
            let alert = stats.max_ms > threshold_ms;
            let verdict = if alert { "exceeds" } else { "is within" };
            AlertState {
                alert,
                metric: Some(AlertMetric::Max),
                metric_value_ms: stats.max_ms,
                threshold_ms,
                count: stats.count,
                window_minutes,
                message: format!(
                    "max latency ({:.0}ms) {} {:.0}ms threshold; p95 is unreliable with only {} samples, using max",
                    stats.max_ms, verdict, threshold_ms, stats.count
                ),
                stats,
            }
        } else {
            let alert = stats.threshold_exceeded;
            let verdict = if alert { "exceeds" } else { "is within" };
            AlertState {
                alert,
                metric: Some(AlertMetric::P95),
                metric_value_ms: stats.p95_ms,
                threshold_ms,
                count: stats.count,
                window_minutes,
                message: format!(
                    "p95 latency ({:.0}ms) {} {:.0}ms threshold over last {} minutes",
                    stats.p95_ms, verdict, threshold_ms, window_minutes
                ),
                stats,
            }
        };

        if state.alert {
            warn!(
                metric = %state.metric.map(|m| m.to_string()).unwrap_or_default(),
                value_ms = state.metric_value_ms,
                threshold_ms = state.threshold_ms,
                samples = state.count,
                window_minutes = state.window_minutes,
                "latency threshold exceeded"
            );
        } else {
            debug!(samples = state.count, window_minutes, "latency within target");
        }

        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evaluator(log: Arc<SampleLog>) -> AlertEvaluator {
        AlertEvaluator::new(log, WindowedStatsCalculator::with_default_threshold())
    }

    #[test]
    fn test_empty_window_no_alert() {
        let log = Arc::new(SampleLog::with_defaults());
        let state = evaluator(log).evaluate(10.0, None).unwrap();
        assert!(!state.alert);
        assert_eq!(state.metric, None);
        assert_eq!(state.message, "no data in window");
        assert!(!state.stats.ready);
    }

    #[test]
    fn test_small_sample_uses_max() {
        // 4 samples with one slow outlier: nearest-rank p95 of 4 samples is
        // the max anyway, but the decision must be reported as max-based.
        let log = Arc::new(SampleLog::with_defaults());
        for d in [100.0, 200.0, 300.0, 5000.0] {
            log.record(d, None).unwrap();
        }

        let state = evaluator(log).evaluate(10.0, None).unwrap();
        assert_eq!(state.count, 4);
        assert_eq!(state.metric, Some(AlertMetric::Max));
        assert_eq!(state.metric_value_ms, 5000.0);
        assert!(state.alert);
        assert!(state.message.contains("only 4 samples"));
    }

    #[test]
    fn test_five_samples_use_p95() {
        let log = Arc::new(SampleLog::with_defaults());
        for d in [100.0, 200.0, 300.0, 400.0, 500.0] {
            log.record(d, None).unwrap();
        }

        let state = evaluator(log).evaluate(10.0, None).unwrap();
        assert_eq!(state.metric, Some(AlertMetric::P95));
        assert_eq!(state.metric_value_ms, 500.0);
        assert!(!state.alert);
    }

    #[test]
    fn test_threshold_override() {
        let log = Arc::new(SampleLog::with_defaults());
        for d in [100.0, 150.0, 200.0, 250.0, 300.0] {
            log.record(d, None).unwrap();
        }

        let state = evaluator(log).evaluate(10.0, Some(250.0)).unwrap();
        assert_eq!(state.threshold_ms, 250.0);
        assert!(state.alert);
    }

    #[test]
    fn test_consecutive_reads_identical() {
        let log = Arc::new(SampleLog::with_defaults());
        for d in [100.0, 200.0, 300.0, 400.0, 500.0, 600.0] {
            log.record(d, None).unwrap();
        }

        let eval = evaluator(log);
        let first = eval.evaluate(10.0, None).unwrap();
        let second = eval.evaluate(10.0, None).unwrap();
        assert_eq!(first.alert, second.alert);
        assert_eq!(first.metric_value_ms, second.metric_value_ms);
        assert_eq!(first.stats, second.stats);
    }
}
