//! Lectern Latency - latency telemetry over sliding time windows
//!
//! The write side is a bounded, thread-safe [`SampleLog`] fed by the
//! search-completion path. The read side is pull-only: windowed statistics
//! with nearest-rank percentiles, bucketed trends, and a threshold alert
//! with an explicit small-sample fallback. Reads copy a snapshot under a
//! short critical section and aggregate outside the lock.
//!
//! Nothing here polls or pushes; periodic refresh belongs to the calling
//! surface.

#![deny(unsafe_code)]

pub mod alert;
pub mod error;
pub mod log;
pub mod stats;
pub mod trend;

pub use alert::{AlertEvaluator, SMALL_SAMPLE_CUTOFF};
pub use error::{TelemetryError, TelemetryResult};
pub use log::{SampleLog, DEFAULT_CAPACITY};
pub use stats::{nearest_rank, stddev, WindowedStatsCalculator, DEFAULT_THRESHOLD_MS};
pub use trend::TrendBucketer;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_record_then_stats_roundtrip() {
        let log = Arc::new(SampleLog::with_defaults());
        let calc = WindowedStatsCalculator::with_default_threshold();

        for d in [120.0, 250.0, 180.0, 90.0, 310.0] {
            log.record(d, None).unwrap();
        }

        let samples = log.snapshot(10.0, None).unwrap();
        let stats = calc.stats(&samples, 10.0);
        assert_eq!(stats.count, 5);
        assert!(stats.ready);
        assert_eq!(stats.max_ms, 310.0);
        assert_eq!(stats.min_ms, 90.0);
    }

    #[test]
    fn test_recording_never_decreases_window_count() {
        let log = Arc::new(SampleLog::with_defaults());
        let before = log.snapshot(10.0, None).unwrap().len();
        log.record(42.0, None).unwrap();
        let after = log.snapshot(10.0, None).unwrap().len();
        assert!(after > before);
    }
}
