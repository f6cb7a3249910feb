//! Append-only, thread-safe store of latency observations.
//!
//! The log is the only mutable shared state in the engine. Writers append
//! under a short write lock; readers copy a snapshot under a short read
//! lock and do all aggregate math outside it, so long-running percentile
//! computations never block sample ingestion.

use std::collections::VecDeque;
use std::sync::RwLock;

use chrono::{DateTime, Duration, Utc};
use lectern_types::LatencySample;
use tracing::debug;

use crate::error::{TelemetryError, TelemetryResult};

/// Default bound on retained samples. Oldest samples are evicted past this;
/// a resource policy, not a correctness one.
pub const DEFAULT_CAPACITY: usize = 1000;

/// Bounded, thread-safe log of latency samples.
///
/// Explicitly constructed and handed to consumers; there is no process-wide
/// instance.
pub struct SampleLog {
    capacity: usize,
    samples: RwLock<VecDeque<LatencySample>>,
}

impl SampleLog {
    /// Create an empty log retaining at most `capacity` samples.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            samples: RwLock::new(VecDeque::new()),
        }
    }

    /// Create an empty log with the default retention bound.
    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }

    /// Record an observation stamped with the current time.
    ///
    /// O(1) amortized; called from every in-flight search completion.
    pub fn record(&self, duration_ms: f64, variant: Option<&str>) -> TelemetryResult<()> {
        self.push(LatencySample::now(duration_ms, variant.map(str::to_owned)))
    }

    /// Append a pre-built sample. Rejects non-finite or negative durations
    /// so downstream sorting stays total.
    pub fn push(&self, sample: LatencySample) -> TelemetryResult<()> {
        if !sample.duration_ms.is_finite() || sample.duration_ms < 0.0 {
            return Err(TelemetryError::InvalidDuration(sample.duration_ms));
        }

        let mut samples = self.samples.write().map_err(|_| TelemetryError::LockError)?;
        if samples.len() == self.capacity {
            samples.pop_front();
        }
        samples.push_back(sample);

        debug!(stored = samples.len(), capacity = self.capacity, "sample recorded");
        Ok(())
    }

    /// Copy all samples with `recorded_at >= now - window_minutes`, filtered
    /// to `variant` when given.
    ///
    /// The lock is held only for the copy; callers aggregate outside it.
    pub fn snapshot(
        &self,
        window_minutes: f64,
        variant: Option<&str>,
    ) -> TelemetryResult<Vec<LatencySample>> {
        self.snapshot_at(Utc::now(), window_minutes, variant)
    }

    /// Snapshot relative to an explicit reference time. Lets tests pin the
    /// window boundary.
    pub fn snapshot_at(
        &self,
        now: DateTime<Utc>,
        window_minutes: f64,
        variant: Option<&str>,
    ) -> TelemetryResult<Vec<LatencySample>> {
        if !window_minutes.is_finite() || window_minutes <= 0.0 {
            return Err(TelemetryError::InvalidWindow(window_minutes));
        }

        // A window too wide to subtract from `now` simply covers every
        // retained sample.
        let cutoff = now.checked_sub_signed(Duration::milliseconds(
            (window_minutes * 60_000.0) as i64,
        ));

        let samples = self.samples.read().map_err(|_| TelemetryError::LockError)?;
        Ok(samples
            .iter()
            .filter(|s| cutoff.map_or(true, |cutoff| s.recorded_at >= cutoff))
            .filter(|s| match variant {
                Some(tag) => s.variant.as_deref() == Some(tag),
                None => true,
            })
            .cloned()
            .collect())
    }

    /// Total samples currently retained (across all windows and variants).
    pub fn len(&self) -> TelemetryResult<usize> {
        let samples = self.samples.read().map_err(|_| TelemetryError::LockError)?;
        Ok(samples.len())
    }

    /// Whether the log holds no samples.
    pub fn is_empty(&self) -> TelemetryResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Retention bound.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_at(now: DateTime<Utc>, secs_ago: i64, duration_ms: f64) -> LatencySample {
        LatencySample {
            recorded_at: now - Duration::seconds(secs_ago),
            duration_ms,
            variant: None,
        }
    }

    #[test]
    fn test_record_and_snapshot() {
        let log = SampleLog::with_defaults();
        log.record(120.0, None).unwrap();
        log.record(340.0, Some("30s")).unwrap();

        let all = log.snapshot(10.0, None).unwrap();
        assert_eq!(all.len(), 2);

        let tagged = log.snapshot(10.0, Some("30s")).unwrap();
        assert_eq!(tagged.len(), 1);
        assert_eq!(tagged[0].duration_ms, 340.0);
    }

    #[test]
    fn test_window_boundary_excludes_old_samples() {
        let log = SampleLog::with_defaults();
        let now = Utc::now();
        log.push(sample_at(now, 30, 100.0)).unwrap();
        log.push(sample_at(now, 90, 200.0)).unwrap();

        // One-minute window keeps only the 30s-old sample.
        let recent = log.snapshot_at(now, 1.0, None).unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].duration_ms, 100.0);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let log = SampleLog::new(3);
        for i in 0..5 {
            log.record(i as f64, None).unwrap();
        }
        let all = log.snapshot(10.0, None).unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].duration_ms, 2.0);
    }

    #[test]
    fn test_enormous_window_covers_all_samples() {
        // Wide enough that the cutoff underflows the calendar; every
        // retained sample is in range.
        let log = SampleLog::with_defaults();
        log.record(100.0, None).unwrap();
        log.record(200.0, Some("30s")).unwrap();

        let all = log.snapshot(1.0e18, None).unwrap();
        assert_eq!(all.len(), 2);
        let tagged = log.snapshot(f64::MAX, Some("30s")).unwrap();
        assert_eq!(tagged.len(), 1);
    }

    #[test]
    fn test_rejects_bad_durations() {
        let log = SampleLog::with_defaults();
        assert!(log.record(f64::NAN, None).is_err());
        assert!(log.record(-1.0, None).is_err());
    }

    #[test]
    fn test_rejects_bad_window() {
        let log = SampleLog::with_defaults();
        assert!(log.snapshot(0.0, None).is_err());
        assert!(log.snapshot(-5.0, None).is_err());
    }
}
