//! Latency trend over fixed-size time buckets.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::DateTime;
use lectern_types::{LatencySample, TrendBucket};

use crate::error::{TelemetryError, TelemetryResult};
use crate::log::SampleLog;
use crate::stats::WindowedStatsCalculator;

/// Partitions a trailing period into fixed-size buckets and computes window
/// statistics on each, for trend inspection.
pub struct TrendBucketer {
    log: Arc<SampleLog>,
    calculator: WindowedStatsCalculator,
}

impl TrendBucketer {
    pub fn new(log: Arc<SampleLog>, calculator: WindowedStatsCalculator) -> Self {
        Self { log, calculator }
    }

    /// Bucketed statistics over the trailing `window_minutes`, ascending by
    /// bucket start. Buckets that received no samples are omitted.
    pub fn trend(
        &self,
        window_minutes: f64,
        bucket_minutes: u32,
    ) -> TelemetryResult<Vec<TrendBucket>> {
        if bucket_minutes == 0 {
            return Err(TelemetryError::InvalidBucket(bucket_minutes));
        }

        let samples = self.log.snapshot(window_minutes, None)?;
        Ok(self.bucketize(&samples, bucket_minutes))
    }

    fn bucketize(&self, samples: &[LatencySample], bucket_minutes: u32) -> Vec<TrendBucket> {
        let bucket_secs = i64::from(bucket_minutes) * 60;

        let mut buckets: BTreeMap<i64, Vec<LatencySample>> = BTreeMap::new();
        for sample in samples {
            let ts = sample.recorded_at.timestamp();
            let start = ts - ts.rem_euclid(bucket_secs);
            buckets.entry(start).or_default().push(sample.clone());
        }

        buckets
            .into_iter()
            .filter_map(|(start, bucket_samples)| {
                let bucket_start = DateTime::from_timestamp(start, 0)?;
                Some(TrendBucket {
                    bucket_start,
                    stats: self
                        .calculator
                        .stats(&bucket_samples, f64::from(bucket_minutes)),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn bucketer(log: Arc<SampleLog>) -> TrendBucketer {
        TrendBucketer::new(log, WindowedStatsCalculator::with_default_threshold())
    }

    #[test]
    fn test_zero_bucket_rejected() {
        let log = Arc::new(SampleLog::with_defaults());
        assert!(bucketer(log).trend(60.0, 0).is_err());
    }

    #[test]
    fn test_empty_log_yields_no_buckets() {
        let log = Arc::new(SampleLog::with_defaults());
        let trend = bucketer(log).trend(60.0, 5).unwrap();
        assert!(trend.is_empty());
    }

    #[test]
    fn test_samples_land_in_ordered_buckets() {
        let log = Arc::new(SampleLog::with_defaults());
        let now = Utc::now();

        // Two samples ~12 minutes ago, one just now: with 5-minute buckets
        // they occupy two distinct buckets in ascending order.
        for (secs_ago, d) in [(720, 300.0), (700, 500.0), (1, 100.0)] {
            log.push(lectern_types::LatencySample {
                recorded_at: now - Duration::seconds(secs_ago),
                duration_ms: d,
                variant: None,
            })
            .unwrap();
        }

        let trend = bucketer(log).trend(60.0, 5).unwrap();
        assert_eq!(trend.len(), 2);
        assert!(trend[0].bucket_start < trend[1].bucket_start);
        assert_eq!(trend[0].stats.count, 2);
        assert_eq!(trend[0].stats.mean_ms, 400.0);
        assert_eq!(trend[1].stats.count, 1);
    }

    #[test]
    fn test_bucket_alignment() {
        let log = Arc::new(SampleLog::with_defaults());
        let now = Utc::now();
        log.push(lectern_types::LatencySample {
            recorded_at: now,
            duration_ms: 100.0,
            variant: None,
        })
        .unwrap();

        let trend = bucketer(log).trend(60.0, 5).unwrap();
        assert_eq!(trend.len(), 1);
        // Bucket starts are aligned to 5-minute boundaries.
        assert_eq!(trend[0].bucket_start.timestamp() % 300, 0);
    }
}
