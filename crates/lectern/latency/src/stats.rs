//! Windowed descriptive statistics with nearest-rank percentiles.

use lectern_types::{LatencySample, WindowStats};

/// Default service-level target for p95 search latency.
pub const DEFAULT_THRESHOLD_MS: f64 = 2000.0;

/// Nearest-rank percentile over an ascending-sorted slice.
///
/// For p in (0, 1], the value is at index `ceil(p * n) - 1`, clamped to
/// `[0, n - 1]`. Deterministic and monotone: p50 <= p95 <= p99 <= max for
/// any n >= 1.
pub fn nearest_rank(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let n = sorted.len();
    let rank = (p * n as f64).ceil() as usize;
    let index = rank.saturating_sub(1).min(n - 1);
    sorted[index]
}

/// Computes descriptive statistics over a sample snapshot.
#[derive(Clone, Copy, Debug)]
pub struct WindowedStatsCalculator {
    threshold_ms: f64,
}

impl WindowedStatsCalculator {
    /// Calculator checking p95 against the given threshold.
    pub fn new(threshold_ms: f64) -> Self {
        Self { threshold_ms }
    }

    /// Calculator with the 2000 ms default target.
    pub fn with_default_threshold() -> Self {
        Self::new(DEFAULT_THRESHOLD_MS)
    }

    /// Configured p95 threshold.
    pub fn threshold_ms(&self) -> f64 {
        self.threshold_ms
    }

    /// Statistics over a snapshot taken for `window_minutes`.
    ///
    /// An empty snapshot yields all-zero stats with `ready = false`; this is
    /// not an error.
    pub fn stats(&self, samples: &[LatencySample], window_minutes: f64) -> WindowStats {
        self.stats_with_threshold(samples, window_minutes, self.threshold_ms)
    }

    /// Same as [`stats`](Self::stats) with an explicit threshold override.
    pub fn stats_with_threshold(
        &self,
        samples: &[LatencySample],
        window_minutes: f64,
        threshold_ms: f64,
    ) -> WindowStats {
        if samples.is_empty() {
            return WindowStats::empty(window_minutes, threshold_ms);
        }

        let mut durations: Vec<f64> = samples.iter().map(|s| s.duration_ms).collect();
        // Durations are validated finite at ingestion, so total order holds.
        durations.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let count = durations.len();
        let sum: f64 = durations.iter().sum();
        let p95 = nearest_rank(&durations, 0.95);

        WindowStats {
            count,
            mean_ms: sum / count as f64,
            p50_ms: nearest_rank(&durations, 0.50),
            p95_ms: p95,
            p99_ms: nearest_rank(&durations, 0.99),
            min_ms: durations[0],
            max_ms: durations[count - 1],
            window_minutes,
            threshold_ms,
            threshold_exceeded: p95 > threshold_ms,
            ready: true,
        }
    }
}

/// Sample standard deviation of a duration set. Zero for fewer than two
/// values.
pub fn stddev(durations: &[f64]) -> f64 {
    let n = durations.len();
    if n < 2 {
        return 0.0;
    }
    let mean = durations.iter().sum::<f64>() / n as f64;
    let variance = durations
        .iter()
        .map(|d| {
            let delta = d - mean;
            delta * delta
        })
        .sum::<f64>()
        / (n - 1) as f64;
    variance.sqrt()
}
