//! Lectern Ablation - monitoring-window comparison and recommendation
//!
//! Compares configured monitoring-window variants over their own tagged
//! samples and scores each on stability, sample depth, and responsiveness.
//! The comparison is a pure read of the sample log: it never mutates state
//! and never fails on sparse data. An empty variant downgrades the verdict
//! to an explicit data request instead of a numeric recommendation.

#![deny(unsafe_code)]

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use lectern_latency::{stddev, SampleLog, TelemetryResult, WindowedStatsCalculator};
use lectern_types::{
    AblationReport, ConfidenceLevel, Insight, Recommendation, ReliabilityLevel, VariantReport,
    VariantSpec,
};
use tracing::{debug, info, warn};

/// Floor for the mean in the stability ratio, so an all-zero-latency
/// variant still scores as perfectly steady instead of dividing by zero.
pub const STABILITY_EPSILON: f64 = 1e-9;

/// Weights of the composite variant score.
///
/// Stability dominates, with sample depth and responsiveness as equal
/// secondary factors. Sample depth saturates at `sample_normalizer`
/// observations so a long-running variant cannot win on volume alone.
#[derive(Clone, Copy, Debug)]
pub struct ScorePolicy {
    pub stability_weight: f64,
    pub sample_weight: f64,
    pub responsiveness_weight: f64,
    pub sample_normalizer: f64,
}

impl Default for ScorePolicy {
    fn default() -> Self {
        Self {
            stability_weight: 0.4,
            sample_weight: 0.3,
            responsiveness_weight: 0.3,
            sample_normalizer: 10.0,
        }
    }
}

impl ScorePolicy {
    /// Composite score in [0, 1] for one variant.
    fn composite(&self, report: &VariantReport) -> f64 {
        let sample_factor = (report.stats.count as f64 / self.sample_normalizer).min(1.0);
        self.stability_weight * report.stability_score
            + self.sample_weight * sample_factor
            + self.responsiveness_weight * report.responsiveness_score
    }
}

/// Compares monitoring-window variants and recommends one.
///
/// Each variant is scored over its own tagged samples and its own window
/// width. Reliability is classified from the variant's sample count, and the
/// recommendation's confidence is bounded by the weakest compared variant.
pub struct AblationAnalyzer {
    log: Arc<SampleLog>,
    variants: Vec<VariantSpec>,
    calculator: WindowedStatsCalculator,
    policy: ScorePolicy,
}

impl AblationAnalyzer {
    pub fn new(
        log: Arc<SampleLog>,
        variants: Vec<VariantSpec>,
        calculator: WindowedStatsCalculator,
    ) -> Self {
        Self {
            log,
            variants,
            calculator,
            policy: ScorePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: ScorePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Variants under comparison, in configured order.
    pub fn variants(&self) -> &[VariantSpec] {
        &self.variants
    }

    /// Compare all configured variants and produce a full report.
    ///
    /// Sparse or empty variants are reported, not rejected: the only error
    /// path is the sample log itself being unreadable.
    pub fn compare(&self) -> TelemetryResult<AblationReport> {
        let smallest_window = self
            .variants
            .iter()
            .map(|v| v.window_minutes)
            .fold(f64::INFINITY, f64::min);

        let mut per_variant = HashMap::with_capacity(self.variants.len());
        for spec in &self.variants {
            let report = self.variant_report(spec, smallest_window)?;
            debug!(
                variant = %spec.name,
                count = report.stats.count,
                stability = report.stability_score,
                "variant scored"
            );
            per_variant.insert(spec.name.clone(), report);
        }

        let mut insights = self.pairwise_insights(&per_variant);
        if let Some(most_stable) = self.most_stable(&per_variant) {
            insights.push(most_stable);
        }

        let empty: Vec<&VariantSpec> = self
            .variants
            .iter()
            .filter(|spec| per_variant[&spec.name].stats.count == 0)
            .collect();
        for spec in &empty {
            warn!(variant = %spec.name, "variant has no samples in its window");
            insights.push(Insight::Error {
                message: format!(
                    "variant '{}' has no samples in its {}-minute window; comparison skipped",
                    spec.name, spec.window_minutes
                ),
            });
        }

        let recommendation = if self.variants.is_empty() || !empty.is_empty() {
            Recommendation::InsufficientData {
                data_needed: "at least 1 sample per variant (5 or more for a reliable comparison)"
                    .to_string(),
                observed_counts: per_variant
                    .iter()
                    .map(|(name, report)| (name.clone(), report.stats.count))
                    .collect(),
            }
        } else {
            self.select(&per_variant)
        };

        info!(
            variants = self.variants.len(),
            insights = insights.len(),
            recommended = matches!(recommendation, Recommendation::Selected { .. }),
            "ablation comparison complete"
        );

        Ok(AblationReport {
            generated_at: Utc::now(),
            per_variant,
            insights,
            recommendation,
        })
    }

    fn variant_report(
        &self,
        spec: &VariantSpec,
        smallest_window: f64,
    ) -> TelemetryResult<VariantReport> {
        let samples = self.log.snapshot(spec.window_minutes, Some(&spec.name))?;
        let stats = self.calculator.stats(&samples, spec.window_minutes);

        let durations: Vec<f64> = samples.iter().map(|s| s.duration_ms).collect();
        let stddev_ms = stddev(&durations);

        let stability_score = if stats.count == 0 {
            0.0
        } else {
            let ratio = stddev_ms / stats.mean_ms.max(STABILITY_EPSILON);
            (1.0 - ratio.min(1.0)).clamp(0.0, 1.0)
        };

        // Narrower windows react to regressions sooner; the narrowest
        // configured variant anchors the scale at 1.
        let responsiveness_score = smallest_window / spec.window_minutes;

        Ok(VariantReport {
            reliability: ReliabilityLevel::from_sample_count(stats.count),
            stats,
            stddev_ms,
            stability_score,
            responsiveness_score,
        })
    }

    fn pairwise_insights(&self, per_variant: &HashMap<String, VariantReport>) -> Vec<Insight> {
        let mut insights = Vec::new();
        for (i, baseline) in self.variants.iter().enumerate() {
            for candidate in self.variants.iter().skip(i + 1) {
                let base = &per_variant[&baseline.name];
                let cand = &per_variant[&candidate.name];
                if base.stats.count == 0 || cand.stats.count == 0 {
                    continue;
                }

                let p95_difference_ms = cand.stats.p95_ms - base.stats.p95_ms;
                let p95_change_percent = if base.stats.p95_ms > 0.0 {
                    p95_difference_ms / base.stats.p95_ms * 100.0
                } else {
                    0.0
                };

                insights.push(Insight::Comparison {
                    baseline: baseline.name.clone(),
                    candidate: candidate.name.clone(),
                    p95_difference_ms,
                    p95_change_percent,
                    stability_difference: cand.stability_score - base.stability_score,
                    sample_size_difference: cand.stats.count as i64 - base.stats.count as i64,
                });
            }
        }
        insights
    }

    fn most_stable(&self, per_variant: &HashMap<String, VariantReport>) -> Option<Insight> {
        self.variants
            .iter()
            .filter_map(|spec| {
                let report = &per_variant[&spec.name];
                (report.stats.count > 0).then_some((spec, report))
            })
            .max_by(|(_, a), (_, b)| {
                a.stability_score
                    .partial_cmp(&b.stability_score)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(a.stats.count.cmp(&b.stats.count))
            })
            .map(|(spec, report)| Insight::MostStable {
                variant: spec.name.clone(),
                stability_score: report.stability_score,
                sample_count: report.stats.count,
            })
    }

    /// Pick the highest-composite variant. Ties break toward the larger
    /// sample count, then the narrower window.
    fn select(&self, per_variant: &HashMap<String, VariantReport>) -> Recommendation {
        let mut best: Option<(&VariantSpec, &VariantReport, f64)> = None;
        for spec in &self.variants {
            let report = &per_variant[&spec.name];
            let score = self.policy.composite(report);
            let better = match best {
                None => true,
                Some((best_spec, best_report, best_score)) => {
                    score > best_score
                        || (score == best_score
                            && (report.stats.count > best_report.stats.count
                                || (report.stats.count == best_report.stats.count
                                    && spec.window_minutes < best_spec.window_minutes)))
                }
            };
            if better {
                best = Some((spec, report, score));
            }
        }

        match best {
            Some((spec, report, score)) => {
                let confidence: ConfidenceLevel = self
                    .variants
                    .iter()
                    .map(|v| per_variant[&v.name].reliability)
                    .min()
                    .unwrap_or(ReliabilityLevel::Low)
                    .into();
                Recommendation::Selected {
                    recommended: spec.name.clone(),
                    composite_score: score,
                    reason: format!(
                        "best balance of stability ({:.3}), sample depth ({}), and responsiveness ({:.3})",
                        report.stability_score, report.stats.count, report.responsiveness_score
                    ),
                    confidence,
                }
            }
            None => Recommendation::InsufficientData {
                data_needed: "at least one monitoring-window variant must be configured"
                    .to_string(),
                observed_counts: HashMap::new(),
            },
        }
    }
}
