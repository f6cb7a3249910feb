//! Plain-text operator status dump.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use lectern_types::{AblationReport, AlertState, EvaluationResult, Insight, Recommendation};
use serde::{Deserialize, Serialize};

use crate::dashboard::OverallStatus;

/// Everything the status dump renders, gathered in one read pass.
///
/// Rendering is pure formatting; [`fmt::Display`] produces the multi-section
/// text block operators see, and the struct serializes for callers that
/// want the same snapshot as JSON.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StatusReport {
    pub generated_at: DateTime<Utc>,
    pub window_minutes: f64,
    pub alert: AlertState,
    pub mrr_target: f64,
    pub last_evaluation: Option<EvaluationResult>,
    pub ablation: AblationReport,
    pub overall: OverallStatus,
}

fn pass_fail(passing: bool) -> &'static str {
    if passing {
        "PASS"
    } else {
        "FAIL"
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "==============================================")?;
        writeln!(f, " LECTURE SEARCH ENGINE STATUS")?;
        writeln!(f, " generated: {}", self.generated_at.to_rfc3339())?;
        writeln!(f, "==============================================")?;

        writeln!(f)?;
        writeln!(f, "--- P95 LATENCY MONITORING ---")?;
        writeln!(f, " window:  {} min", self.window_minutes)?;
        writeln!(f, " samples: {}", self.alert.count)?;
        if self.alert.stats.ready {
            writeln!(
                f,
                " p50/p95/p99: {:.0} / {:.0} / {:.0} ms (max {:.0} ms)",
                self.alert.stats.p50_ms,
                self.alert.stats.p95_ms,
                self.alert.stats.p99_ms,
                self.alert.stats.max_ms
            )?;
        }
        let alert_tag = if self.alert.alert { "ALERT" } else { "OK" };
        writeln!(f, " status:  {} - {}", alert_tag, self.alert.message)?;

        writeln!(f)?;
        writeln!(f, "--- MRR EVALUATION ---")?;
        match &self.last_evaluation {
            None => writeln!(f, " no evaluation run yet")?,
            Some(run) => {
                writeln!(f, " search type: {}, k={}", run.search_type, run.k)?;
                writeln!(
                    f,
                    " MRR: {:.3} (target {:.3}) -> {}",
                    run.mrr,
                    self.mrr_target,
                    pass_fail(run.mrr >= self.mrr_target)
                )?;
                writeln!(
                    f,
                    " coverage: {:.3} ({}/{} found)",
                    run.coverage, run.found_queries, run.total_queries
                )?;
                writeln!(f, " evaluated: {}", run.evaluated_at.to_rfc3339())?;
            }
        }

        writeln!(f)?;
        writeln!(f, "--- WINDOW ABLATION ---")?;
        // Sorted for a deterministic dump.
        let per_variant: BTreeMap<_, _> = self.ablation.per_variant.iter().collect();
        for (name, report) in per_variant {
            writeln!(
                f,
                " {}: {} samples, p95 {:.0} ms, stability {:.3}, reliability {}",
                name,
                report.stats.count,
                report.stats.p95_ms,
                report.stability_score,
                report.reliability
            )?;
        }
        for insight in &self.ablation.insights {
            if let Insight::Error { message } = insight {
                writeln!(f, " note: {message}")?;
            }
        }
        match &self.ablation.recommendation {
            Recommendation::Selected {
                recommended,
                confidence,
                reason,
                ..
            } => {
                writeln!(
                    f,
                    " recommendation: {recommended} (confidence {confidence}) - {reason}"
                )?;
            }
            Recommendation::InsufficientData { data_needed, .. } => {
                writeln!(f, " recommendation: insufficient data - {data_needed}")?;
            }
        }

        writeln!(f)?;
        writeln!(f, "--- OVERALL HEALTH ---")?;
        writeln!(f, " MRR: {}", pass_fail(self.overall.mrr_passing))?;
        writeln!(f, " P95: {}", pass_fail(self.overall.p95_passing))?;
        let verdict = if self.overall.all_passing {
            "HEALTHY"
        } else {
            "DEGRADED"
        };
        writeln!(f, " overall: {verdict}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lectern_types::WindowStats;
    use std::collections::HashMap;

    fn report(alert_count: usize) -> StatusReport {
        let stats = WindowStats {
            count: alert_count,
            mean_ms: 150.0,
            p50_ms: 140.0,
            p95_ms: 300.0,
            p99_ms: 310.0,
            min_ms: 90.0,
            max_ms: 320.0,
            window_minutes: 10.0,
            threshold_ms: 2000.0,
            threshold_exceeded: false,
            ready: alert_count > 0,
        };
        StatusReport {
            generated_at: Utc::now(),
            window_minutes: 10.0,
            alert: AlertState {
                alert: false,
                metric: None,
                metric_value_ms: 300.0,
                threshold_ms: 2000.0,
                count: alert_count,
                window_minutes: 10.0,
                message: "no data in window".to_string(),
                stats,
            },
            mrr_target: 0.70,
            last_evaluation: None,
            ablation: AblationReport {
                generated_at: Utc::now(),
                per_variant: HashMap::new(),
                insights: vec![Insight::Error {
                    message: "variant '60s' has no samples".to_string(),
                }],
                recommendation: Recommendation::InsufficientData {
                    data_needed: "more samples".to_string(),
                    observed_counts: HashMap::new(),
                },
            },
            overall: OverallStatus {
                mrr_passing: false,
                p95_passing: false,
                all_passing: false,
            },
        }
    }

    #[test]
    fn test_render_without_evaluation() {
        let text = report(0).to_string();
        assert!(text.contains("no evaluation run yet"));
        assert!(text.contains("insufficient data"));
        assert!(text.contains("note: variant '60s' has no samples"));
        assert!(text.contains("overall: DEGRADED"));
    }

    #[test]
    fn test_percentile_line_only_when_ready() {
        assert!(!report(0).to_string().contains("p50/p95/p99"));
        assert!(report(7).to_string().contains("p50/p95/p99"));
    }
}
