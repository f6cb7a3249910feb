//! The engine facade.
//!
//! A single explicitly constructed handle over the sample log, the alert
//! evaluator, the gold-set evaluator, and the ablation analyzer. All caller
//! input is validated here; the inner components assume clean input. The
//! most recent evaluation run is retained so the dashboard can report MRR
//! without re-running the gold set.

use std::sync::{Arc, RwLock};

use chrono::Utc;
use lectern_ablation::AblationAnalyzer;
use lectern_goldset::{GoldSet, GoldSetEvaluator, SearchCapability};
use lectern_latency::{
    AlertEvaluator, SampleLog, TelemetryError, TrendBucketer, WindowedStatsCalculator,
    SMALL_SAMPLE_CUTOFF,
};
use lectern_types::{
    AblationReport, AlertState, EvaluationResult, Recommendation, SearchType, TrendBucket,
    WindowStats,
};
use tracing::info;

use crate::config::EngineConfig;
use crate::dashboard::{DashboardSnapshot, LatencyBlock, MrrBlock, OverallStatus, WindowBlock};
use crate::error::{EngineError, EngineResult};
use crate::status::StatusReport;

/// The validated operation surface of the telemetry engine.
///
/// Owns all engine state; callers receive a handle rather than reaching a
/// process-wide instance. Queries are pull-based and stateless apart from
/// the retained last evaluation run.
pub struct TelemetryEngine {
    config: EngineConfig,
    log: Arc<SampleLog>,
    calculator: WindowedStatsCalculator,
    alerts: AlertEvaluator,
    trends: TrendBucketer,
    evaluator: GoldSetEvaluator,
    analyzer: AblationAnalyzer,
    last_evaluation: RwLock<Option<EvaluationResult>>,
}

impl TelemetryEngine {
    /// Build an engine from configuration, a loaded gold set, and the
    /// injected search capability. The sample log starts empty.
    pub fn new(config: EngineConfig, gold: GoldSet, search: Arc<dyn SearchCapability>) -> Self {
        let log = Arc::new(SampleLog::new(config.capacity));
        let calculator = WindowedStatsCalculator::new(config.threshold_ms);

        let engine = Self {
            alerts: AlertEvaluator::new(Arc::clone(&log), calculator),
            trends: TrendBucketer::new(Arc::clone(&log), calculator),
            evaluator: GoldSetEvaluator::with_query_timeout(gold, search, config.query_timeout),
            analyzer: AblationAnalyzer::new(Arc::clone(&log), config.variants.clone(), calculator),
            calculator,
            log,
            last_evaluation: RwLock::new(None),
            config,
        };

        info!(
            capacity = engine.config.capacity,
            threshold_ms = engine.config.threshold_ms,
            variants = engine.config.variants.len(),
            gold_queries = engine.evaluator.gold_set_size(),
            "telemetry engine initialized"
        );
        engine
    }

    /// The underlying sample log, for the search-completion path.
    pub fn sample_log(&self) -> &Arc<SampleLog> {
        &self.log
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Record one search latency observation, optionally tagged with a
    /// configured variant.
    pub fn record_sample(&self, duration_ms: f64, variant: Option<&str>) -> EngineResult<()> {
        if let Some(tag) = variant {
            if !self.config.variants.iter().any(|v| v.name == tag) {
                return Err(EngineError::UnknownVariant(tag.to_string()));
            }
        }
        self.log.record(duration_ms, variant)?;
        Ok(())
    }

    /// Descriptive statistics over the trailing window.
    pub fn stats(&self, window_minutes: f64) -> EngineResult<WindowStats> {
        validate_window(window_minutes)?;
        let samples = self.log.snapshot(window_minutes, None)?;
        Ok(self.calculator.stats(&samples, window_minutes))
    }

    /// Bucketed latency trend over the trailing window.
    pub fn trend(&self, window_minutes: f64, bucket_minutes: u32) -> EngineResult<Vec<TrendBucket>> {
        validate_window(window_minutes)?;
        if bucket_minutes == 0 {
            return Err(EngineError::Validation(
                "bucket_minutes must be at least 1".to_string(),
            ));
        }
        Ok(self.trends.trend(window_minutes, bucket_minutes)?)
    }

    /// Latency-target check over the trailing window, with an optional
    /// threshold override.
    pub fn alert(&self, window_minutes: f64, threshold_ms: Option<f64>) -> EngineResult<AlertState> {
        validate_window(window_minutes)?;
        if let Some(t) = threshold_ms {
            if !t.is_finite() || t <= 0.0 {
                return Err(EngineError::Validation(format!(
                    "threshold_ms must be a positive number, got {t}"
                )));
            }
        }
        Ok(self.alerts.evaluate(window_minutes, threshold_ms)?)
    }

    /// Run the gold set and retain the result for the dashboard.
    pub async fn run_evaluation(
        &self,
        search_type: SearchType,
        k: usize,
    ) -> EngineResult<EvaluationResult> {
        if k == 0 {
            return Err(EngineError::Validation(
                "k must be at least 1".to_string(),
            ));
        }

        let result = self.evaluator.run(search_type, k).await?;

        let mut last = self
            .last_evaluation
            .write()
            .map_err(|_| TelemetryError::LockError)?;
        *last = Some(result.clone());
        Ok(result)
    }

    /// As [`run_evaluation`](Self::run_evaluation), parsing the search type
    /// from its wire form.
    pub async fn run_evaluation_raw(
        &self,
        search_type: &str,
        k: usize,
    ) -> EngineResult<EvaluationResult> {
        let search_type: SearchType = search_type
            .parse()
            .map_err(|err: lectern_types::UnknownSearchType| {
                EngineError::Validation(err.to_string())
            })?;
        self.run_evaluation(search_type, k).await
    }

    /// The retained most recent evaluation run, if any.
    pub fn last_evaluation(&self) -> EngineResult<Option<EvaluationResult>> {
        let last = self
            .last_evaluation
            .read()
            .map_err(|_| TelemetryError::LockError)?;
        Ok(last.clone())
    }

    /// Compare the configured monitoring-window variants.
    pub fn ablation(&self) -> EngineResult<AblationReport> {
        Ok(self.analyzer.compare()?)
    }

    /// Assemble the composite dashboard snapshot.
    pub fn dashboard(&self) -> EngineResult<DashboardSnapshot> {
        let stats = self.stats(self.config.default_window_minutes)?;
        let ablation = self.ablation()?;
        let last = self.last_evaluation()?;

        let mrr_passing = last
            .as_ref()
            .map(|run| run.mrr >= self.config.mrr_target)
            .unwrap_or(false);
        // The p95 gate stays closed until the percentile is trustworthy.
        let p95_passing =
            stats.count >= SMALL_SAMPLE_CUTOFF && stats.p95_ms <= self.config.p95_target_ms;

        let (recommended, confidence) = match &ablation.recommendation {
            Recommendation::Selected {
                recommended,
                confidence,
                ..
            } => (Some(recommended.clone()), Some(*confidence)),
            Recommendation::InsufficientData { .. } => (None, None),
        };

        Ok(DashboardSnapshot {
            generated_at: Utc::now(),
            mrr: MrrBlock {
                target: self.config.mrr_target,
                current: last.as_ref().map(|run| run.mrr),
                coverage: last.as_ref().map(|run| run.coverage),
                search_type: last.as_ref().map(|run| run.search_type),
                evaluated_at: last.as_ref().map(|run| run.evaluated_at),
                passing: mrr_passing,
            },
            p95: LatencyBlock {
                target_ms: self.config.p95_target_ms,
                stats,
                passing: p95_passing,
            },
            windows: WindowBlock {
                recommended,
                confidence,
                variant_counts: ablation
                    .per_variant
                    .iter()
                    .map(|(name, report)| (name.clone(), report.stats.count))
                    .collect(),
            },
            overall: OverallStatus {
                mrr_passing,
                p95_passing,
                all_passing: mrr_passing && p95_passing,
            },
        })
    }

    /// Render the operator status dump: a plain-text snapshot of latency
    /// monitoring, the last evaluation, the ablation verdict, and overall
    /// health.
    pub fn render_status(&self) -> EngineResult<String> {
        let report = StatusReport {
            generated_at: Utc::now(),
            window_minutes: self.config.default_window_minutes,
            alert: self.alert(self.config.default_window_minutes, None)?,
            mrr_target: self.config.mrr_target,
            last_evaluation: self.last_evaluation()?,
            ablation: self.ablation()?,
            overall: self.dashboard()?.overall,
        };
        Ok(report.to_string())
    }
}

fn validate_window(window_minutes: f64) -> EngineResult<()> {
    if !window_minutes.is_finite() || window_minutes <= 0.0 {
        return Err(EngineError::Validation(format!(
            "window_minutes must be a positive number, got {window_minutes}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use lectern_goldset::SearchError;
    use lectern_types::{GoldQuery, SearchHit};
    use std::collections::HashMap;

    /// Capability stub returning the expected target at rank 1 for every
    /// query it knows about.
    struct FixedSearch {
        answers: HashMap<String, String>,
    }

    #[async_trait]
    impl SearchCapability for FixedSearch {
        async fn search(
            &self,
            query_text: &str,
            _search_type: SearchType,
            _k: usize,
        ) -> Result<Vec<SearchHit>, SearchError> {
            Ok(self
                .answers
                .get(query_text)
                .map(|id| {
                    vec![SearchHit {
                        id: id.clone(),
                        rank: 1,
                        score: 0.95,
                        snippet: String::new(),
                    }]
                })
                .unwrap_or_default())
        }
    }

    fn engine_with(entries: &[(&str, &str)]) -> TelemetryEngine {
        let gold = GoldSet::from_queries(
            entries
                .iter()
                .map(|(q, target)| GoldQuery {
                    query_text: q.to_string(),
                    expected_target_id: target.to_string(),
                    expected_rank: None,
                })
                .collect(),
        );
        let answers = entries
            .iter()
            .map(|(q, target)| (q.to_string(), target.to_string()))
            .collect();
        TelemetryEngine::new(
            EngineConfig::default(),
            gold,
            Arc::new(FixedSearch { answers }),
        )
    }

    #[test]
    fn test_unknown_variant_rejected() {
        let engine = engine_with(&[("q", "t")]);
        assert!(matches!(
            engine.record_sample(100.0, Some("5m")),
            Err(EngineError::UnknownVariant(_))
        ));
        engine.record_sample(100.0, Some("30s")).unwrap();
        engine.record_sample(100.0, None).unwrap();
    }

    #[test]
    fn test_window_validation() {
        let engine = engine_with(&[("q", "t")]);
        assert!(matches!(
            engine.stats(0.0),
            Err(EngineError::Validation(_))
        ));
        assert!(matches!(
            engine.stats(f64::NAN),
            Err(EngineError::Validation(_))
        ));
        assert!(matches!(
            engine.trend(10.0, 0),
            Err(EngineError::Validation(_))
        ));
        assert!(matches!(
            engine.alert(10.0, Some(-5.0)),
            Err(EngineError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_evaluation_is_retained_for_dashboard() {
        let engine = engine_with(&[("q1", "t1"), ("q2", "t2")]);
        assert!(engine.last_evaluation().unwrap().is_none());

        let result = engine.run_evaluation(SearchType::Semantic, 10).await.unwrap();
        assert_eq!(result.mrr, 1.0);

        let retained = engine.last_evaluation().unwrap().unwrap();
        assert_eq!(retained.run_id, result.run_id);

        let dashboard = engine.dashboard().unwrap();
        assert_eq!(dashboard.mrr.current, Some(1.0));
        assert!(dashboard.mrr.passing);
    }

    #[tokio::test]
    async fn test_bad_search_type_rejected() {
        let engine = engine_with(&[("q", "t")]);
        assert!(matches!(
            engine.run_evaluation_raw("fuzzy", 10).await,
            Err(EngineError::Validation(_))
        ));
        assert!(matches!(
            engine.run_evaluation(SearchType::Keyword, 0).await,
            Err(EngineError::Validation(_))
        ));
    }

    #[test]
    fn test_p95_gate_requires_enough_samples() {
        let engine = engine_with(&[("q", "t")]);
        for _ in 0..3 {
            engine.record_sample(100.0, None).unwrap();
        }
        // Fast but too few samples: the gate stays closed.
        let dashboard = engine.dashboard().unwrap();
        assert!(!dashboard.p95.passing);

        engine.record_sample(110.0, None).unwrap();
        engine.record_sample(120.0, None).unwrap();
        let dashboard = engine.dashboard().unwrap();
        assert!(dashboard.p95.passing);
    }

    #[tokio::test]
    async fn test_overall_requires_both_gates() {
        let engine = engine_with(&[("q", "t")]);
        for _ in 0..6 {
            engine.record_sample(150.0, None).unwrap();
        }

        let dashboard = engine.dashboard().unwrap();
        assert!(dashboard.p95.passing);
        assert!(!dashboard.overall.all_passing);

        engine.run_evaluation(SearchType::Semantic, 10).await.unwrap();
        let dashboard = engine.dashboard().unwrap();
        assert!(dashboard.overall.all_passing);
    }

    #[test]
    fn test_dashboard_reports_variant_counts() {
        let engine = engine_with(&[("q", "t")]);
        engine.record_sample(200.0, Some("30s")).unwrap();
        engine.record_sample(210.0, Some("30s")).unwrap();
        engine.record_sample(220.0, Some("60s")).unwrap();

        let dashboard = engine.dashboard().unwrap();
        assert_eq!(dashboard.windows.variant_counts["30s"], 2);
        assert_eq!(dashboard.windows.variant_counts["60s"], 1);
    }

    #[tokio::test]
    async fn test_status_dump_sections() {
        let engine = engine_with(&[("q", "t")]);
        let status = engine.render_status().unwrap();
        assert!(status.contains("P95 LATENCY MONITORING"));
        assert!(status.contains("MRR EVALUATION"));
        assert!(status.contains("WINDOW ABLATION"));
        assert!(status.contains("OVERALL HEALTH"));
        assert!(status.contains("no evaluation run yet"));

        engine.run_evaluation(SearchType::Keyword, 10).await.unwrap();
        let status = engine.render_status().unwrap();
        assert!(status.contains("MRR: 1.000"));
    }
}
