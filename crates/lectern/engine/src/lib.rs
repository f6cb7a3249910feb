//! Lectern Engine - validated operation facade and composite dashboard
//!
//! Ties the sample log, the alert evaluator, the gold-set evaluator, and
//! the ablation analyzer behind one explicitly constructed
//! [`TelemetryEngine`] handle. The facade validates all caller input,
//! retains the most recent evaluation run, assembles the composite
//! dashboard with pass/fail gates (MRR >= 0.70, p95 <= 2000 ms), and
//! renders the plain-text operator status dump.

#![deny(unsafe_code)]

pub mod config;
pub mod dashboard;
pub mod engine;
pub mod error;
pub mod status;

pub use config::{EngineConfig, DEFAULT_MRR_TARGET};
pub use dashboard::{DashboardSnapshot, LatencyBlock, MrrBlock, OverallStatus, WindowBlock};
pub use engine::TelemetryEngine;
pub use error::{EngineError, EngineResult};
pub use status::StatusReport;
