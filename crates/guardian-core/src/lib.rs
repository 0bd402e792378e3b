//! CI/CD Guardian Core
//!
//! The decision logic of the Guardian agent:
//! - `policy`: the rule catalogue evaluated against a pipeline snapshot
//! - `severity`: rollup of an anomaly list into one overall severity
//! - `recommendation`: stable remediation text for humans and channels
//! - `analysis`: the three steps above as a single pure pipeline
//!
//! Everything here is stateless. Persistence lives in `guardian-state`,
//! alert delivery in `guardian-notify`.

pub mod analysis;
pub mod config;
pub mod domain;
pub mod metrics;
pub mod obs;
pub mod policy;
pub mod recommendation;
pub mod severity;
pub mod telemetry;

pub use analysis::{analyze, Analysis};
pub use config::{
    BranchProtection, BuildHealth, EmailSettings, LoadedPolicy, NotificationSettings,
    PolicyConfig, PolicySource, TestCoverage,
};
pub use domain::{
    short_sha, validate_snapshot, Anomaly, AnomalyKind, ConfigError, OverallSeverity,
    PipelineSnapshot, PipelineStatus, Severity, ValidationError,
};
pub use metrics::COUNTERS;
pub use obs::{
    emit_analysis_completed, emit_analysis_started, emit_config_fallback,
    emit_notification_dispatched, emit_persist_failed, AnalysisSpan,
};
pub use policy::{evaluate, PolicyRule};
pub use recommendation::{recommend, Remediation};
pub use severity::aggregate;
pub use telemetry::init_tracing;

/// Guardian version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
