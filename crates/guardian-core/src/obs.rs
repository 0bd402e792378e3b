//! Structured observability hooks for the analysis lifecycle.
//!
//! This module provides:
//! - An analysis-scoped tracing span via the `AnalysisSpan` RAII guard
//! - Emission functions for key lifecycle events: start, completion,
//!   persistence failure, notification dispatch and config fallback
//!
//! Filtering follows `GUARDIAN_LOG` (see [`crate::telemetry`]).

use std::path::Path;

use tracing::{info, warn};

use crate::domain::OverallSeverity;

/// RAII guard that enters a pipeline-scoped span for the duration of an analysis.
///
/// ```ignore
/// let _span = AnalysisSpan::enter("build-12345");
/// // every event below carries pipeline_id = "build-12345"
/// ```
pub struct AnalysisSpan {
    _span: tracing::span::EnteredSpan,
}

impl AnalysisSpan {
    pub fn enter(pipeline_id: &str) -> Self {
        let span = tracing::info_span!("guardian.analysis", pipeline_id = %pipeline_id);
        Self {
            _span: span.entered(),
        }
    }
}

/// Emit event: analysis started for a branch/commit.
pub fn emit_analysis_started(pipeline_id: &str, branch: &str, commit: &str) {
    info!(
        event = "analysis.started",
        pipeline_id = %pipeline_id,
        branch = %branch,
        commit = %commit,
    );
}

/// Emit event: analysis finished with its rolled-up severity.
pub fn emit_analysis_completed(
    pipeline_id: &str,
    severity: OverallSeverity,
    anomaly_count: usize,
    escalate: bool,
) {
    info!(
        event = "analysis.completed",
        pipeline_id = %pipeline_id,
        severity = %severity,
        anomaly_count = anomaly_count,
        escalate = escalate,
    );
}

/// Emit event: the incident or run-state could not be persisted (warning level).
pub fn emit_persist_failed(pipeline_id: &str, tier: &str, error: &dyn std::fmt::Display) {
    warn!(
        event = "incident.persist_failed",
        pipeline_id = %pipeline_id,
        tier = %tier,
        error = %error,
    );
}

/// Emit event: notification fan-out finished.
pub fn emit_notification_dispatched(pipeline_id: &str, delivered: usize, attempted: usize) {
    info!(
        event = "notification.dispatched",
        pipeline_id = %pipeline_id,
        delivered = delivered,
        attempted = attempted,
    );
}

/// Emit event: the rules file was unusable and built-in defaults were applied.
pub fn emit_config_fallback(path: &Path, error: &dyn std::fmt::Display) {
    warn!(
        event = "config.fallback",
        path = %path.display(),
        error = %error,
        "using built-in policy defaults"
    );
}
