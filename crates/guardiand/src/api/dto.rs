//! Request and response bodies for the HTTP API.

use chrono::{DateTime, Utc};
use guardian_core::{
    validate_snapshot, Anomaly, OverallSeverity, PipelineSnapshot, PipelineStatus,
    ValidationError,
};
use guardian_state::MemoryHealth;
use serde::{Deserialize, Serialize};

use crate::context::AnalysisOutcome;

/// Body of `POST /analyze`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    pub pipeline_id: String,
    /// Parsed case-insensitively; unknown values are rejected with 422.
    pub status: String,
    pub duration_seconds: u64,
    /// Build output. Accepted for the record, not evaluated.
    #[serde(default)]
    pub logs: Option<String>,
    #[serde(default)]
    pub vulnerabilities: Vec<String>,
    pub branch: String,
    pub commit_sha: String,
    #[serde(default)]
    pub test_coverage_percent: Option<f64>,
    #[serde(default)]
    pub is_direct_push: Option<bool>,
    #[serde(default)]
    pub pr_approved: Option<bool>,
    #[serde(default)]
    pub pr_reviewers_count: Option<u32>,
}

impl TryFrom<AnalyzeRequest> for PipelineSnapshot {
    type Error = ValidationError;

    fn try_from(req: AnalyzeRequest) -> Result<Self, Self::Error> {
        let status: PipelineStatus = req.status.parse()?;
        let snapshot = PipelineSnapshot {
            id: req.pipeline_id,
            status,
            duration_seconds: req.duration_seconds,
            vulnerabilities: req.vulnerabilities,
            branch: req.branch,
            commit_sha: req.commit_sha,
            test_coverage_percent: req.test_coverage_percent,
            is_direct_push: req.is_direct_push,
            pr_approved: req.pr_approved,
            pr_reviewers_count: req.pr_reviewers_count,
        };
        validate_snapshot(&snapshot)?;
        Ok(snapshot)
    }
}

/// Body returned by `POST /analyze`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub pipeline_id: String,
    pub status: PipelineStatus,
    pub anomalies: Vec<Anomaly>,
    pub severity: OverallSeverity,
    pub recommendation: String,
    pub timestamp: DateTime<Utc>,
    pub escalate_to_supervisor: bool,
}

impl From<AnalysisOutcome> for AnalyzeResponse {
    fn from(outcome: AnalysisOutcome) -> Self {
        Self {
            pipeline_id: outcome.snapshot.id,
            status: outcome.snapshot.status,
            anomalies: outcome.analysis.anomalies,
            severity: outcome.analysis.severity,
            recommendation: outcome.analysis.recommendation,
            timestamp: outcome.timestamp,
            escalate_to_supervisor: outcome.analysis.escalate,
        }
    }
}

/// Body returned by `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub memory_status: MemoryHealth,
    pub config_loaded: bool,
    pub config_source: String,
    pub uptime_seconds: f64,
}
