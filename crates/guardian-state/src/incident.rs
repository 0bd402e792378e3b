//! Incident records and the metrics derived from them.

use chrono::{DateTime, SecondsFormat, Utc};
use guardian_core::{Analysis, Anomaly, OverallSeverity, PipelineSnapshot, PipelineStatus};
use serde::{Deserialize, Serialize};

/// One analysed pipeline run, as appended to the incident log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    pub pipeline_id: String,
    pub timestamp: DateTime<Utc>,
    pub status: PipelineStatus,
    pub severity: OverallSeverity,
    pub duration_seconds: u64,
    pub branch: String,
    pub commit_sha: String,
    pub anomalies: Vec<Anomaly>,
    pub recommendation: String,
    pub escalated: bool,
}

impl Incident {
    /// Build the record for `snapshot` from its analysis, stamped now.
    pub fn from_analysis(snapshot: &PipelineSnapshot, analysis: &Analysis) -> Self {
        Self {
            pipeline_id: snapshot.id.clone(),
            timestamp: Utc::now(),
            status: snapshot.status,
            severity: analysis.severity,
            duration_seconds: snapshot.duration_seconds,
            branch: snapshot.branch.clone(),
            commit_sha: snapshot.commit_sha.clone(),
            anomalies: analysis.anomalies.clone(),
            recommendation: analysis.recommendation.clone(),
            escalated: analysis.escalate,
        }
    }

    pub fn anomaly_count(&self) -> usize {
        self.anomalies.len()
    }

    /// Fixed-width UTC form so text ordering matches time ordering.
    pub(crate) fn timestamp_text(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
    }
}

/// Occurrences of one anomaly type in the recent window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnomalyFrequency {
    #[serde(rename = "type")]
    pub kind: String,
    pub count: u64,
}

/// Aggregate view over the incident log plus the run-state timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentMetrics {
    pub total_pipelines_analyzed: u64,
    pub critical_incidents: u64,
    #[serde(rename = "high_severity_incidents")]
    pub high_incidents: u64,
    #[serde(rename = "medium_severity_incidents")]
    pub medium_incidents: u64,
    #[serde(rename = "low_severity_incidents")]
    pub low_incidents: u64,
    pub success_rate_percent: f64,
    pub average_duration_seconds: f64,
    pub last_analysis_timestamp: Option<DateTime<Utc>>,
    pub top_anomalies: Vec<AnomalyFrequency>,
}

impl Default for IncidentMetrics {
    fn default() -> Self {
        Self {
            total_pipelines_analyzed: 0,
            critical_incidents: 0,
            high_incidents: 0,
            medium_incidents: 0,
            low_incidents: 0,
            success_rate_percent: 100.0,
            average_duration_seconds: 0.0,
            last_analysis_timestamp: None,
            top_anomalies: Vec::new(),
        }
    }
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
