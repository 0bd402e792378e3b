use guardian_core::{Analysis, Anomaly, OverallSeverity, PipelineSnapshot};
use serde::{Deserialize, Serialize};

/// Everything a channel needs to describe one incident.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub pipeline_id: String,
    pub severity: OverallSeverity,
    pub anomalies: Vec<Anomaly>,
    pub recommendation: String,
    pub branch: String,
    pub commit_sha: String,
}

impl Alert {
    pub fn from_analysis(snapshot: &PipelineSnapshot, analysis: &Analysis) -> Self {
        Self {
            pipeline_id: snapshot.id.clone(),
            severity: analysis.severity,
            anomalies: analysis.anomalies.clone(),
            recommendation: analysis.recommendation.clone(),
            branch: snapshot.branch.clone(),
            commit_sha: snapshot.commit_sha.clone(),
        }
    }
}
