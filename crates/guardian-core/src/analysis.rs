//! The stateless analysis pipeline: evaluate → roll up → recommend.

use serde::{Deserialize, Serialize};

use crate::config::PolicyConfig;
use crate::domain::{Anomaly, OverallSeverity, PipelineSnapshot};
use crate::policy::evaluate;
use crate::recommendation::recommend;
use crate::severity::aggregate;

/// Outcome of analysing one pipeline snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Analysis {
    pub anomalies: Vec<Anomaly>,
    pub severity: OverallSeverity,
    pub recommendation: String,
    /// True when the Supervisor should be alerted (high or critical).
    pub escalate: bool,
}

/// Run the full decision pipeline for `snapshot`.
///
/// Never touches shared state; safe to call concurrently.
pub fn analyze(snapshot: &PipelineSnapshot, config: &PolicyConfig) -> Analysis {
    let anomalies = evaluate(snapshot, config);
    let severity = aggregate(&anomalies);
    let recommendation = recommend(&anomalies, severity);

    Analysis {
        escalate: severity.requires_escalation(),
        anomalies,
        severity,
        recommendation,
    }
}
