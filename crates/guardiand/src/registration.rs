//! Capability descriptor returned to the Supervisor on registration.

use std::collections::BTreeMap;

use guardian_core::{PolicyConfig, VERSION};
use serde::{Deserialize, Serialize};

pub const AGENT_ID: &str = "cicd-guardian-001";
pub const AGENT_TYPE: &str = "CI/CD Monitoring & Policy Enforcement";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentDescriptor {
    pub agent_id: String,
    pub agent_type: String,
    pub capabilities: Vec<String>,
    pub endpoints: BTreeMap<String, String>,
    pub status: String,
    pub metadata: AgentMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentMetadata {
    pub version: String,
    pub architecture: String,
    pub policies_enforced: Vec<String>,
    pub notification_channels: Vec<String>,
    pub memory_system: Vec<String>,
    pub escalation_severity: Vec<String>,
}

/// Describe this agent as reachable at `base_url`.
pub fn describe(base_url: &str, policy: &PolicyConfig, channels: &[&str]) -> AgentDescriptor {
    let base = base_url.trim_end_matches('/');
    let endpoints = ["analyze", "metrics", "health", "register"]
        .into_iter()
        .map(|name| (name.to_string(), format!("{base}/{name}")))
        .collect();

    AgentDescriptor {
        agent_id: AGENT_ID.to_string(),
        agent_type: AGENT_TYPE.to_string(),
        capabilities: capabilities(policy),
        endpoints,
        status: "active".to_string(),
        metadata: AgentMetadata {
            version: VERSION.to_string(),
            architecture: "Supervisor-Worker".to_string(),
            policies_enforced: policies_enforced(policy),
            notification_channels: channels.iter().map(|c| c.to_string()).collect(),
            memory_system: vec!["STM (JSON)".to_string(), "LTM (SQLite)".to_string()],
            escalation_severity: vec!["critical".to_string(), "high".to_string()],
        },
    }
}

fn capabilities(policy: &PolicyConfig) -> Vec<String> {
    vec![
        "Branch protection enforcement".to_string(),
        "Pull request validation".to_string(),
        format!(
            "Test coverage monitoring (≥{}%)",
            whole(policy.test_coverage.minimum_percentage)
        ),
        "Security vulnerability detection".to_string(),
        "Build health monitoring".to_string(),
        "Slack/Email notifications".to_string(),
        "Real-time anomaly detection".to_string(),
        "Metrics and reporting".to_string(),
    ]
}

/// Human-readable summary of the live policy.
pub fn policies_enforced(policy: &PolicyConfig) -> Vec<String> {
    let bp = &policy.branch_protection;
    let mut out = Vec::new();
    if bp.require_pull_request && !bp.protected_branches.is_empty() {
        let branches: Vec<&str> = bp.protected_branches.iter().map(String::as_str).collect();
        out.push(format!("No direct push to {}", branches.join("/")));
    }
    out.push(format!(
        "Minimum {} PR approval{} required",
        bp.min_approvals,
        if bp.min_approvals == 1 { "" } else { "s" }
    ));
    out.push(format!(
        "Test coverage ≥{}%",
        whole(policy.test_coverage.minimum_percentage)
    ));
    out.push(format!(
        "Build duration threshold: {}s",
        policy.build.max_duration_seconds
    ));
    out.push("Zero vulnerabilities (CVEs)".to_string());
    out
}

fn whole(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_are_absolute() {
        let d = describe("http://guardian:8000/", &PolicyConfig::default(), &[]);
        assert_eq!(d.agent_id, "cicd-guardian-001");
        assert_eq!(d.endpoints["analyze"], "http://guardian:8000/analyze");
        assert_eq!(d.endpoints["health"], "http://guardian:8000/health");
        assert_eq!(d.status, "active");
    }

    #[test]
    fn default_policy_summary() {
        assert_eq!(
            policies_enforced(&PolicyConfig::default()),
            vec![
                "No direct push to develop/main/master",
                "Minimum 1 PR approval required",
                "Test coverage ≥80%",
                "Build duration threshold: 600s",
                "Zero vulnerabilities (CVEs)",
            ]
        );
    }

    #[test]
    fn summary_follows_live_config() {
        let mut policy = PolicyConfig::default();
        policy.branch_protection.require_pull_request = false;
        policy.branch_protection.min_approvals = 2;
        policy.test_coverage.minimum_percentage = 72.5;

        let summary = policies_enforced(&policy);
        assert_eq!(summary[0], "Minimum 2 PR approvals required");
        assert_eq!(summary[1], "Test coverage ≥72.5%");
    }

    #[test]
    fn channels_are_listed() {
        let d = describe("http://x", &PolicyConfig::default(), &["slack"]);
        assert_eq!(d.metadata.notification_channels, vec!["slack"]);
        assert_eq!(d.metadata.escalation_severity, vec!["critical", "high"]);

        let d = describe("http://x", &PolicyConfig::default(), &["slack", "email"]);
        assert_eq!(d.metadata.notification_channels, vec!["slack", "email"]);
    }

    #[test]
    fn incomplete_email_section_is_not_advertised() {
        let mut policy = PolicyConfig::default();
        policy.notifications.email_smtp = Some(guardian_core::EmailSettings {
            server: Some("smtp.example.com".into()),
            ..guardian_core::EmailSettings::default()
        });
        let notifier = guardian_notify::Notifier::from_settings(&policy.notifications);
        let d = describe("http://x", &policy, &notifier.channel_names());
        assert!(d.metadata.notification_channels.is_empty());
    }
}
