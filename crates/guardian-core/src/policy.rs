//! Policy evaluator: the rule catalogue applied to a pipeline snapshot.
//!
//! [`evaluate`] runs every [`PolicyRule`] in catalogue order and concatenates
//! the anomalies each produces. Evaluation is pure and total for a validated
//! snapshot; the same input always yields the same ordered list.

use serde::{Deserialize, Serialize};

use crate::config::PolicyConfig;
use crate::domain::{Anomaly, AnomalyKind, PipelineSnapshot, PipelineStatus, Severity};

// ---------------------------------------------------------------------------
// Rule catalogue
// ---------------------------------------------------------------------------

/// One independent check of the catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyRule {
    BuildStatus,
    Duration,
    Vulnerabilities,
    BranchProtection,
    PullRequestApproval,
    TestCoverage,
}

impl PolicyRule {
    /// Evaluation order. The output anomaly list follows it.
    pub const CATALOGUE: [PolicyRule; 6] = [
        Self::BuildStatus,
        Self::Duration,
        Self::Vulnerabilities,
        Self::BranchProtection,
        Self::PullRequestApproval,
        Self::TestCoverage,
    ];
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Evaluate every rule of the catalogue against `snapshot`.
pub fn evaluate(snapshot: &PipelineSnapshot, config: &PolicyConfig) -> Vec<Anomaly> {
    let mut anomalies = Vec::new();
    for rule in PolicyRule::CATALOGUE {
        check_rule(rule, snapshot, config, &mut anomalies);
    }
    tracing::debug!(
        pipeline_id = %snapshot.id,
        anomaly_count = anomalies.len(),
        "policy evaluation complete"
    );
    anomalies
}

fn check_rule(
    rule: PolicyRule,
    snapshot: &PipelineSnapshot,
    config: &PolicyConfig,
    out: &mut Vec<Anomaly>,
) {
    match rule {
        PolicyRule::BuildStatus => match snapshot.status {
            PipelineStatus::Success => {}
            PipelineStatus::Failed => out.push(Anomaly::new(
                AnomalyKind::BuildFailure,
                "Pipeline build failed",
                Severity::High,
            )),
            PipelineStatus::Aborted => out.push(Anomaly::new(
                AnomalyKind::BuildAborted,
                "Pipeline build was aborted before completion",
                Severity::High,
            )),
        },
        PolicyRule::Duration => {
            let max = config.build.max_duration_seconds;
            if snapshot.duration_seconds > max {
                out.push(Anomaly::new(
                    AnomalyKind::ExcessiveDuration,
                    format!(
                        "Build duration ({}s) exceeds threshold ({}s)",
                        snapshot.duration_seconds, max
                    ),
                    Severity::Medium,
                ));
            }
        }
        PolicyRule::Vulnerabilities => {
            // One anomaly per reported entry; duplicates are kept.
            out.extend(snapshot.vulnerabilities.iter().map(|vuln| {
                Anomaly::new(
                    AnomalyKind::SecurityVulnerability,
                    format!("Security vulnerability detected: {vuln}"),
                    Severity::Critical,
                )
            }));
        }
        PolicyRule::BranchProtection => {
            let bp = &config.branch_protection;
            if bp.is_protected(&snapshot.branch)
                && bp.require_pull_request
                && snapshot.is_direct_push == Some(true)
            {
                out.push(Anomaly::new(
                    AnomalyKind::BranchProtectionViolation,
                    format!(
                        "Direct push to protected branch '{}' is not allowed",
                        snapshot.branch
                    ),
                    Severity::Critical,
                ));
            }
        }
        PolicyRule::PullRequestApproval => {
            let bp = &config.branch_protection;
            if !bp.is_protected(&snapshot.branch) {
                return;
            }
            if snapshot.pr_approved == Some(false) {
                out.push(Anomaly::new(
                    AnomalyKind::PrNotApproved,
                    format!("Pull request to '{}' was not approved", snapshot.branch),
                    Severity::Critical,
                ));
            }
            if let Some(reviewers) = snapshot.pr_reviewers_count {
                if reviewers < bp.min_approvals {
                    out.push(Anomaly::new(
                        AnomalyKind::InsufficientReviewers,
                        format!(
                            "PR has {} reviewer(s), minimum {} required",
                            reviewers, bp.min_approvals
                        ),
                        Severity::High,
                    ));
                }
            }
        }
        PolicyRule::TestCoverage => {
            let min = config.test_coverage.minimum_percentage;
            if let Some(coverage) = snapshot.test_coverage_percent {
                if coverage < min {
                    out.push(Anomaly::new(
                        AnomalyKind::InsufficientTestCoverage,
                        format!(
                            "Test coverage ({}%) is below minimum ({}%)",
                            format_percent(coverage),
                            format_percent(min)
                        ),
                        Severity::Critical,
                    ));
                }
            }
        }
    }
}

/// Render a percentage with at least one decimal (`65` → `65.0`, `72.5` → `72.5`).
fn format_percent(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}
