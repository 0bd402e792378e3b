//! Human-readable remediation guidance.
//!
//! The wording produced here is consumed verbatim by notification channels
//! and API clients, so it is kept stable across releases.

use std::collections::BTreeSet;

use crate::domain::{Anomaly, AnomalyKind, OverallSeverity};

pub const NO_ACTION_REQUIRED: &str = "Pipeline passed all checks. No action required.";
pub const URGENT_PREAMBLE: &str = "🚨 URGENT: Block merge until issues resolved.";
pub const ACTIONS_HEADER: &str = "\nRecommended Actions:";

/// Canned remediation steps. Variant order is output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Remediation {
    PatchDependencies,
    RevertDirectPush,
    AddTests,
    ObtainApprovals,
    FixBuild,
    OptimizePipeline,
}

impl Remediation {
    /// Remediation for an anomaly kind. Aborted builds have none.
    pub fn for_kind(kind: AnomalyKind) -> Option<Self> {
        match kind {
            AnomalyKind::SecurityVulnerability => Some(Self::PatchDependencies),
            AnomalyKind::BranchProtectionViolation => Some(Self::RevertDirectPush),
            AnomalyKind::InsufficientTestCoverage => Some(Self::AddTests),
            AnomalyKind::PrNotApproved | AnomalyKind::InsufficientReviewers => {
                Some(Self::ObtainApprovals)
            }
            AnomalyKind::BuildFailure => Some(Self::FixBuild),
            AnomalyKind::ExcessiveDuration => Some(Self::OptimizePipeline),
            AnomalyKind::BuildAborted => None,
        }
    }

    pub fn bullet(self) -> &'static str {
        match self {
            Self::PatchDependencies => "• Update dependencies to patch security vulnerabilities",
            Self::RevertDirectPush => "• Revert direct push and create a pull request instead",
            Self::AddTests => "• Add more unit tests to meet coverage requirements",
            Self::ObtainApprovals => "• Obtain required PR approvals before merging",
            Self::FixBuild => "• Fix failing tests and build errors",
            Self::OptimizePipeline => "• Optimize build pipeline to reduce execution time",
        }
    }
}

/// Build the recommendation text for an analysis.
pub fn recommend(anomalies: &[Anomaly], severity: OverallSeverity) -> String {
    if anomalies.is_empty() {
        return NO_ACTION_REQUIRED.to_string();
    }

    let mut lines: Vec<String> = Vec::with_capacity(anomalies.len() + 8);

    if severity == OverallSeverity::Critical {
        lines.push(URGENT_PREAMBLE.to_string());
    }

    lines.extend(anomalies.iter().map(|a| format!("- {}", a.description)));
    lines.push(ACTIONS_HEADER.to_string());

    let remediations: BTreeSet<Remediation> = anomalies
        .iter()
        .filter_map(|a| Remediation::for_kind(a.kind))
        .collect();
    lines.extend(remediations.into_iter().map(|r| r.bullet().to_string()));

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Severity;

    #[test]
    fn clean_run_needs_no_action() {
        assert_eq!(recommend(&[], OverallSeverity::None), NO_ACTION_REQUIRED);
    }

    #[test]
    fn critical_adds_preamble_and_dedupes_actions() {
        let anomalies = vec![
            Anomaly::new(AnomalyKind::BuildFailure, "Pipeline build failed", Severity::High),
            Anomaly::new(
                AnomalyKind::SecurityVulnerability,
                "Security vulnerability detected: CVE-A",
                Severity::Critical,
            ),
            Anomaly::new(
                AnomalyKind::SecurityVulnerability,
                "Security vulnerability detected: CVE-B",
                Severity::Critical,
            ),
            Anomaly::new(
                AnomalyKind::PrNotApproved,
                "Pull request to 'main' was not approved",
                Severity::Critical,
            ),
            Anomaly::new(
                AnomalyKind::InsufficientReviewers,
                "PR has 0 reviewer(s), minimum 1 required",
                Severity::High,
            ),
        ];

        let text = recommend(&anomalies, OverallSeverity::Critical);
        let expected = "🚨 URGENT: Block merge until issues resolved.\n\
- Pipeline build failed\n\
- Security vulnerability detected: CVE-A\n\
- Security vulnerability detected: CVE-B\n\
- Pull request to 'main' was not approved\n\
- PR has 0 reviewer(s), minimum 1 required\n\
\n\
Recommended Actions:\n\
• Update dependencies to patch security vulnerabilities\n\
• Obtain required PR approvals before merging\n\
• Fix failing tests and build errors";
        assert_eq!(text, expected);
    }

    #[test]
    fn non_critical_has_no_preamble() {
        let anomalies = vec![Anomaly::new(
            AnomalyKind::ExcessiveDuration,
            "Build duration (700s) exceeds threshold (600s)",
            Severity::Medium,
        )];
        let text = recommend(&anomalies, OverallSeverity::Medium);
        assert_eq!(
            text,
            "- Build duration (700s) exceeds threshold (600s)\n\n\
Recommended Actions:\n\
• Optimize build pipeline to reduce execution time"
        );
    }

    #[test]
    fn aborted_build_lists_description_without_action() {
        let anomalies = vec![Anomaly::new(
            AnomalyKind::BuildAborted,
            "Pipeline build was aborted before completion",
            Severity::High,
        )];
        let text = recommend(&anomalies, OverallSeverity::High);
        assert!(text.ends_with("Recommended Actions:"));
        assert!(text.starts_with("- Pipeline build was aborted"));
    }

    #[test]
    fn remediation_order_is_fixed() {
        assert!(Remediation::PatchDependencies < Remediation::RevertDirectPush);
        assert!(Remediation::RevertDirectPush < Remediation::AddTests);
        assert!(Remediation::AddTests < Remediation::ObtainApprovals);
        assert!(Remediation::ObtainApprovals < Remediation::FixBuild);
        assert!(Remediation::FixBuild < Remediation::OptimizePipeline);
    }
}
