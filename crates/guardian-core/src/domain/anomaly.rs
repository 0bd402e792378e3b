//! Anomaly value objects and the severity scales used to rank them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Severity of a single anomaly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub const ALL: [Severity; 4] = [Self::Critical, Self::High, Self::Medium, Self::Low];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rolled-up severity of a whole analysis. `None` means a clean run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallSeverity {
    None,
    Low,
    Medium,
    High,
    Critical,
}

impl OverallSeverity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    /// Anomaly-level severity, or `None` for a clean run.
    pub fn as_severity(self) -> Option<Severity> {
        match self {
            Self::None => None,
            Self::Low => Some(Severity::Low),
            Self::Medium => Some(Severity::Medium),
            Self::High => Some(Severity::High),
            Self::Critical => Some(Severity::Critical),
        }
    }

    /// High and critical outcomes are escalated to the Supervisor.
    pub fn requires_escalation(self) -> bool {
        matches!(self, Self::High | Self::Critical)
    }
}

impl From<Severity> for OverallSeverity {
    fn from(s: Severity) -> Self {
        match s {
            Severity::Low => Self::Low,
            Severity::Medium => Self::Medium,
            Severity::High => Self::High,
            Severity::Critical => Self::Critical,
        }
    }
}

impl fmt::Display for OverallSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OverallSeverity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            other => Err(format!("unknown severity: {other}")),
        }
    }
}

/// Closed catalogue of policy violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    BuildFailure,
    BuildAborted,
    ExcessiveDuration,
    SecurityVulnerability,
    BranchProtectionViolation,
    PrNotApproved,
    InsufficientReviewers,
    InsufficientTestCoverage,
}

impl AnomalyKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BuildFailure => "build_failure",
            Self::BuildAborted => "build_aborted",
            Self::ExcessiveDuration => "excessive_duration",
            Self::SecurityVulnerability => "security_vulnerability",
            Self::BranchProtectionViolation => "branch_protection_violation",
            Self::PrNotApproved => "pr_not_approved",
            Self::InsufficientReviewers => "insufficient_reviewers",
            Self::InsufficientTestCoverage => "insufficient_test_coverage",
        }
    }
}

impl fmt::Display for AnomalyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single detected policy violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Anomaly {
    #[serde(rename = "type")]
    pub kind: AnomalyKind,
    pub description: String,
    pub severity: Severity,
}

impl Anomaly {
    pub fn new(kind: AnomalyKind, description: impl Into<String>, severity: Severity) -> Self {
        Self {
            kind,
            description: description.into(),
            severity,
        }
    }
}
