//! Pipeline run snapshot: the single input to a policy analysis.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use super::error::ValidationError;

/// Terminal status reported by the CI system for a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStatus {
    Success,
    Failed,
    Aborted,
}

impl PipelineStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Aborted => "aborted",
        }
    }
}

impl fmt::Display for PipelineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PipelineStatus {
    type Err = ValidationError;

    /// Case-insensitive; surrounding whitespace is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "success" => Ok(Self::Success),
            "failed" => Ok(Self::Failed),
            "aborted" => Ok(Self::Aborted),
            _ => Err(ValidationError::UnknownStatus {
                status: s.to_string(),
            }),
        }
    }
}

impl<'de> Deserialize<'de> for PipelineStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Immutable report of one pipeline run.
///
/// Optional fields mean "unknown" and never produce a violation on their own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineSnapshot {
    /// Caller-supplied pipeline identifier.
    pub id: String,
    pub status: PipelineStatus,
    pub duration_seconds: u64,
    /// Vulnerability identifiers (usually CVE ids), in reported order.
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

impl PipelineSnapshot {
    /// Minimal snapshot with every optional field unset.
    pub fn new(
        id: impl Into<String>,
        status: PipelineStatus,
        duration_seconds: u64,
        branch: impl Into<String>,
        commit_sha: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            status,
            duration_seconds,
            vulnerabilities: Vec::new(),
            branch: branch.into(),
            commit_sha: commit_sha.into(),
            test_coverage_percent: None,
            is_direct_push: None,
            pr_approved: None,
            pr_reviewers_count: None,
        }
    }

    /// Commit SHA truncated to 8 characters for display.
    pub fn short_sha(&self) -> &str {
        short_sha(&self.commit_sha)
    }
}

/// Truncate a commit SHA to at most 8 characters, respecting char boundaries.
pub fn short_sha(sha: &str) -> &str {
    match sha.char_indices().nth(8) {
        Some((idx, _)) => &sha[..idx],
        None => sha,
    }
}
