//! Policy configuration and its loader.
//!
//! The configuration is loaded once at startup from a YAML rules file and is
//! read-only afterwards. A missing, empty or malformed file never prevents
//! startup: [`PolicyConfig::load`] substitutes the built-in defaults and
//! reports why through [`PolicySource::Defaults`].

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::{ConfigError, Severity};
use crate::obs::emit_config_fallback;

/// Builds longer than this (seconds) are flagged unless overridden.
pub const DEFAULT_MAX_DURATION_SECONDS: u64 = 600;

/// Minimum test coverage (percent) unless overridden.
pub const DEFAULT_MIN_COVERAGE_PERCENT: f64 = 80.0;

/// Branch protection rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BranchProtection {
    pub protected_branches: BTreeSet<String>,
    pub require_pull_request: bool,
    pub min_approvals: u32,
}

impl Default for BranchProtection {
    fn default() -> Self {
        Self {
            protected_branches: ["main", "master", "develop"]
                .into_iter()
                .map(String::from)
                .collect(),
            require_pull_request: true,
            min_approvals: 1,
        }
    }
}

impl BranchProtection {
    pub fn is_protected(&self, branch: &str) -> bool {
        self.protected_branches.contains(branch)
    }
}

/// Test coverage requirement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TestCoverage {
    pub minimum_percentage: f64,
}

impl Default for TestCoverage {
    fn default() -> Self {
        Self {
            minimum_percentage: DEFAULT_MIN_COVERAGE_PERCENT,
        }
    }
}

/// Build health thresholds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildHealth {
    pub max_duration_seconds: u64,
}

impl Default for BuildHealth {
    fn default() -> Self {
        Self {
            max_duration_seconds: DEFAULT_MAX_DURATION_SECONDS,
        }
    }
}

/// Submission port used when the email section names none.
pub const DEFAULT_SMTP_PORT: u16 = 587;

/// SMTP relay for email alerts. The channel stays off until every field is set.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailSettings {
    pub server: Option<String>,
    pub port: u16,
    pub username: Option<String>,
    /// Never written back out by [`PolicyConfig::to_yaml`].
    #[serde(skip_serializing)]
    pub password: Option<String>,
    pub from_email: Option<String>,
    pub to_emails: Vec<String>,
}

impl Default for EmailSettings {
    fn default() -> Self {
        Self {
            server: None,
            port: DEFAULT_SMTP_PORT,
            username: None,
            password: None,
            from_email: None,
            to_emails: Vec::new(),
        }
    }
}

impl EmailSettings {
    /// Names of the required fields that are absent or blank.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let blank = |v: &Option<String>| v.as_deref().map_or(true, |s| s.trim().is_empty());
        let mut missing = Vec::new();
        if blank(&self.server) {
            missing.push("server");
        }
        if blank(&self.username) {
            missing.push("username");
        }
        if blank(&self.password) {
            missing.push("password");
        }
        if blank(&self.from_email) {
            missing.push("from_email");
        }
        if self.to_emails.iter().all(|to| to.trim().is_empty()) {
            missing.push("to_emails");
        }
        missing
    }

    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }
}

impl fmt::Debug for EmailSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmailSettings")
            .field("server", &self.server)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("from_email", &self.from_email)
            .field("to_emails", &self.to_emails)
            .finish()
    }
}

/// Alerting thresholds and channel endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationSettings {
    /// Incoming-webhook URL for Slack. Absent disables the channel.
    pub slack_webhook: Option<String>,
    /// SMTP relay for email alerts. Absent disables the channel.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_smtp: Option<EmailSettings>,
    /// Overall severities that trigger alerting.
    pub alert_on: BTreeSet<Severity>,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            slack_webhook: None,
            email_smtp: None,
            alert_on: [Severity::Critical, Severity::High].into_iter().collect(),
        }
    }
}

/// Complete policy configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    pub branch_protection: BranchProtection,
    pub test_coverage: TestCoverage,
    pub build: BuildHealth,
    pub notifications: NotificationSettings,
}

/// Where the active policy came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicySource {
    File(PathBuf),
    Defaults { reason: String },
}

impl PolicySource {
    pub fn is_file(&self) -> bool {
        matches!(self, Self::File(_))
    }
}

impl fmt::Display for PolicySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "file:{}", path.display()),
            Self::Defaults { .. } => f.write_str("defaults"),
        }
    }
}

/// A policy paired with its provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedPolicy {
    pub config: PolicyConfig,
    pub source: PolicySource,
}

impl PolicyConfig {
    /// Parse a YAML document. Keys missing from the document keep their defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Read and parse a YAML rules file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Load the rules file, falling back to built-in defaults on any failure.
    pub fn load(path: &Path) -> LoadedPolicy {
        match Self::from_file(path) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "policy configuration loaded");
                LoadedPolicy {
                    config,
                    source: PolicySource::File(path.to_path_buf()),
                }
            }
            Err(err) => {
                emit_config_fallback(path, &err);
                LoadedPolicy {
                    config: Self::default(),
                    source: PolicySource::Defaults {
                        reason: err.to_string(),
                    },
                }
            }
        }
    }

    /// Render as YAML.
    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }
}
