//! Domain-level error taxonomy for CI/CD Guardian.

/// Errors produced while validating an inbound pipeline snapshot.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("pipeline id must not be empty")]
    EmptyPipelineId,

    #[error("branch must not be empty")]
    EmptyBranch,

    #[error("unknown pipeline status: {status} (expected success, failed or aborted)")]
    UnknownStatus { status: String },

    #[error("test coverage {value} is outside 0..=100")]
    CoverageOutOfRange { value: f64 },
}

/// Errors raised while reading a policy configuration source.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    NotFound(String),

    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
}
