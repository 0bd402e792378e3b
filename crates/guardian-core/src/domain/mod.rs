//! Domain models for CI/CD Guardian.
//!
//! Canonical definitions for the core entities:
//! - `PipelineSnapshot`: Immutable report of one pipeline run
//! - `Anomaly`: A single detected policy violation
//! - `Severity` / `OverallSeverity`: Per-anomaly and rolled-up severity scales

pub mod anomaly;
pub mod error;
pub mod snapshot;
pub mod validation;

// Re-export main types and errors
pub use anomaly::{Anomaly, AnomalyKind, OverallSeverity, Severity};
pub use error::{ConfigError, ValidationError};
pub use snapshot::{short_sha, PipelineSnapshot, PipelineStatus};
pub use validation::validate_snapshot;
