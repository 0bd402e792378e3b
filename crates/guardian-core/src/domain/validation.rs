//! Input-contract validation for pipeline snapshots.
//!
//! Runs at the service boundary, before a snapshot reaches the evaluator.
//! Violations are rejected outright and never surface as anomalies.

use super::error::ValidationError;
use super::snapshot::PipelineSnapshot;

/// Validate a `PipelineSnapshot`.
///
/// Checks:
/// 1. `id` is non-empty.
/// 2. `branch` is non-empty.
/// 3. `test_coverage_percent`, when present, is a number in `0..=100`.
///
/// Status and non-negative integer fields are already enforced by their types.
pub fn validate_snapshot(snapshot: &PipelineSnapshot) -> Result<(), ValidationError> {
    if snapshot.id.trim().is_empty() {
        return Err(ValidationError::EmptyPipelineId);
    }

    if snapshot.branch.trim().is_empty() {
        return Err(ValidationError::EmptyBranch);
    }

    if let Some(value) = snapshot.test_coverage_percent {
        if !(0.0..=100.0).contains(&value) {
            return Err(ValidationError::CoverageOutOfRange { value });
        }
    }

    Ok(())
}
