//! Error types for guardian-state

use rusqlite::ErrorCode;
use thiserror::Error;

/// Errors that can occur in the persistence layer
#[derive(Error, Debug)]
pub enum StateError {
    /// Database could not be opened
    #[error("Database connection failed: {0}")]
    Connection(String),

    /// Database query error
    #[error("Database query failed: {0}")]
    Query(String),

    /// Backing file is not a valid database or is damaged
    #[error("Database corrupted: {0}")]
    Corrupted(String),

    /// Store gave up after a failed recovery
    #[error("Incident store unavailable: {0}")]
    Unavailable(String),

    /// Serialization error
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// Deserialization error
    #[error("Deserialization failed: {0}")]
    Deserialization(String),

    /// Schema setup error
    #[error("Schema setup failed: {0}")]
    SchemaSetup(String),

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for persistence operations
pub type StateResult<T> = std::result::Result<T, StateError>;

impl StateError {
    /// Structural damage that warrants discarding the backing file.
    pub fn is_corruption(&self) -> bool {
        matches!(self, StateError::Corrupted(_))
    }
}

impl From<rusqlite::Error> for StateError {
    fn from(err: rusqlite::Error) -> Self {
        match err.sqlite_error_code() {
            Some(ErrorCode::NotADatabase) | Some(ErrorCode::DatabaseCorrupt) => {
                StateError::Corrupted(err.to_string())
            }
            Some(ErrorCode::CannotOpen) => StateError::Connection(err.to_string()),
            _ => StateError::Query(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for StateError {
    fn from(err: serde_json::Error) -> Self {
        StateError::Serialization(err.to_string())
    }
}
