//! SQLite schema for the durable incident log.

use rusqlite::Connection;

use crate::error::{StateError, StateResult};

/// Bumped whenever the DDL below changes shape.
pub const SCHEMA_VERSION: i32 = 1;

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS incidents (
    id               INTEGER PRIMARY KEY AUTOINCREMENT,
    pipeline_id      TEXT    NOT NULL,
    timestamp        TEXT    NOT NULL,
    status           TEXT    NOT NULL,
    severity         TEXT    NOT NULL,
    duration_seconds INTEGER NOT NULL,
    branch           TEXT    NOT NULL,
    commit_sha       TEXT    NOT NULL,
    anomaly_count    INTEGER NOT NULL,
    anomalies        TEXT    NOT NULL,
    recommendation   TEXT    NOT NULL,
    escalated        INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_incidents_pipeline  ON incidents(pipeline_id);
CREATE INDEX IF NOT EXISTS idx_incidents_severity  ON incidents(severity);
CREATE INDEX IF NOT EXISTS idx_incidents_timestamp ON incidents(timestamp);
"#;

/// Create tables and indexes if absent. Idempotent.
pub fn init_schema(conn: &Connection) -> StateResult<()> {
    conn.execute_batch(SCHEMA_SQL).map_err(|e| match StateError::from(e) {
        corrupted @ StateError::Corrupted(_) => corrupted,
        other => StateError::SchemaSetup(other.to_string()),
    })?;

    let version: i32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    if version < SCHEMA_VERSION {
        conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    }
    Ok(())
}
