//! Guardian State: persistence for CI/CD Guardian
//!
//! Two tiers sit behind the [`MemoryManager`]:
//!
//! - **Short-term** (`memory.json`): last pipeline, counters and agent status,
//!   rewritten atomically after each analysis.
//! - **Long-term** (`memory.db`): an append-only SQLite incident log that
//!   rebuilds itself when the file is found corrupted.
//!
//! Neither tier ever fails an analysis. Errors are logged and surfaced as
//! booleans, empty metrics or a `corrupted` health status.

mod error;
mod health;
mod incident;
mod incidents;
mod memory;
mod run_state;
mod schema;

pub use error::{StateError, StateResult};
pub use health::{MemoryHealth, TierStatus};
pub use incident::{AnomalyFrequency, Incident, IncidentMetrics};
pub use incidents::{
    rank_anomaly_types, IncidentStore, BUSY_TIMEOUT, RECENT_WINDOW, TOP_ANOMALY_LIMIT,
};
pub use memory::{MemoryManager, INCIDENT_DB_FILE, RUN_STATE_FILE};
pub use run_state::{AgentStatus, RunStatePhase, ShortTermState, ShortTermStore};
pub use schema::{init_schema, SCHEMA_VERSION};
