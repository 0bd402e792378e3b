//! Memory Manager: the two storage tiers behind one facade.
//!
//! Writers to each tier are serialized by that tier's own mutex, so a slow
//! incident insert never blocks a run-state update. Every method degrades to
//! a logged failure instead of returning an error.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use guardian_core::OverallSeverity;
use tracing::{error, warn};

use crate::health::MemoryHealth;
use crate::incident::{Incident, IncidentMetrics};
use crate::incidents::IncidentStore;
use crate::run_state::{AgentStatus, ShortTermState, ShortTermStore};

/// File name of the short-term tier inside a state directory.
pub const RUN_STATE_FILE: &str = "memory.json";

/// File name of the incident log inside a state directory.
pub const INCIDENT_DB_FILE: &str = "memory.db";

pub struct MemoryManager {
    run_state: Mutex<ShortTermStore>,
    incidents: Mutex<IncidentStore>,
}

impl MemoryManager {
    pub fn open(run_state_path: impl Into<PathBuf>, incident_db_path: impl Into<PathBuf>) -> Self {
        Self {
            run_state: Mutex::new(ShortTermStore::load(run_state_path)),
            incidents: Mutex::new(IncidentStore::open(incident_db_path)),
        }
    }

    /// Both tiers under `dir`, using the standard file names.
    pub fn in_dir(dir: &Path) -> Self {
        Self::open(dir.join(RUN_STATE_FILE), dir.join(INCIDENT_DB_FILE))
    }

    /// Append to the incident log. Returns false if the incident was lost.
    pub fn record_incident(&self, incident: &Incident) -> bool {
        match lock(&self.incidents).append(incident) {
            Ok(_) => true,
            Err(e) => {
                error!(pipeline_id = %incident.pipeline_id, error = %e, "failed to record incident");
                false
            }
        }
    }

    /// Advance the run-state counters for one completed analysis.
    pub fn update_run_state(&self, pipeline_id: &str, severity: OverallSeverity) {
        let status = if lock(&self.incidents).is_available() {
            AgentStatus::Active
        } else {
            AgentStatus::Degraded
        };
        if let Err(e) = lock(&self.run_state).record_analysis(pipeline_id, severity, status) {
            warn!(pipeline_id, error = %e, "failed to persist run state");
        }
    }

    /// Metrics over the incident log. Falls back to empty metrics when the
    /// log cannot be read.
    pub fn compute_metrics(&self) -> IncidentMetrics {
        let mut metrics = match lock(&self.incidents).compute_metrics() {
            Ok(m) => m,
            Err(e) => {
                error!(error = %e, "failed to compute incident metrics");
                IncidentMetrics::default()
            }
        };
        metrics.last_analysis_timestamp = lock(&self.run_state).state().last_analyzed_at;
        metrics
    }

    pub fn run_state(&self) -> ShortTermState {
        lock(&self.run_state).state().clone()
    }

    pub fn health(&self) -> MemoryHealth {
        let stm = {
            let store = lock(&self.run_state);
            ShortTermStore::probe(store.path())
        };
        let ltm = lock(&self.incidents).probe();
        MemoryHealth { stm, ltm }
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}
