//! Short-term run state: a small JSON document rewritten after every analysis.
//!
//! The file is replaced atomically (temp file in the same directory, then
//! rename), so a crash mid-write leaves the previous document intact. A
//! document that fails to parse is treated as absent and replaced by defaults.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use guardian_core::OverallSeverity;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::error::StateResult;
use crate::health::TierStatus;

/// Operational status tag carried in the run state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    #[default]
    Active,
    /// The incident log is unavailable; analyses continue without it.
    Degraded,
}

/// Contents of `memory.json`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ShortTermState {
    pub last_pipeline_id: Option<String>,
    pub last_analyzed_at: Option<DateTime<Utc>>,
    pub total_analyzed: u64,
    pub alert_count: u64,
    pub agent_status: AgentStatus,
}

/// Where the in-memory copy stands relative to the file on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatePhase {
    /// Read from disk (or defaulted) and untouched since.
    Loaded,
    /// Mutated in memory; the last write failed or has not happened.
    Dirty,
    /// Mutated and successfully written.
    Persisted,
}

pub struct ShortTermStore {
    path: PathBuf,
    state: ShortTermState,
    phase: RunStatePhase,
}

impl ShortTermStore {
    /// Load the document at `path`, falling back to defaults when it is
    /// missing or unreadable.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let state = match read_state(&path) {
            Ok(Some(state)) => state,
            Ok(None) => {
                debug!(path = %path.display(), "run state absent, starting fresh");
                ShortTermState::default()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "run state unreadable, resetting to defaults");
                ShortTermState::default()
            }
        };
        Self {
            path,
            state,
            phase: RunStatePhase::Loaded,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn state(&self) -> &ShortTermState {
        &self.state
    }

    pub fn phase(&self) -> RunStatePhase {
        self.phase
    }

    /// Record one completed analysis and persist the document.
    ///
    /// The in-memory copy is updated even when the write fails.
    pub fn record_analysis(
        &mut self,
        pipeline_id: &str,
        severity: OverallSeverity,
        agent_status: AgentStatus,
    ) -> StateResult<()> {
        self.state.last_pipeline_id = Some(pipeline_id.to_string());
        self.state.last_analyzed_at = Some(Utc::now());
        self.state.total_analyzed = self.state.total_analyzed.saturating_add(1);
        if severity.requires_escalation() {
            self.state.alert_count = self.state.alert_count.saturating_add(1);
        }
        self.state.agent_status = agent_status;
        self.phase = RunStatePhase::Dirty;

        self.save()?;
        self.phase = RunStatePhase::Persisted;
        Ok(())
    }

    fn save(&self) -> StateResult<()> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let bytes = serde_json::to_vec_pretty(&self.state)?;
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }

    /// Report the on-disk document without touching the in-memory copy.
    pub fn probe(path: &Path) -> TierStatus {
        match read_state(path) {
            Ok(Some(_)) => TierStatus::Ok,
            Ok(None) => TierStatus::Missing,
            Err(_) => TierStatus::Corrupted,
        }
    }
}

fn read_state(path: &Path) -> StateResult<Option<ShortTermState>> {
    let bytes = match fs::read(path) {
        Ok(b) => b,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let state = serde_json::from_slice(&bytes)
        .map_err(|e| crate::error::StateError::Deserialization(e.to_string()))?;
    Ok(Some(state))
}
