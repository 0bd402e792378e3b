//! Durable, append-only incident log backed by SQLite.
//!
//! Each operation opens its own connection with a busy timeout, so a store
//! shared behind a mutex never holds a file handle between calls. Structural
//! corruption (the file is not a database, or is damaged) is handled by
//! deleting the file, recreating the schema and retrying the operation once.
//! If that recovery also fails the store becomes unavailable and every later
//! operation fails fast.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use guardian_core::{OverallSeverity, Severity};
use rusqlite::{params, Connection, OpenFlags, Row};
use serde::Deserialize;
use tracing::{debug, error, warn};

use crate::error::{StateError, StateResult};
use crate::health::TierStatus;
use crate::incident::{round2, AnomalyFrequency, Incident, IncidentMetrics};
use crate::schema::init_schema;

/// How long a connection waits on a locked database before failing.
pub const BUSY_TIMEOUT: Duration = Duration::from_millis(5000);

/// Incidents scanned when ranking anomaly types.
pub const RECENT_WINDOW: usize = 100;

/// Anomaly types reported in the ranking.
pub const TOP_ANOMALY_LIMIT: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
enum StoreState {
    Ready,
    Unavailable { reason: String },
}

pub struct IncidentStore {
    path: PathBuf,
    state: StoreState,
}

impl IncidentStore {
    /// Open (creating if needed) the log at `path`.
    ///
    /// Never fails: a store that cannot be initialised comes back unavailable.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let state = match bootstrap(&path) {
            Ok(()) => StoreState::Ready,
            Err(e) => {
                error!(path = %path.display(), error = %e, "incident store unavailable");
                StoreState::Unavailable {
                    reason: e.to_string(),
                }
            }
        };
        Self { path, state }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_available(&self) -> bool {
        self.state == StoreState::Ready
    }

    /// Append `incident`, returning its row id.
    pub fn append(&mut self, incident: &Incident) -> StateResult<i64> {
        let anomalies = serde_json::to_string(&incident.anomalies)?;
        let timestamp = incident.timestamp_text();
        let duration = i64::try_from(incident.duration_seconds).unwrap_or(i64::MAX);
        let count = i64::try_from(incident.anomaly_count()).unwrap_or(i64::MAX);

        self.with_recovery(|conn| {
            conn.execute(
                "INSERT INTO incidents (
                    pipeline_id, timestamp, status, severity, duration_seconds,
                    branch, commit_sha, anomaly_count, anomalies, recommendation, escalated
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    incident.pipeline_id,
                    timestamp,
                    incident.status.as_str(),
                    incident.severity.as_str(),
                    duration,
                    incident.branch,
                    incident.commit_sha,
                    count,
                    anomalies,
                    incident.recommendation,
                    incident.escalated,
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// Aggregate the whole log. `last_analysis_timestamp` is left unset; the
    /// run state owns it.
    pub fn compute_metrics(&mut self) -> StateResult<IncidentMetrics> {
        self.with_recovery(query_metrics)
    }

    /// Report the on-disk file without mutating it.
    pub fn probe(&self) -> TierStatus {
        if !self.is_available() {
            return TierStatus::Corrupted;
        }
        if !self.path.exists() {
            return TierStatus::Missing;
        }
        let check = Connection::open_with_flags(&self.path, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .and_then(|conn| {
                conn.busy_timeout(BUSY_TIMEOUT)?;
                conn.query_row("SELECT COUNT(*) FROM sqlite_master", [], |row| {
                    row.get::<_, i64>(0)
                })
            });
        match check {
            Ok(_) => TierStatus::Ok,
            Err(e) => {
                debug!(error = %e, "incident store probe failed");
                TierStatus::Corrupted
            }
        }
    }

    fn with_recovery<T>(
        &mut self,
        op: impl Fn(&Connection) -> StateResult<T>,
    ) -> StateResult<T> {
        if let StoreState::Unavailable { reason } = &self.state {
            return Err(StateError::Unavailable(reason.clone()));
        }

        match run(&self.path, &op) {
            Err(e) if e.is_corruption() => {
                warn!(path = %self.path.display(), error = %e, "incident store corrupted, rebuilding");
                if let Err(reset_err) = reset(&self.path) {
                    error!(error = %reset_err, "incident store rebuild failed");
                    self.state = StoreState::Unavailable {
                        reason: reset_err.to_string(),
                    };
                    return Err(reset_err);
                }
                run(&self.path, &op)
            }
            other => other,
        }
    }
}

fn connect(path: &Path) -> StateResult<Connection> {
    let conn = Connection::open(path).map_err(|e| StateError::Connection(e.to_string()))?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    Ok(conn)
}

fn run<T>(path: &Path, op: &impl Fn(&Connection) -> StateResult<T>) -> StateResult<T> {
    let conn = connect(path)?;
    init_schema(&conn)?;
    op(&conn)
}

fn bootstrap(path: &Path) -> StateResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    match connect(path).and_then(|conn| init_schema(&conn)) {
        Err(e) if e.is_corruption() => {
            warn!(path = %path.display(), error = %e, "incident store corrupted at startup, rebuilding");
            reset(path)
        }
        other => other,
    }
}

/// Delete the database (and any rollback journal) and recreate the schema.
fn reset(path: &Path) -> StateResult<()> {
    remove_if_present(path)?;
    let mut journal = path.as_os_str().to_owned();
    journal.push("-journal");
    remove_if_present(Path::new(&journal))?;

    let conn = connect(path)?;
    init_schema(&conn)
}

fn remove_if_present(path: &Path) -> StateResult<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

fn query_metrics(conn: &Connection) -> StateResult<IncidentMetrics> {
    let tx = conn.unchecked_transaction()?;

    let total: i64 = tx.query_row("SELECT COUNT(*) FROM incidents", [], |row| row.get(0))?;
    let clean: i64 = tx.query_row(
        "SELECT COUNT(*) FROM incidents WHERE anomaly_count = 0",
        [],
        |row| row.get(0),
    )?;
    let average: Option<f64> = tx.query_row(
        "SELECT AVG(duration_seconds) FROM incidents",
        [],
        |row| row.get(0),
    )?;

    let mut by_severity: HashMap<Severity, u64> = HashMap::new();
    {
        let mut stmt = tx.prepare("SELECT severity, COUNT(*) FROM incidents GROUP BY severity")?;
        let rows = stmt.query_map([], |row| {
            Ok((text_cell(row, 0)?, row.get::<_, i64>(1)?))
        })?;
        for row in rows {
            let (label, count) = row?;
            if let Some(severity) = label
                .and_then(|l| l.parse::<OverallSeverity>().ok())
                .and_then(OverallSeverity::as_severity)
            {
                by_severity.insert(severity, count.max(0) as u64);
            }
        }
    }

    let recent: Vec<String> = {
        let mut stmt = tx.prepare(
            "SELECT anomalies FROM incidents
             WHERE anomaly_count > 0
             ORDER BY timestamp DESC, id DESC
             LIMIT ?1",
        )?;
        let rows = stmt.query_map([RECENT_WINDOW as i64], |row| text_cell(row, 0))?;
        let mut texts = Vec::new();
        for row in rows {
            match row? {
                Some(text) => texts.push(text),
                None => debug!("skipping anomaly row that is not valid text"),
            }
        }
        texts
    };
    tx.finish()?;

    let total = total.max(0) as u64;
    let success_rate = if total == 0 {
        100.0
    } else {
        round2(clean.max(0) as f64 / total as f64 * 100.0)
    };
    let count = |s: Severity| by_severity.get(&s).copied().unwrap_or(0);

    Ok(IncidentMetrics {
        total_pipelines_analyzed: total,
        critical_incidents: count(Severity::Critical),
        high_incidents: count(Severity::High),
        medium_incidents: count(Severity::Medium),
        low_incidents: count(Severity::Low),
        success_rate_percent: success_rate,
        average_duration_seconds: round2(average.unwrap_or(0.0)),
        last_analysis_timestamp: None,
        top_anomalies: rank_anomaly_types(recent.iter().map(String::as_str)),
    })
}

/// A column as owned text, or `None` when it holds a blob, a number, NULL or
/// bytes that are not UTF-8.
fn text_cell(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<String>> {
    Ok(row.get_ref(idx)?.as_str().ok().map(str::to_owned))
}

#[derive(Deserialize)]
struct StoredAnomaly {
    #[serde(rename = "type", default = "unknown_kind")]
    kind: String,
}

fn unknown_kind() -> String {
    "unknown".to_string()
}

/// Count anomaly types across serialized anomaly lists, most recent first.
///
/// Rows that fail to parse are skipped. Ties keep first-seen order.
pub fn rank_anomaly_types<'a>(rows: impl IntoIterator<Item = &'a str>) -> Vec<AnomalyFrequency> {
    let mut ranked: Vec<AnomalyFrequency> = Vec::new();
    for row in rows {
        let Ok(anomalies) = serde_json::from_str::<Vec<StoredAnomaly>>(row) else {
            debug!("skipping unparseable anomaly row");
            continue;
        };
        for anomaly in anomalies {
            match ranked.iter_mut().find(|f| f.kind == anomaly.kind) {
                Some(entry) => entry.count += 1,
                None => ranked.push(AnomalyFrequency {
                    kind: anomaly.kind,
                    count: 1,
                }),
            }
        }
    }
    ranked.sort_by(|a, b| b.count.cmp(&a.count));
    ranked.truncate(TOP_ANOMALY_LIMIT);
    ranked
}
