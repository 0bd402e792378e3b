//! Application context shared by every request handler.
//!
//! Built once at startup and handed to the router as state. Store access runs
//! on the blocking pool under a timeout; a slow or failing store degrades to a
//! logged persistence failure and never fails the analysis.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use guardian_core::{
    analyze, emit_analysis_completed, emit_analysis_started, emit_notification_dispatched,
    emit_persist_failed, Analysis, AnalysisSpan, LoadedPolicy, PipelineSnapshot, PolicyConfig,
    PolicySource, COUNTERS,
};
use guardian_notify::{Alert, NotificationReport, Notifier};
use guardian_state::{Incident, IncidentMetrics, MemoryHealth, MemoryManager, TierStatus};
use tracing::debug;

use crate::settings::Settings;

/// Result of one `/analyze` call.
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub snapshot: PipelineSnapshot,
    pub analysis: Analysis,
    pub timestamp: DateTime<Utc>,
    /// False when the incident could not be written to the log.
    pub persisted: bool,
    /// Present only when the analysis produced anomalies.
    pub notification: Option<NotificationReport>,
}

pub struct GuardianContext {
    pub policy: PolicyConfig,
    pub policy_source: PolicySource,
    pub memory: Arc<MemoryManager>,
    pub notifier: Notifier,
    pub started_at: DateTime<Utc>,
    pub store_timeout: Duration,
}

impl GuardianContext {
    pub fn new(loaded: LoadedPolicy, memory: MemoryManager, store_timeout: Duration) -> Self {
        let notifier = Notifier::from_settings(&loaded.config.notifications);
        Self {
            policy: loaded.config,
            policy_source: loaded.source,
            memory: Arc::new(memory),
            notifier,
            started_at: Utc::now(),
            store_timeout,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        let loaded = PolicyConfig::load(&settings.rules);
        let memory = MemoryManager::in_dir(&settings.state_dir);
        Self::new(loaded, memory, settings.store_timeout())
    }

    /// Replace the channel set built from the policy file.
    pub fn with_notifier(mut self, notifier: Notifier) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn uptime_seconds(&self) -> f64 {
        let elapsed = Utc::now() - self.started_at;
        (elapsed.num_milliseconds() as f64 / 1000.0 * 100.0).round() / 100.0
    }

    /// Evaluate, persist and, when warranted, alert on one snapshot.
    pub async fn analyze(&self, snapshot: PipelineSnapshot) -> AnalysisOutcome {
        let analysis = {
            let _span = AnalysisSpan::enter(&snapshot.id);
            emit_analysis_started(&snapshot.id, &snapshot.branch, snapshot.short_sha());
            analyze(&snapshot, &self.policy)
        };
        let timestamp = Utc::now();

        let persisted = self
            .persist(Incident::from_analysis(&snapshot, &analysis))
            .await;

        let notification = if analysis.anomalies.is_empty() {
            None
        } else {
            let report = self
                .notifier
                .notify(&Alert::from_analysis(&snapshot, &analysis))
                .await;
            if report.notified {
                emit_notification_dispatched(&snapshot.id, report.delivered(), report.attempted());
                COUNTERS.add_notifications_sent(report.delivered() as u64);
            }
            Some(report)
        };

        emit_analysis_completed(
            &snapshot.id,
            analysis.severity,
            analysis.anomalies.len(),
            analysis.escalate,
        );
        COUNTERS.inc_analyses(analysis.escalate);

        AnalysisOutcome {
            snapshot,
            analysis,
            timestamp,
            persisted,
            notification,
        }
    }

    /// Append the incident, then advance the run state.
    async fn persist(&self, incident: Incident) -> bool {
        let memory = Arc::clone(&self.memory);
        let pipeline_id = incident.pipeline_id.clone();
        let task = tokio::task::spawn_blocking(move || {
            let recorded = memory.record_incident(&incident);
            memory.update_run_state(&incident.pipeline_id, incident.severity);
            recorded
        });

        let failure = match tokio::time::timeout(self.store_timeout, task).await {
            Ok(Ok(true)) => return true,
            Ok(Ok(false)) => "incident store rejected the write".to_string(),
            Ok(Err(join_err)) => format!("store task failed: {join_err}"),
            Err(_) => format!("store did not respond within {:?}", self.store_timeout),
        };
        emit_persist_failed(&pipeline_id, "incidents", &failure);
        COUNTERS.inc_persist_failures();
        false
    }

    /// Incident metrics, or empty metrics if the store is slow or failing.
    pub async fn metrics(&self) -> IncidentMetrics {
        let memory = Arc::clone(&self.memory);
        let task = tokio::task::spawn_blocking(move || memory.compute_metrics());
        match tokio::time::timeout(self.store_timeout, task).await {
            Ok(Ok(metrics)) => metrics,
            Ok(Err(e)) => {
                debug!(error = %e, "metrics task failed");
                IncidentMetrics::default()
            }
            Err(_) => {
                debug!("metrics timed out");
                IncidentMetrics::default()
            }
        }
    }

    /// Per-tier health. A tier that cannot be probed in time reports corrupted.
    pub async fn memory_health(&self) -> MemoryHealth {
        let memory = Arc::clone(&self.memory);
        let task = tokio::task::spawn_blocking(move || memory.health());
        match tokio::time::timeout(self.store_timeout, task).await {
            Ok(Ok(health)) => health,
            _ => MemoryHealth {
                stm: TierStatus::Corrupted,
                ltm: TierStatus::Corrupted,
            },
        }
    }
}
