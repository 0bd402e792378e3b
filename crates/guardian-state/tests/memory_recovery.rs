//! Recovery behaviour of the Memory Manager across restarts and damaged files.

use std::fs;

use guardian_core::{analyze, PipelineSnapshot, PipelineStatus, PolicyConfig};
use guardian_state::{
    Incident, MemoryManager, TierStatus, INCIDENT_DB_FILE, RUN_STATE_FILE,
};
use tempfile::TempDir;

fn analysed(id: &str, status: PipelineStatus, branch: &str) -> Incident {
    let snapshot = PipelineSnapshot::new(id, status, 120, branch, "0123456789abcdef");
    let analysis = analyze(&snapshot, &PolicyConfig::default());
    Incident::from_analysis(&snapshot, &analysis)
}

#[test]
fn history_survives_restart() {
    let dir = TempDir::new().unwrap();
    {
        let memory = MemoryManager::in_dir(dir.path());
        for i in 0..3 {
            let incident = analysed(&format!("run-{i}"), PipelineStatus::Failed, "feature/a");
            assert!(memory.record_incident(&incident));
            memory.update_run_state(&incident.pipeline_id, incident.severity);
        }
    }

    let memory = MemoryManager::in_dir(dir.path());
    let metrics = memory.compute_metrics();
    assert_eq!(metrics.total_pipelines_analyzed, 3);
    assert_eq!(metrics.high_incidents, 3);
    assert_eq!(metrics.top_anomalies[0].kind, "build_failure");
    assert_eq!(metrics.top_anomalies[0].count, 3);
    assert_eq!(memory.run_state().total_analyzed, 3);
    assert_eq!(memory.run_state().alert_count, 3);
}

#[test]
fn garbage_database_is_replaced_with_empty_log() {
    let dir = TempDir::new().unwrap();
    {
        let memory = MemoryManager::in_dir(dir.path());
        assert!(memory.record_incident(&analysed("old", PipelineStatus::Success, "dev")));
    }
    fs::write(dir.path().join(INCIDENT_DB_FILE), vec![0x5A; 8192]).unwrap();

    let memory = MemoryManager::in_dir(dir.path());
    assert!(memory.record_incident(&analysed("new", PipelineStatus::Success, "dev")));
    assert_eq!(memory.compute_metrics().total_pipelines_analyzed, 1);
    assert_eq!(memory.health().ltm, TierStatus::Ok);
}

#[test]
fn corrupted_run_state_is_reported_then_repaired() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join(RUN_STATE_FILE), "[1, 2,").unwrap();

    let memory = MemoryManager::in_dir(dir.path());
    assert_eq!(memory.health().stm, TierStatus::Corrupted);
    assert_eq!(memory.run_state().total_analyzed, 0);

    memory.update_run_state("repair", guardian_core::OverallSeverity::None);
    assert_eq!(memory.health().stm, TierStatus::Ok);
    assert_eq!(memory.run_state().total_analyzed, 1);
}

#[test]
fn metrics_timestamp_comes_from_run_state() {
    let dir = TempDir::new().unwrap();
    let memory = MemoryManager::in_dir(dir.path());
    assert!(memory.compute_metrics().last_analysis_timestamp.is_none());

    memory.update_run_state("p", guardian_core::OverallSeverity::Low);
    let ts = memory.compute_metrics().last_analysis_timestamp;
    assert_eq!(ts, memory.run_state().last_analyzed_at);
    assert!(ts.is_some());
}
