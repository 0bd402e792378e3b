//! HTTP API tests driven through the router with `tower::ServiceExt::oneshot`.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use guardian_core::{LoadedPolicy, PolicyConfig, PolicySource, Severity};
use guardian_notify::{Alert, NotificationChannel, Notifier, NotifyError};
use guardian_state::MemoryManager;
use guardiand::{create_router, GuardianContext};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

struct CountingChannel(Arc<AtomicUsize>);

#[async_trait]
impl NotificationChannel for CountingChannel {
    fn name(&self) -> &str {
        "counting"
    }

    async fn deliver(&self, _alert: &Alert) -> Result<(), NotifyError> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn context(dir: &TempDir) -> GuardianContext {
    let loaded = LoadedPolicy {
        config: PolicyConfig::default(),
        source: PolicySource::Defaults {
            reason: "test".into(),
        },
    };
    GuardianContext::new(
        loaded,
        MemoryManager::in_dir(dir.path()),
        Duration::from_secs(5),
    )
}

fn app(dir: &TempDir) -> Router {
    create_router(Arc::new(context(dir)))
}

async fn send(app: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::HOST, "guardian.test:8000");
    let body = match body {
        Some(v) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(v.to_string())
        }
        None => Body::empty(),
    };
    let response = app.oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn critical_request() -> Value {
    json!({
        "pipeline_id": "build-12345",
        "status": "failed",
        "duration_seconds": 450,
        "logs": "Error: Unit tests failed...",
        "vulnerabilities": ["CVE-2023-12345", "CVE-2023-54321"],
        "branch": "main",
        "commit_sha": "a1b2c3d4e5f6",
        "test_coverage_percent": 65.0,
        "is_direct_push": true,
        "pr_approved": false,
        "pr_reviewers_count": 0
    })
}

#[tokio::test]
async fn analyze_critical_pipeline() {
    let dir = TempDir::new().unwrap();
    let (status, body) = send(app(&dir), Method::POST, "/analyze", Some(critical_request())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pipeline_id"], "build-12345");
    assert_eq!(body["status"], "failed");
    assert_eq!(body["severity"], "critical");
    assert_eq!(body["escalate_to_supervisor"], true);
    assert_eq!(body["anomalies"].as_array().unwrap().len(), 7);
    assert_eq!(body["anomalies"][0]["type"], "build_failure");
    assert!(body["recommendation"]
        .as_str()
        .unwrap()
        .starts_with("🚨 URGENT"));
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn analyze_clean_pipeline() {
    let dir = TempDir::new().unwrap();
    let request = json!({
        "pipeline_id": "build-ok",
        "status": "SUCCESS",
        "duration_seconds": 180,
        "branch": "feature/x",
        "commit_sha": "abc123def456",
        "test_coverage_percent": 95.0
    });
    let (status, body) = send(app(&dir), Method::POST, "/analyze", Some(request)).await;

    assert_eq!(status, StatusCode::OK);
    // Status is echoed in canonical lowercase, not as sent.
    assert_eq!(body["status"], "success");
    assert_eq!(body["severity"], "none");
    assert_eq!(body["escalate_to_supervisor"], false);
    assert_eq!(
        body["recommendation"],
        "Pipeline passed all checks. No action required."
    );
}

#[tokio::test]
async fn invalid_snapshots_are_422() {
    let dir = TempDir::new().unwrap();

    let mut bad_status = critical_request();
    bad_status["status"] = json!("exploded");
    let mut bad_coverage = critical_request();
    bad_coverage["test_coverage_percent"] = json!(120.0);
    let mut empty_branch = critical_request();
    empty_branch["branch"] = json!("");
    let mut negative_duration = critical_request();
    negative_duration["duration_seconds"] = json!(-5);

    for body in [bad_status, bad_coverage, empty_branch, negative_duration] {
        let (status, err) = send(app(&dir), Method::POST, "/analyze", Some(body)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err["code"], "VALIDATION_ERROR");
    }

    // Nothing was recorded for rejected input.
    let (_, metrics) = send(app(&dir), Method::GET, "/metrics", None).await;
    assert_eq!(metrics["total_pipelines_analyzed"], 0);
}

#[tokio::test]
async fn malformed_json_is_400() {
    let dir = TempDir::new().unwrap();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/analyze")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app(&dir).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn metrics_reflect_analyses() {
    let dir = TempDir::new().unwrap();
    let router = app(&dir);

    send(router.clone(), Method::POST, "/analyze", Some(critical_request())).await;
    let mut clean = critical_request();
    clean["pipeline_id"] = json!("build-clean");
    clean["status"] = json!("success");
    clean["branch"] = json!("feature/y");
    clean["vulnerabilities"] = json!([]);
    clean["test_coverage_percent"] = json!(90.0);
    send(router.clone(), Method::POST, "/analyze", Some(clean)).await;

    let (status, m) = send(router, Method::GET, "/metrics", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(m["total_pipelines_analyzed"], 2);
    assert_eq!(m["critical_incidents"], 1);
    assert_eq!(m["success_rate_percent"], 50.0);
    assert_eq!(m["average_duration_seconds"], 450.0);
    assert!(m["last_analysis_timestamp"].is_string());
    assert_eq!(m["top_anomalies"][0]["type"], "security_vulnerability");
    assert_eq!(m["top_anomalies"][0]["count"], 2);
}

#[tokio::test]
async fn health_reports_tiers_and_config() {
    let dir = TempDir::new().unwrap();
    let (status, body) = send(app(&dir), Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["memory_status"]["stm"], "missing");
    assert_eq!(body["memory_status"]["ltm"], "ok");
    assert_eq!(body["config_loaded"], false);
    assert_eq!(body["config_source"], "defaults");
}

#[tokio::test]
async fn register_builds_absolute_endpoints() {
    let dir = TempDir::new().unwrap();
    let (status, body) = send(app(&dir), Method::POST, "/register", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["agent_id"], "cicd-guardian-001");
    assert_eq!(
        body["endpoints"]["analyze"],
        "http://guardian.test:8000/analyze"
    );
    assert_eq!(body["metadata"]["architecture"], "Supervisor-Worker");
}

#[tokio::test]
async fn root_lists_endpoints() {
    let dir = TempDir::new().unwrap();
    let (status, body) = send(app(&dir), Method::GET, "/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["agent"], "CI/CD Guardian");
    assert_eq!(body["endpoints"]["metrics"], "/metrics");
}

#[tokio::test]
async fn notification_only_above_threshold() {
    let dir = TempDir::new().unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    let mut notifier = Notifier::new(BTreeSet::from([Severity::Critical]));
    notifier.add_channel(Box::new(CountingChannel(Arc::clone(&calls))));
    let router = create_router(Arc::new(context(&dir).with_notifier(notifier)));

    // High severity: below the critical-only threshold.
    let high = json!({
        "pipeline_id": "p-high",
        "status": "failed",
        "duration_seconds": 10,
        "branch": "feature/z",
        "commit_sha": "abc"
    });
    send(router.clone(), Method::POST, "/analyze", Some(high)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    send(router, Method::POST, "/analyze", Some(critical_request())).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}
