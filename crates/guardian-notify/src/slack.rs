//! Slack incoming-webhook channel.
//!
//! Messages use the legacy attachment format so the severity colour shows as
//! a bar beside the alert.

use std::time::Duration;

use async_trait::async_trait;
use guardian_core::{short_sha, OverallSeverity};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::alert::Alert;
use crate::channel::NotificationChannel;
use crate::error::NotifyError;

/// Upper bound on a single webhook call.
pub const SLACK_TIMEOUT: Duration = Duration::from_secs(10);

const FOOTER: &str = "CI/CD Guardian Agent";
const TITLE: &str = "🛡️ CI/CD Guardian Alert";

/// Attachment colour for a severity.
pub fn severity_color(severity: OverallSeverity) -> &'static str {
    match severity {
        OverallSeverity::Critical => "#FF0000",
        OverallSeverity::High => "#FF8C00",
        OverallSeverity::Medium => "#FFD700",
        OverallSeverity::Low => "#1E90FF",
        OverallSeverity::None => "#808080",
    }
}

/// True for a non-empty `http://` or `https://` URL.
pub fn is_usable_webhook(url: &str) -> bool {
    let url = url.trim();
    url.starts_with("http://") || url.starts_with("https://")
}

/// Build the webhook body for `alert`, stamped with `unix_ts`.
pub fn build_payload(alert: &Alert, unix_ts: i64) -> Value {
    let severity = alert.severity.as_str().to_uppercase();
    let bullets = alert
        .anomalies
        .iter()
        .map(|a| format!("• {}", a.description))
        .collect::<Vec<_>>()
        .join("\n");

    json!({
        "attachments": [{
            "fallback": format!("CI/CD Guardian Alert: {severity} severity incident"),
            "color": severity_color(alert.severity),
            "title": TITLE,
            "fields": [
                { "title": "Pipeline ID", "value": alert.pipeline_id, "short": true },
                { "title": "Severity", "value": severity, "short": true },
                { "title": "Branch", "value": alert.branch, "short": true },
                { "title": "Commit", "value": short_sha(&alert.commit_sha), "short": true },
                { "title": "Anomalies Detected", "value": alert.anomalies.len().to_string(), "short": false },
            ],
            "text": format!("*Anomalies:*\n{bullets}\n\n*Recommendation:*\n{}", alert.recommendation),
            "footer": FOOTER,
            "ts": unix_ts,
        }]
    })
}

pub struct SlackChannel {
    webhook_url: String,
    http_client: reqwest::Client,
}

impl SlackChannel {
    /// Fails with `NotConfigured` unless `webhook_url` is an http(s) URL.
    pub fn new(webhook_url: &str) -> Result<Self, NotifyError> {
        if !is_usable_webhook(webhook_url) {
            return Err(NotifyError::NotConfigured(format!(
                "slack webhook {webhook_url:?} is not an http(s) URL"
            )));
        }
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("cicd-guardian/", env!("CARGO_PKG_VERSION")))
            .timeout(SLACK_TIMEOUT)
            .build()?;

        Ok(Self {
            webhook_url: webhook_url.trim().to_string(),
            http_client,
        })
    }
}

#[async_trait]
impl NotificationChannel for SlackChannel {
    fn name(&self) -> &str {
        "slack"
    }

    async fn deliver(&self, alert: &Alert) -> Result<(), NotifyError> {
        let payload = build_payload(alert, chrono::Utc::now().timestamp());
        debug!(pipeline_id = %alert.pipeline_id, "posting slack alert");

        let response = self
            .http_client
            .post(&self.webhook_url)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            info!(pipeline_id = %alert.pipeline_id, "slack notification sent");
            Ok(())
        } else {
            warn!(pipeline_id = %alert.pipeline_id, status = status.as_u16(), "slack rejected notification");
            Err(NotifyError::Rejected {
                status: status.as_u16(),
            })
        }
    }
}
