//! Fan an alert out to every configured channel.

use std::collections::{BTreeMap, BTreeSet};

use guardian_core::{NotificationSettings, OverallSeverity, Severity};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::alert::Alert;
use crate::channel::NotificationChannel;
use crate::email::EmailChannel;
use crate::error::NotifyError;
use crate::slack::SlackChannel;

/// Outcome of one dispatch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationReport {
    /// False when the severity was below the alert threshold.
    pub notified: bool,
    /// Delivery result per channel name.
    pub channels: BTreeMap<String, bool>,
}

impl NotificationReport {
    pub fn delivered(&self) -> usize {
        self.channels.values().filter(|ok| **ok).count()
    }

    pub fn attempted(&self) -> usize {
        self.channels.len()
    }
}

pub struct Notifier {
    channels: Vec<Box<dyn NotificationChannel>>,
    alert_on: BTreeSet<Severity>,
}

impl Notifier {
    pub fn new(alert_on: BTreeSet<Severity>) -> Self {
        Self {
            channels: Vec::new(),
            alert_on,
        }
    }

    /// Build the channel set described by the policy file.
    ///
    /// A webhook that is not an http(s) URL, or an email section with a
    /// missing field, is logged and left out.
    pub fn from_settings(settings: &NotificationSettings) -> Self {
        let mut notifier = Self::new(settings.alert_on.clone());
        if let Some(url) = settings.slack_webhook.as_deref() {
            match SlackChannel::new(url) {
                Ok(slack) => notifier.add_channel(Box::new(slack)),
                Err(NotifyError::NotConfigured(reason)) => {
                    info!(%reason, "slack webhook not configured, skipping channel")
                }
                Err(e) => warn!(error = %e, "failed to set up slack channel"),
            }
        }
        if let Some(email) = settings.email_smtp.as_ref() {
            match EmailChannel::new(email) {
                Ok(channel) => notifier.add_channel(Box::new(channel)),
                Err(NotifyError::NotConfigured(reason)) => {
                    warn!(%reason, "email configuration incomplete, skipping channel")
                }
                Err(e) => warn!(error = %e, "failed to set up email channel"),
            }
        }
        notifier
    }

    pub fn add_channel(&mut self, channel: Box<dyn NotificationChannel>) {
        self.channels.push(channel);
    }

    pub fn channel_names(&self) -> Vec<&str> {
        self.channels.iter().map(|c| c.name()).collect()
    }

    pub fn should_notify(&self, severity: OverallSeverity) -> bool {
        severity
            .as_severity()
            .is_some_and(|s| self.alert_on.contains(&s))
    }

    /// Deliver `alert` on every channel. Never fails; each failure is logged
    /// and recorded as `false` in the report.
    pub async fn notify(&self, alert: &Alert) -> NotificationReport {
        if !self.should_notify(alert.severity) {
            info!(
                pipeline_id = %alert.pipeline_id,
                severity = %alert.severity,
                "severity below alert threshold, not notifying"
            );
            return NotificationReport::default();
        }

        let mut channels = BTreeMap::new();
        for channel in &self.channels {
            let ok = match channel.deliver(alert).await {
                Ok(()) => true,
                Err(e) => {
                    warn!(
                        pipeline_id = %alert.pipeline_id,
                        channel = channel.name(),
                        error = %e,
                        "notification delivery failed"
                    );
                    false
                }
            };
            channels.insert(channel.name().to_string(), ok);
        }

        NotificationReport {
            notified: true,
            channels,
        }
    }
}
