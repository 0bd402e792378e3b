//! Plain-text email alerts over an authenticated STARTTLS SMTP relay.

use std::time::Duration;

use async_trait::async_trait;
use guardian_core::EmailSettings;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{debug, info, warn};

use crate::alert::Alert;
use crate::channel::NotificationChannel;
use crate::error::NotifyError;

/// Upper bound on one SMTP conversation.
pub const EMAIL_TIMEOUT: Duration = Duration::from_secs(10);

const SIGNATURE: &str = "CI/CD Guardian Agent";

pub fn build_subject(alert: &Alert) -> String {
    format!(
        "[CI/CD Guardian] {} Alert - {}",
        alert.severity.as_str().to_uppercase(),
        alert.pipeline_id
    )
}

pub fn build_body(alert: &Alert) -> String {
    let mut body = format!(
        "CI/CD Guardian Alert\n\n\
         Pipeline ID: {}\n\
         Severity: {}\n\
         Branch: {}\n\
         Commit: {}\n\n\
         Anomalies Detected ({}):\n",
        alert.pipeline_id,
        alert.severity.as_str().to_uppercase(),
        alert.branch,
        alert.commit_sha,
        alert.anomalies.len(),
    );
    for anomaly in &alert.anomalies {
        body.push_str("\n• ");
        body.push_str(&anomaly.description);
    }
    body.push_str("\n\nRecommendation:\n");
    body.push_str(&alert.recommendation);
    body.push_str("\n\n---\n");
    body.push_str(SIGNATURE);
    body.push('\n');
    body
}

fn parse_mailbox(address: &str) -> Result<Mailbox, NotifyError> {
    address
        .trim()
        .parse()
        .map_err(|e: lettre::address::AddressError| NotifyError::InvalidAddress {
            address: address.to_string(),
            reason: e.to_string(),
        })
}

/// Assemble the alert message for `to`.
pub fn build_message(from: &Mailbox, to: &[Mailbox], alert: &Alert) -> Result<Message, NotifyError> {
    let builder = Message::builder()
        .from(from.clone())
        .subject(build_subject(alert))
        .header(ContentType::TEXT_PLAIN);
    let builder = to.iter().cloned().fold(builder, |b, mailbox| b.to(mailbox));
    Ok(builder.body(build_body(alert))?)
}

pub struct EmailChannel {
    server: String,
    from: Mailbox,
    to: Vec<Mailbox>,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl EmailChannel {
    /// Build the channel. Incomplete settings yield `NotConfigured`.
    pub fn new(settings: &EmailSettings) -> Result<Self, NotifyError> {
        let missing = settings.missing_fields();
        let (true, Some(server), Some(username), Some(password), Some(from_email)) = (
            missing.is_empty(),
            settings.server.as_deref(),
            settings.username.as_deref(),
            settings.password.as_deref(),
            settings.from_email.as_deref(),
        ) else {
            return Err(NotifyError::NotConfigured(format!(
                "email settings incomplete, missing {}",
                missing.join(", ")
            )));
        };

        let from = parse_mailbox(from_email)?;
        let to = settings
            .to_emails
            .iter()
            .filter(|address| !address.trim().is_empty())
            .map(|address| parse_mailbox(address))
            .collect::<Result<Vec<_>, _>>()?;

        let server = server.trim().to_string();
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&server)?
            .port(settings.port)
            .credentials(Credentials::new(username.to_string(), password.to_string()))
            .timeout(Some(EMAIL_TIMEOUT))
            .build();

        Ok(Self {
            server,
            from,
            to,
            transport,
        })
    }
}

#[async_trait]
impl NotificationChannel for EmailChannel {
    fn name(&self) -> &str {
        "email"
    }

    async fn deliver(&self, alert: &Alert) -> Result<(), NotifyError> {
        let message = build_message(&self.from, &self.to, alert)?;
        debug!(
            pipeline_id = %alert.pipeline_id,
            server = %self.server,
            recipients = self.to.len(),
            "sending email alert"
        );

        match self.transport.send(message).await {
            Ok(_) => {
                info!(pipeline_id = %alert.pipeline_id, "email notification sent");
                Ok(())
            }
            Err(e) => {
                warn!(pipeline_id = %alert.pipeline_id, server = %self.server, error = %e, "smtp delivery failed");
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use guardian_core::{Anomaly, AnomalyKind, OverallSeverity, Severity};

    fn alert() -> Alert {
        Alert {
            pipeline_id: "build-42".into(),
            severity: OverallSeverity::Critical,
            anomalies: vec![
                Anomaly::new(AnomalyKind::BuildFailure, "Pipeline build failed", Severity::High),
                Anomaly::new(
                    AnomalyKind::SecurityVulnerability,
                    "Security vulnerability detected: CVE-2023-12345",
                    Severity::Critical,
                ),
            ],
            recommendation: "Rotate the dependency".into(),
            branch: "main".into(),
            commit_sha: "0123456789abcdef".into(),
        }
    }

    fn settings() -> EmailSettings {
        EmailSettings {
            server: Some("smtp.example.com".into()),
            username: Some("guardian".into()),
            password: Some("secret".into()),
            from_email: Some("guardian@example.com".into()),
            to_emails: vec!["oncall@example.com".into()],
            ..EmailSettings::default()
        }
    }

    #[test]
    fn subject_names_severity_and_pipeline() {
        assert_eq!(
            build_subject(&alert()),
            "[CI/CD Guardian] CRITICAL Alert - build-42"
        );
    }

    #[test]
    fn body_lists_context_findings_and_recommendation() {
        let body = build_body(&alert());
        assert!(body.starts_with("CI/CD Guardian Alert\n\nPipeline ID: build-42\n"));
        assert!(body.contains("Severity: CRITICAL\n"));
        assert!(body.contains("Branch: main\n"));
        assert!(body.contains("Commit: 0123456789abcdef\n"));
        assert!(body.contains(
            "Anomalies Detected (2):\n\n• Pipeline build failed\n• Security vulnerability detected: CVE-2023-12345"
        ));
        assert!(body.contains("\n\nRecommendation:\nRotate the dependency\n"));
        assert!(body.ends_with("\n---\nCI/CD Guardian Agent\n"));
    }

    #[test]
    fn message_addresses_every_recipient() {
        let from = parse_mailbox("guardian@example.com").unwrap();
        let to = vec![
            parse_mailbox("a@example.com").unwrap(),
            parse_mailbox("b@example.com").unwrap(),
        ];
        let message = build_message(&from, &to, &alert()).unwrap();
        let raw = String::from_utf8_lossy(&message.formatted()).to_string();
        assert!(raw.contains("From: guardian@example.com"));
        assert!(raw.contains("a@example.com"));
        assert!(raw.contains("b@example.com"));
        assert!(raw.contains("Subject: [CI/CD Guardian] CRITICAL Alert - build-42"));
    }

    #[test]
    fn incomplete_settings_are_not_configured() {
        let mut s = settings();
        s.password = None;
        s.to_emails.clear();
        match EmailChannel::new(&s) {
            Err(NotifyError::NotConfigured(reason)) => {
                assert!(reason.contains("password"));
                assert!(reason.contains("to_emails"));
            }
            Err(other) => panic!("expected NotConfigured, got {other:?}"),
            Ok(_) => panic!("expected NotConfigured, got a channel"),
        }
    }

    #[test]
    fn invalid_sender_is_rejected() {
        let mut s = settings();
        s.from_email = Some("not an address".into());
        assert!(matches!(
            EmailChannel::new(&s),
            Err(NotifyError::InvalidAddress { .. })
        ));
    }
}
