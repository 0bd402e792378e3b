//! Error types for guardian-notify

use thiserror::Error;

/// Errors that can occur while delivering an alert
#[derive(Error, Debug)]
pub enum NotifyError {
    /// Channel has no usable destination
    #[error("Channel is not configured: {0}")]
    NotConfigured(String),

    /// Receiver answered with a non-success status
    #[error("Delivery rejected with HTTP {status}")]
    Rejected { status: u16 },

    /// Transport failure, including timeouts
    #[error("HTTP error: {0}")]
    Http(String),

    /// Sender or recipient is not a valid mailbox
    #[error("Invalid email address {address:?}: {reason}")]
    InvalidAddress { address: String, reason: String },

    /// Email could not be assembled
    #[error("Email build error: {0}")]
    Message(String),

    /// SMTP relay refused the connection, login or message
    #[error("SMTP error: {0}")]
    Smtp(String),
}

impl From<reqwest::Error> for NotifyError {
    fn from(err: reqwest::Error) -> Self {
        NotifyError::Http(err.to_string())
    }
}

impl From<lettre::error::Error> for NotifyError {
    fn from(err: lettre::error::Error) -> Self {
        NotifyError::Message(err.to_string())
    }
}

impl From<lettre::transport::smtp::Error> for NotifyError {
    fn from(err: lettre::transport::smtp::Error) -> Self {
        NotifyError::Smtp(err.to_string())
    }
}
