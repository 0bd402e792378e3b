//! Guardian Notify: alert delivery for CI/CD Guardian
//!
//! A [`Notifier`] holds the channels configured in the policy file (Slack
//! webhook, SMTP email) and the set of severities that warrant an alert.
//! Delivery failures are reported per channel and never propagate to the
//! caller.

mod alert;
mod channel;
mod dispatcher;
pub mod email;
mod error;
pub mod slack;

pub use alert::Alert;
pub use channel::NotificationChannel;
pub use dispatcher::{NotificationReport, Notifier};
pub use email::EmailChannel;
pub use error::NotifyError;
pub use slack::SlackChannel;
