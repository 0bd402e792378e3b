//! The seam between the dispatcher and concrete delivery mechanisms.

use async_trait::async_trait;

use crate::alert::Alert;
use crate::error::NotifyError;

/// A destination alerts can be pushed to.
///
/// Implementations must bound their own latency; the dispatcher awaits each
/// channel in turn.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Stable key used in the per-channel delivery report.
    fn name(&self) -> &str;

    async fn deliver(&self, alert: &Alert) -> Result<(), NotifyError>;
}
