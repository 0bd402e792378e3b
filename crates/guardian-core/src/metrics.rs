//! Process-wide atomic counters for the Guardian service.
//!
//! Counters are bumped silently at the call site. Call [`Counters::flush`]
//! to emit all values as a single `tracing::info!` event (on shutdown, or
//! at any other natural boundary).
//!
//! These are operational counters for the running process only; the
//! durable, Supervisor-facing metrics come from the incident log.

use std::sync::atomic::{AtomicU64, Ordering};

/// Global counters singleton.
pub static COUNTERS: Counters = Counters::new();

/// Lightweight atomic counters, no allocations and no locking.
pub struct Counters {
    analyses: AtomicU64,
    escalations: AtomicU64,
    persist_failures: AtomicU64,
    notifications_sent: AtomicU64,
}

impl Default for Counters {
    fn default() -> Self {
        Self::new()
    }
}

impl Counters {
    pub const fn new() -> Self {
        Self {
            analyses: AtomicU64::new(0),
            escalations: AtomicU64::new(0),
            persist_failures: AtomicU64::new(0),
            notifications_sent: AtomicU64::new(0),
        }
    }

    /// Record one completed analysis.
    pub fn inc_analyses(&self, escalated: bool) {
        self.analyses.fetch_add(1, Ordering::Relaxed);
        if escalated {
            self.escalations.fetch_add(1, Ordering::Relaxed);
        }
        tracing::trace!(metric = "analyses", escalated, "counter incremented");
    }

    pub fn inc_persist_failures(&self) {
        self.persist_failures.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "persist_failures", "counter incremented");
    }

    pub fn add_notifications_sent(&self, n: u64) {
        self.notifications_sent.fetch_add(n, Ordering::Relaxed);
    }

    /// Emit all current counter values as a single `info!` event.
    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            analyses = self.analyses(),
            escalations = self.escalations(),
            persist_failures = self.persist_failures(),
            notifications_sent = self.notifications_sent(),
        );
    }

    pub fn analyses(&self) -> u64 {
        self.analyses.load(Ordering::Relaxed)
    }

    pub fn escalations(&self) -> u64 {
        self.escalations.load(Ordering::Relaxed)
    }

    pub fn persist_failures(&self) -> u64 {
        self.persist_failures.load(Ordering::Relaxed)
    }

    pub fn notifications_sent(&self) -> u64 {
        self.notifications_sent.load(Ordering::Relaxed)
    }

    /// Reset all counters to zero (useful in tests).
    pub fn reset(&self) {
        self.analyses.store(0, Ordering::Relaxed);
        self.escalations.store(0, Ordering::Relaxed);
        self.persist_failures.store(0, Ordering::Relaxed);
        self.notifications_sent.store(0, Ordering::Relaxed);
    }
}
