//! HTTP surface of the daemon.

use std::sync::Arc;

use crate::context::GuardianContext;

pub mod dto;
pub mod handlers;
mod router;

pub use router::create_router;

/// Shared handler state.
pub type AppState = Arc<GuardianContext>;
