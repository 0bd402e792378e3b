//! Guardian daemon
//!
//! HTTP front end for the policy engine:
//! - `POST /analyze`: evaluate a pipeline snapshot, record it, alert if needed
//! - `GET /metrics`: aggregate incident metrics
//! - `GET /health`: service, storage and config status
//! - `POST /register`: capability descriptor for the Supervisor

pub mod api;
pub mod context;
pub mod error;
pub mod registration;
pub mod server;
pub mod settings;

pub use api::create_router;
pub use context::{AnalysisOutcome, GuardianContext};
pub use error::{ApiError, DaemonError};
pub use settings::Settings;
