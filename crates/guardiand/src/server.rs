//! Server setup and lifecycle management

use std::sync::Arc;

use guardian_core::COUNTERS;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::api::create_router;
use crate::context::GuardianContext;
use crate::error::{DaemonError, DaemonResult};
use crate::settings::Settings;

/// Bind, serve until a shutdown signal arrives, then flush counters.
pub async fn run(settings: Settings) -> DaemonResult<()> {
    let context = GuardianContext::from_settings(&settings);
    info!(
        policy = %context.policy_source,
        state_dir = %settings.state_dir.display(),
        channels = ?context.notifier.channel_names(),
        "guardian context ready"
    );

    let app = create_router(Arc::new(context));
    let addr = settings.listen_addr();
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "guardian daemon listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| DaemonError::Server(e.to_string()))?;

    info!("guardian daemon shutting down");
    COUNTERS.flush();
    Ok(())
}

/// Resolves on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received Ctrl+C, initiating graceful shutdown"),
        _ = terminate => info!("received terminate signal, initiating graceful shutdown"),
    }
}
