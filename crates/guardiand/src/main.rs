use anyhow::Result;
use clap::Parser;
use guardian_core::init_tracing;
use guardiand::Settings;
use tracing::Level;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::parse();
    let level = if settings.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    init_tracing(settings.json_logs, level);

    tracing::info!(version = guardian_core::VERSION, "guardiand starting");
    guardiand::server::run(settings).await?;
    Ok(())
}
