//! Daemon settings from the command line and environment.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

/// Port used when neither `--listen` nor `PORT` is given.
pub const DEFAULT_PORT: u16 = 8000;

#[derive(Debug, Clone, Parser)]
#[command(name = "guardiand")]
#[command(about = "CI/CD Guardian - pipeline policy enforcement daemon", long_about = None)]
#[command(version)]
pub struct Settings {
    /// Listen address (overrides PORT)
    #[arg(short, long, env = "GUARDIAN_LISTEN")]
    pub listen: Option<SocketAddr>,

    /// Port to bind on all interfaces when no listen address is set
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Policy rules file
    #[arg(short, long, env = "GUARDIAN_RULES", default_value = "config/rules.yaml")]
    pub rules: PathBuf,

    /// Directory holding memory.json and memory.db
    #[arg(long, env = "GUARDIAN_STATE_DIR", default_value = "state")]
    pub state_dir: PathBuf,

    /// Upper bound on a single store operation, in seconds
    #[arg(long, env = "GUARDIAN_STORE_TIMEOUT_SECS", default_value_t = 10)]
    pub store_timeout_secs: u64,

    /// Emit logs as JSON lines
    #[arg(long, env = "GUARDIAN_JSON_LOGS")]
    pub json_logs: bool,

    /// Debug-level logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Settings {
    pub fn listen_addr(&self) -> SocketAddr {
        self.listen.unwrap_or_else(|| {
            SocketAddr::from(([0, 0, 0, 0], self.port.unwrap_or(DEFAULT_PORT)))
        })
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.store_timeout_secs.max(1))
    }
}
