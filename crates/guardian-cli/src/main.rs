//! CI/CD Guardian CLI
//!
//! The `guardian` command works against the same policy engine and storage as
//! the daemon, without a running server.
//!
//! ## Commands
//!
//! - `analyze`: evaluate a snapshot file offline (nothing is persisted)
//! - `rules`: print the effective policy
//! - `memory`: metrics and health of a local state directory
//! - `register`: fetch an agent's descriptor and forward it to a Supervisor

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use guardian_core::{analyze, Analysis, PipelineSnapshot, PolicyConfig};
use guardian_state::MemoryManager;
use guardiand::api::dto::AnalyzeRequest;
use guardiand::registration::AgentDescriptor;
use serde_json::Value;
use tracing::{info, warn, Level};

/// Upper bound on each registration request.
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Parser)]
#[command(name = "guardian")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "CI/CD Guardian - pipeline policy enforcement", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyse a pipeline snapshot file without persisting anything
    Analyze {
        /// Snapshot in the `/analyze` request format (JSON)
        #[arg(short, long)]
        snapshot: PathBuf,

        /// Policy rules file
        #[arg(short, long, env = "GUARDIAN_RULES", default_value = "config/rules.yaml")]
        rules: PathBuf,

        /// Exit non-zero when the result would be escalated
        #[arg(long)]
        fail_on_escalate: bool,
    },

    /// Print the effective policy as YAML
    Rules {
        /// Policy rules file
        #[arg(short, long, env = "GUARDIAN_RULES", default_value = "config/rules.yaml")]
        rules: PathBuf,
    },

    /// Show metrics and health of a local state directory
    Memory {
        /// Directory holding memory.json and memory.db
        #[arg(long, env = "GUARDIAN_STATE_DIR", default_value = "state")]
        state_dir: PathBuf,
    },

    /// Fetch an agent's registration descriptor
    Register {
        /// Base URL of the running agent
        agent_url: String,

        /// Supervisor to forward the descriptor to
        #[arg(long)]
        supervisor: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };
    guardian_core::init_tracing(cli.json, level);

    match cli.command {
        Commands::Analyze {
            snapshot,
            rules,
            fail_on_escalate,
        } => cmd_analyze(&snapshot, &rules, fail_on_escalate),
        Commands::Rules { rules } => cmd_rules(&rules),
        Commands::Memory { state_dir } => cmd_memory(&state_dir),
        Commands::Register {
            agent_url,
            supervisor,
        } => cmd_register(&agent_url, supervisor.as_deref()).await,
    }
}

// ========== Analysis ==========

fn load_snapshot(path: &Path) -> Result<PipelineSnapshot> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read snapshot {}", path.display()))?;
    let request: AnalyzeRequest =
        serde_json::from_str(&raw).context("snapshot is not a valid analysis request")?;
    let snapshot = PipelineSnapshot::try_from(request).context("snapshot rejected")?;
    Ok(snapshot)
}

fn render_analysis(snapshot: &PipelineSnapshot, analysis: &Analysis) -> String {
    let mut out = vec![
        format!(
            "Pipeline {} ({} @ {})",
            snapshot.id,
            snapshot.branch,
            snapshot.short_sha()
        ),
        format!(
            "Severity: {}{}",
            analysis.severity.as_str().to_uppercase(),
            if analysis.escalate { " (escalate)" } else { "" }
        ),
        format!("Anomalies: {}", analysis.anomalies.len()),
    ];
    for anomaly in &analysis.anomalies {
        out.push(format!(
            "  [{}] {}: {}",
            anomaly.severity, anomaly.kind, anomaly.description
        ));
    }
    out.push(String::new());
    out.push(analysis.recommendation.clone());
    out.join("\n")
}

fn cmd_analyze(snapshot_path: &Path, rules: &Path, fail_on_escalate: bool) -> Result<()> {
    let snapshot = load_snapshot(snapshot_path)?;
    let policy = PolicyConfig::load(rules);
    info!(policy = %policy.source, "policy loaded");

    let analysis = analyze(&snapshot, &policy.config);
    println!("{}", render_analysis(&snapshot, &analysis));

    if fail_on_escalate && analysis.escalate {
        bail!(
            "pipeline {} requires escalation ({})",
            snapshot.id,
            analysis.severity
        );
    }
    Ok(())
}

// ========== Policy ==========

fn cmd_rules(rules: &Path) -> Result<()> {
    let policy = PolicyConfig::load(rules);
    println!("# source: {}", policy.source);
    print!("{}", policy.config.to_yaml()?);
    Ok(())
}

// ========== Memory ==========

fn memory_report(state_dir: &Path) -> Result<Value> {
    // Opening the tiers creates the directory and an empty log; inspect only.
    if !state_dir.is_dir() {
        bail!("state directory {} does not exist", state_dir.display());
    }
    let memory = MemoryManager::in_dir(state_dir);
    Ok(serde_json::json!({
        "health": memory.health(),
        "run_state": memory.run_state(),
        "metrics": memory.compute_metrics(),
    }))
}

fn cmd_memory(state_dir: &Path) -> Result<()> {
    let report = memory_report(state_dir)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

// ========== Registration ==========

async fn cmd_register(agent_url: &str, supervisor: Option<&str>) -> Result<()> {
    let client = reqwest::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .context("failed to build HTTP client")?;

    let agent = agent_url.trim_end_matches('/');
    let descriptor: AgentDescriptor = client
        .post(format!("{agent}/register"))
        .send()
        .await
        .with_context(|| format!("could not reach agent at {agent}"))?
        .error_for_status()?
        .json()
        .await
        .context("agent returned an invalid descriptor")?;

    print_descriptor(&descriptor);

    let Some(supervisor) = supervisor else {
        println!("No Supervisor URL given; skipping Supervisor registration");
        return Ok(());
    };

    let url = format!("{}/agents/register", supervisor.trim_end_matches('/'));
    let result = client
        .post(&url)
        .json(&descriptor)
        .send()
        .await
        .and_then(|r| r.error_for_status());
    match result {
        Ok(response) => {
            let body: Value = response.json().await.unwrap_or(Value::Null);
            println!("Registered with Supervisor at {supervisor}");
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        // The Supervisor may legitimately be offline during bring-up.
        Err(e) => warn!(error = %e, url = %url, "could not register with Supervisor"),
    }
    Ok(())
}

fn print_descriptor(d: &AgentDescriptor) {
    println!("Agent ID:   {}", d.agent_id);
    println!("Agent Type: {}", d.agent_type);
    println!("Status:     {}", d.status);
    println!("Capabilities:");
    for c in &d.capabilities {
        println!("  - {c}");
    }
    println!("Endpoints:");
    for (name, url) in &d.endpoints {
        println!("  {name}: {url}");
    }
    println!("Policies enforced:");
    for p in &d.metadata.policies_enforced {
        println!("  - {p}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use guardian_core::OverallSeverity;
    use tempfile::tempdir;

    fn write_snapshot(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("snapshot.json");
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_load_snapshot_accepts_request_format() {
        let dir = tempdir().unwrap();
        let path = write_snapshot(
            dir.path(),
            r#"{"pipeline_id":"b-1","status":"Aborted","duration_seconds":5,"branch":"dev","commit_sha":"0123456789"}"#,
        );
        let snapshot = load_snapshot(&path).unwrap();
        assert_eq!(snapshot.id, "b-1");
        assert_eq!(snapshot.short_sha(), "01234567");
    }

    #[test]
    fn test_load_snapshot_rejects_bad_coverage() {
        let dir = tempdir().unwrap();
        let path = write_snapshot(
            dir.path(),
            r#"{"pipeline_id":"b-1","status":"success","duration_seconds":5,"branch":"dev","commit_sha":"x","test_coverage_percent":-1}"#,
        );
        assert!(load_snapshot(&path).is_err());
    }

    #[test]
    fn test_render_analysis_lists_findings() {
        let snapshot = PipelineSnapshot::new(
            "b-2",
            guardian_core::PipelineStatus::Failed,
            10,
            "feature/a",
            "abcdef0123",
        );
        let analysis = analyze(&snapshot, &PolicyConfig::default());
        assert_eq!(analysis.severity, OverallSeverity::High);

        let text = render_analysis(&snapshot, &analysis);
        assert!(text.contains("Pipeline b-2 (feature/a @ abcdef01)"));
        assert!(text.contains("Severity: HIGH (escalate)"));
        assert!(text.contains("[high] build_failure: Pipeline build failed"));
    }

    #[test]
    fn test_cmd_analyze_fail_on_escalate() {
        let dir = tempdir().unwrap();
        let path = write_snapshot(
            dir.path(),
            r#"{"pipeline_id":"b-3","status":"failed","duration_seconds":5,"branch":"dev","commit_sha":"x"}"#,
        );
        let rules = dir.path().join("missing.yaml");
        assert!(cmd_analyze(&path, &rules, false).is_ok());
        assert!(cmd_analyze(&path, &rules, true).is_err());
    }

    #[test]
    fn test_memory_report_on_empty_dir() {
        let dir = tempdir().unwrap();
        let report = memory_report(dir.path()).unwrap();
        assert_eq!(report["metrics"]["total_pipelines_analyzed"], 0);
        assert_eq!(report["health"]["stm"], "missing");
        assert_eq!(report["run_state"]["total_analyzed"], 0);
    }

    #[test]
    fn test_memory_report_rejects_missing_dir() {
        let dir = tempdir().unwrap();
        let typo = dir.path().join("stat");
        let err = memory_report(&typo).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
        assert!(!typo.exists());
    }
}
