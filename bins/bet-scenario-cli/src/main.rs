//! Betting Scenario CLI
//!
//! Commands:
//! - `simple`: single bet, balance deduction and payout check
//! - `combo`: combination bet with total-odds reconciliation
//! - `error-flow`: invalid sport/tournament and oversized stake
//! - `all`: every scenario in sequence
//!
//! # Usage
//! ```bash
//! # Against the public mock service
//! bet_scenarios simple
//!
//! # Against a local deployment, report to file
//! BASE_URL=http://localhost:8000 bet_scenarios all --out reports/run.json
//!
//! # Custom config directory and tighter timeout
//! bet_scenarios combo --configs ./configs --timeout-secs 60
//! ```
//!
//! Exits non-zero when any scenario fails.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info, warn};

use betting_client::scenario::{RunnerSettings, ScenarioKind, ScenarioReport, ScenarioRunner};

#[derive(Parser)]
#[command(name = "bet_scenarios")]
#[command(about = "End-to-end betting scenarios against the sports-betting mock API")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// API base URL (default: BASE_URL env var, then the public mock service)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Directory holding simple_bet.json, combo_bet.json and error_flow.json
    #[arg(long, global = true)]
    configs: Option<PathBuf>,

    /// Overall timeout per scenario in seconds
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    /// Output file for the JSON report (optional, defaults to stdout)
    #[arg(long, global = true)]
    out: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Place one bet and verify balance and potential winnings
    Simple,

    /// Build and place a combination bet
    Combo,

    /// Expect failures for an unknown sport and an oversized stake
    ErrorFlow,

    /// Run every scenario in sequence
    All,
}

impl Commands {
    fn scenarios(&self) -> Vec<ScenarioKind> {
        match self {
            Commands::Simple => vec![ScenarioKind::SimpleBet],
            Commands::Combo => vec![ScenarioKind::ComboBet],
            Commands::ErrorFlow => vec![ScenarioKind::ErrorFlow],
            Commands::All => ScenarioKind::ALL.to_vec(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let mut settings = RunnerSettings::from_env();
    if let Some(base_url) = cli.base_url {
        settings.base_url = base_url;
    }
    if let Some(dir) = cli.configs {
        settings.config_dir = dir;
    }
    if let Some(secs) = cli.timeout_secs {
        settings.scenario_timeout = Duration::from_secs(secs);
    }

    info!("=== Betting Scenarios ===");
    info!("Base URL: {}", settings.base_url);
    info!("Configs: {}", settings.config_dir.display());
    info!("Scenario timeout: {}s", settings.scenario_timeout.as_secs());
    info!("");

    let runner = ScenarioRunner::new(settings);
    let reports = tokio::select! {
        reports = run_scenarios(&runner, cli.command.scenarios()) => reports,
        _ = tokio::signal::ctrl_c() => {
            warn!("Received Ctrl+C, aborting run");
            anyhow::bail!("interrupted");
        }
    };

    write_report(&reports, cli.out).await?;

    let failed: Vec<_> =
        reports.iter().filter(|r| !r.passed).map(|r| r.scenario.as_str()).collect();
    info!("");
    info!("=== Summary ===");
    info!("Passed: {}/{}", reports.len() - failed.len(), reports.len());

    if !failed.is_empty() {
        error!("Failed: {}", failed.join(", "));
        anyhow::bail!("{} scenario(s) failed", failed.len());
    }

    Ok(())
}

async fn run_scenarios(runner: &ScenarioRunner, kinds: Vec<ScenarioKind>) -> Vec<ScenarioReport> {
    let mut reports = Vec::with_capacity(kinds.len());
    for kind in kinds {
        reports.push(runner.run(kind).await);
    }
    reports
}

async fn write_report(reports: &[ScenarioReport], out: Option<PathBuf>) -> Result<()> {
    let json_output = serde_json::to_string_pretty(reports)?;

    // Write to file or stdout
    if let Some(out_path) = out {
        if let Some(parent) = out_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        tokio::fs::write(&out_path, &json_output)
            .await
            .with_context(|| format!("failed to write {}", out_path.display()))?;
        info!("Report written to: {}", out_path.display());
    } else {
        println!("{}", json_output);
    }

    Ok(())
}
