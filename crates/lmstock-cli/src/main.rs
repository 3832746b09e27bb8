mod branches;
mod check;
mod debug;
mod export;
mod notify;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use lmstock_core::{AppConfig, BranchRegistry};
use lmstock_scraper::{FetchSettings, RequestPacer, SignatureDetector, StockClient, StockParser};
use tracing_subscriber::EnvFilter;

use crate::branches::BranchesCommands;
use crate::check::CheckArgs;

#[derive(Debug, Parser)]
#[command(name = "lmstock")]
#[command(about = "Logam Mulia gold-bar stock checker")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Check stock across branches, export the results and send alerts
    Check(CheckArgs),
    /// Inspect or refresh the branch registry
    Branches {
        #[command(subcommand)]
        command: BranchesCommands,
    },
    /// Fetch one branch's stock page and print what the parser sees
    Debug {
        /// Branch code to inspect
        #[arg(long)]
        branch: String,

        /// Weight filter in grams sent with the location change
        #[arg(long)]
        weight: Option<f64>,

        /// Write the raw page body to this path
        #[arg(long)]
        save: Option<PathBuf>,
    },
    /// Verify the Telegram bot token and send a test message
    NotifyTest,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = lmstock_core::load_app_config()?;
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.log_level))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::debug!(?config, "configuration loaded");

    match cli.command {
        Commands::Check(args) => check::run_check_command(&config, &args).await,
        Commands::Branches { command } => branches::run_branches_command(&config, command).await,
        Commands::Debug {
            branch,
            weight,
            save,
        } => debug::run_debug(&config, &branch, weight, save.as_deref()).await,
        Commands::NotifyTest => notify::run_notify_test(&config).await,
    }
}

/// The registry from `LMSTOCK_BRANCHES_PATH` when set, the built-in table otherwise.
fn load_registry(config: &AppConfig) -> anyhow::Result<BranchRegistry> {
    match &config.branches_path {
        Some(path) => {
            let registry = lmstock_core::load_branches(path)?;
            tracing::info!(path = %path.display(), branches = registry.len(), "loaded branch registry");
            Ok(registry)
        }
        None => Ok(BranchRegistry::builtin()),
    }
}

fn build_stock_client(config: &AppConfig) -> anyhow::Result<StockClient> {
    let detector = SignatureDetector::default()
        .with_extra_challenge_markers(config.extra_block_markers.iter().cloned());
    let parser = StockParser::new(Arc::new(detector));
    let pacer = Arc::new(RequestPacer::new(Duration::from_millis(
        config.min_request_spacing_ms,
    )));
    StockClient::new(FetchSettings::from_app_config(config), parser, pacer)
        .map_err(|e| anyhow::anyhow!("failed to build stock client: {e}"))
}
