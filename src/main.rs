//! docweave CLI
//!
//! Loads configuration, wires the catalog, endpoint, and message store
//! together, runs the configured strategy to completion, and prints the
//! generated documents.

use clap::Parser;
use docweave::config::OrchestratorConfig;
use docweave::endpoint::{HttpGenerationEndpoint, InMemoryMessageStore};
use docweave::error::{OrchestratorError, OrchestratorResult};
use docweave::observability::init_default_logging;
use docweave::pipeline::{PipelineMachine, PipelineNotification};
use docweave::retry::RetryPolicy;
use docweave::strategy::{BuiltinCatalog, StrategyCatalog};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "docweave", version, about = "Multi-step documentation generation pipeline")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, default_value = "docweave.toml")]
    config: PathBuf,

    /// Strategy to run (overrides the configured one)
    #[arg(long)]
    strategy: Option<String>,

    /// List available strategies and exit
    #[arg(long)]
    list_strategies: bool,
}

#[tokio::main]
async fn main() {
    init_default_logging();

    if let Err(e) = run(Cli::parse()).await {
        error!(error = %e.user_message(), "Pipeline run failed");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> OrchestratorResult<()> {
    let catalog = BuiltinCatalog::new();

    if cli.list_strategies {
        for strategy in catalog.list_strategies() {
            println!(
                "{} ({} steps): {}",
                strategy.name,
                strategy.step_count(),
                strategy.description
            );
        }
        return Ok(());
    }

    let config = OrchestratorConfig::load_from_file(&cli.config)?;
    let strategy_name = cli
        .strategy
        .unwrap_or_else(|| config.pipeline.strategy.clone());
    let strategy = catalog
        .get_strategy(&strategy_name)
        .ok_or_else(|| OrchestratorError::setup(format!("unknown strategy '{strategy_name}'")))?
        .clone();

    let api_key = config.api_key()?;
    let endpoint = HttpGenerationEndpoint::new(
        config.endpoint.base_url.clone(),
        api_key,
        Duration::from_secs(config.endpoint.timeout_secs),
    )?;
    let store = Arc::new(InMemoryMessageStore::new());

    let (notify_tx, mut notify_rx) = mpsc::unbounded_channel();
    let progress = tokio::spawn(async move {
        while let Some(notification) = notify_rx.recv().await {
            match notification {
                PipelineNotification::StepCompleted {
                    step_index,
                    context_key,
                    usage,
                } => info!(
                    step_index,
                    key = %context_key,
                    tokens = usage.total_tokens,
                    "Step completed"
                ),
                PipelineNotification::StepFailed { step_index, reason } => {
                    error!(step_index, reason = %reason, "Step failed")
                }
                PipelineNotification::AllDone => info!("All steps completed"),
            }
        }
    });

    let mut machine = PipelineMachine::new(
        strategy,
        Arc::new(endpoint),
        store,
        config.pipeline.pipeline_key.clone(),
        RetryPolicy::from(&config.retry),
    )
    .with_notifier(notify_tx);

    machine.start().await?;

    for (key, entry) in &machine.state().context {
        println!("=== {key} ({}) ===\n", entry.variant);
        println!("{}\n", entry.formatted);
    }

    drop(machine);
    let _ = progress.await;
    Ok(())
}
