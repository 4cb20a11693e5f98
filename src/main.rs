// file: src/main.rs
// description: commandline application entry point
// reference: application bootstrap and orchestration

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use ioc_graph::utils::logging::{Stage, format_stage, summary_lines};
use ioc_graph::{Config, PipelineOrchestrator};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "ioc_graph")]
#[command(author = "cipher")]
#[command(version = "0.1.0")]
#[command(about = "Extract emails, IPv4 and Bitcoin addresses from a corpus into a Neo4j graph", long_about = None)]
struct Cli {
    /// Folder to walk recursively
    input: PathBuf,

    /// Tab-separated report to create (overwritten if present)
    report: PathBuf,

    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = "config/default.toml"
    )]
    config: PathBuf,

    #[arg(short, long, value_name = "NUM")]
    workers: Option<usize>,

    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    color: bool,

    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,

    #[arg(long, action = ArgAction::SetTrue)]
    no_progress: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    ioc_graph::utils::logging::init_logger(cli.color, cli.verbose);
    colored::control::set_override(cli.color);

    println!("{}", format_stage(Stage::Configure));
    info!("Loading configuration from: {}", cli.config.display());

    if !cli.config.exists() {
        warn!(
            "Config file {} not found, using defaults and environment",
            cli.config.display()
        );
    }
    let mut config =
        Config::load(Some(cli.config.as_path())).context("Failed to load configuration")?;

    if let Some(workers) = cli.workers {
        config.pipeline.parallel_workers = workers;
    }
    if cli.no_progress {
        config.pipeline.show_progress = false;
    }

    println!("{}", format_stage(Stage::Connect));
    let orchestrator = PipelineOrchestrator::new(config)
        .context("Failed to configure pipeline")?
        .with_color(cli.color);

    let cancel = orchestrator.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received; finishing in-flight files");
            cancel.cancel();
        }
    });

    println!("{}", format_stage(Stage::Process));
    let summary = orchestrator
        .run(&cli.input, &cli.report)
        .await
        .context("Run aborted")?;

    println!();
    for line in summary_lines(&summary, &cli.report) {
        println!("{}", line);
    }
    Ok(())
}
