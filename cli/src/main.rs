//! CLI entrypoint for analyst
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Result, bail};
use clap::Parser;
use analyst_application::{
    ProgressBoard, RunQueryInput, RunQueryUseCase, SessionRegistry,
};
use analyst_domain::{SessionStatus, VISUALS_MARKER};
use analyst_infrastructure::{
    ConfigLoader, HttpReasoningGateway, JsonlAuditTrail, reasoning_tool_registry,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "analyst", about = "Ask questions against financial data", version)]
struct Cli {
    /// The question to answer
    question: Option<String>,

    /// Path to a config file (overrides analyst.toml discovery)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Ignore all config files and use built-in defaults
    #[arg(long)]
    no_config: bool,

    /// Authorize visualization output for this query
    #[arg(long)]
    graph: bool,

    /// Run steps one at a time with no repair rounds
    #[arg(long)]
    sequential: bool,

    /// Suppress the header, print only the answer
    #[arg(short, long)]
    quiet: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity level
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref()).map_err(|e| anyhow::anyhow!(e))?
    };

    let question = match cli.question {
        Some(q) => q,
        None => bail!("Question is required."),
    };

    // === Dependency Injection ===
    let gateway = Arc::new(HttpReasoningGateway::new(&config.reasoning));
    let tools = Arc::new(reasoning_tool_registry(Arc::clone(&gateway)));
    let sessions = Arc::new(SessionRegistry::new());
    let progress = Arc::new(ProgressBoard::new());

    let mut params = config.pipeline.to_params();
    if cli.sequential {
        params = params.sequential();
    }

    let mut use_case = RunQueryUseCase::new(gateway, tools, sessions, progress, params);
    if config.audit_log.enabled {
        match JsonlAuditTrail::new(&config.audit_log.path) {
            Some(trail) => {
                info!("Recording interactions to {}", trail.path().display());
                use_case = use_case.with_audit_trail(Arc::new(trail));
            }
            None => warn!("Audit log disabled: could not open {}", config.audit_log.path),
        }
    }

    if !cli.quiet {
        println!();
        println!("Question: {}", question);
        println!();
    }

    let raw = if cli.graph {
        format!("{VISUALS_MARKER} {question}")
    } else {
        question
    };

    let output = use_case.execute(RunQueryInput::new(raw)).await;

    println!("{}", output.answer);

    if output.status != SessionStatus::Completed {
        std::process::exit(1);
    }

    Ok(())
}
