//! Support copilot CLI
//!
//! Main entry point for the `copilot` command-line tool.
//! Answers support questions from a knowledge base with cited, validated answers.

mod commands;

use clap::{Parser, Subcommand};
use commands::{AskCommand, EvalCommand, SearchCommand};
use copilot_core::{
    config::AppConfig,
    logging::{self, LogFormat},
    AppError, AppResult,
};
use std::path::PathBuf;

/// Support copilot - grounded answers from your knowledge base and past tickets
#[derive(Parser, Debug)]
#[command(name = "copilot")]
#[command(about = "Grounded support answers with citations and validation", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "COPILOT_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "COPILOT_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Log line format (pretty, json)
    #[arg(long, global = true, env = "COPILOT_LOG_FORMAT")]
    log_format: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// LLM provider (ollama, openai)
    #[arg(short, long, global = true, env = "COPILOT_PROVIDER")]
    provider: Option<String>,

    /// Generation model identifier
    #[arg(short, long, global = true, env = "COPILOT_MODEL")]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Answer a support question
    Ask(AskCommand),

    /// Compare base and tuned models over a fixed question set
    Eval(EvalCommand),

    /// Search the KB or ticket corpus directly
    Search(SearchCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    // Resolve workspace and config file first so the right YAML is merged
    let config = AppConfig::load_from(cli.workspace, cli.config)?;

    // Apply the remaining CLI overrides
    let mut config = config.with_overrides(
        None,
        None,
        cli.provider,
        cli.model,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    if let Some(format) = cli.log_format.as_deref() {
        let format = LogFormat::parse(format)
            .ok_or_else(|| AppError::Config(format!("Unknown log format: {}", format)))?;
        config.log_json = format == LogFormat::Json;
    }

    let format = if config.log_json {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    };
    logging::init_logging(config.log_level.as_deref(), config.no_color, format)?;

    tracing::info!("Support copilot starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Provider: {}", config.provider);
    tracing::debug!("Model: {}", config.model);

    config.ensure_state_dir()?;

    let command_name = match &cli.command {
        Commands::Ask(_) => "ask",
        Commands::Eval(_) => "eval",
        Commands::Search(_) => "search",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Eval(cmd) => cmd.execute(&config).await,
        Commands::Search(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
