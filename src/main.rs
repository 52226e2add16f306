//! issue-planner CLI - Issue service with LLM analysis and planning.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use issue_planner::models::EXAMPLE_CONFIG;
use issue_planner::{AppState, Config, Issue, create_client, server};
use std::path::PathBuf;
use std::sync::Arc;
use issue_planner::logging::{self, LogGuard};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "issue-planner")]
#[command(author = "Infernet <dev@infernet.org>")]
#[command(version)]
#[command(about = "In-memory issue service with pluggable LLM analysis and planning")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to configuration file
    #[arg(short, long, global = true, default_value = "config.toml")]
    config: PathBuf,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve,

    /// Analyze a single issue and print the result
    Analyze {
        /// Path to issue JSON file
        #[arg(short, long)]
        issue: PathBuf,
    },

    /// Generate a plan for a single issue and print it
    Plan {
        /// Path to issue JSON file
        #[arg(short, long)]
        issue: PathBuf,
    },

    /// Validate configuration file
    Validate,

    /// Show example configuration
    Example,
}

fn load_config(cli: &Cli) -> Result<(Config, LogGuard)> {
    let config = Config::load(&cli.config)
        .with_context(|| format!("Failed to load config from {:?}", cli.config))?;
    let guard = logging::init(&config.logging, cli.verbose).context("Failed to set up logging")?;

    if !cli.config.exists() {
        warn!(path = %cli.config.display(), "Config file not found, using defaults");
    }
    config.validate().context("Invalid configuration")?;
    Ok((config, guard))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Example => {
            println!("{EXAMPLE_CONFIG}");
        }

        Commands::Validate => {
            let (config, _guard) = load_config(&cli)?;

            info!("Configuration is valid");
            info!("  Server: {}", config.server.addr());
            info!("  Log level: {}", config.logging.level);
            if !config.logging.dir.is_empty() {
                info!("  Log files: {}", config.logging.dir);
            }
            info!("  LLM provider: {}", config.llm.provider);
            if config.llm.provider == "anthropic" {
                info!(
                    "  Anthropic model: {} (max {} attempts)",
                    config.llm.anthropic.model, config.llm.anthropic.max_retries
                );
            }
        }

        Commands::Serve => {
            let (config, _guard) = load_config(&cli)?;
            let llm = create_client(&config.llm).context("Failed to create LLM client")?;
            let state = Arc::new(AppState::new(llm));
            server::serve(&config.server, state).await?;
        }

        Commands::Analyze { issue } => {
            let (config, _guard) = load_config(&cli)?;
            let llm = create_client(&config.llm).context("Failed to create LLM client")?;
            let issue = Issue::from_file(issue)?;

            let analysis = llm.analyze_issue(&issue).await?;
            println!("{}", serde_json::to_string_pretty(&analysis)?);
        }

        Commands::Plan { issue } => {
            let (config, _guard) = load_config(&cli)?;
            let llm = create_client(&config.llm).context("Failed to create LLM client")?;
            let issue = Issue::from_file(issue)?;

            let plan = llm.plan_issue(&issue).await?;
            println!("{}", serde_json::to_string_pretty(&plan)?);
        }
    }

    Ok(())
}
