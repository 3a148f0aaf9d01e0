//! Quorum CLI: the main entry point.
//!
//! Commands:
//! - `ask`: Send one query to an agent
//! - `chat`: Interactive session with conversation history
//! - `agents`: List registered agents
//! - `config`: Show, validate or initialize configuration

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "quorum",
    about = "Quorum: multi-agent assistant with tool use and delegation",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file to use instead of ~/.quorum/config.toml
    #[arg(long, global = true, env = "QUORUM_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a single query and print the answer
    Ask {
        query: String,

        /// Agent to ask (defaults to agent.default_agent)
        #[arg(short, long)]
        agent: Option<String>,

        /// Database schema handed to agents that use one
        #[arg(long)]
        schema: Option<String>,

        /// Data summary handed to agents that use one
        #[arg(long)]
        data_summary: Option<String>,
    },

    /// Chat interactively; earlier turns are passed as history
    Chat {
        #[arg(short, long)]
        agent: Option<String>,
    },

    /// List registered agents
    Agents,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration (secrets redacted)
    Show,
    /// Check the configuration and report problems
    Validate,
    /// Print the config file path
    Path,
    /// Write a default config file if none exists
    Init,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Ask {
            query,
            agent,
            schema,
            data_summary,
        } => {
            let extra = commands::ask::ExtraContext { schema, data_summary };
            commands::ask::run(config_path, &query, agent, extra).await?
        }
        Commands::Chat { agent } => commands::chat::run(config_path, agent).await?,
        Commands::Agents => commands::agents::run(config_path).await?,
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config_cmd::show(config_path).await?,
            ConfigAction::Validate => commands::config_cmd::validate(config_path).await?,
            ConfigAction::Path => commands::config_cmd::path(config_path).await?,
            ConfigAction::Init => commands::config_cmd::init().await?,
        },
    }

    Ok(())
}
