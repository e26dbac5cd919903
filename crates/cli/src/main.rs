//! LibreAssistant CLI — the main entry point.
//!
//! Commands:
//! - `ask`     — Run one orchestrated request against the model service
//! - `plugins` — List the registered plugins
//! - `config`  — Print the default configuration TOML

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "libreassistant",
    about = "LibreAssistant — plugin-orchestrated local AI assistant",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Send one message through the orchestration loop
    Ask {
        /// The user message
        message: String,

        /// Reuse a caller-supplied request id instead of minting one
        #[arg(long)]
        request_id: Option<String>,
    },

    /// List registered plugins
    Plugins,

    /// Print the default configuration TOML
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Ask {
            message,
            request_id,
        } => commands::ask::run(message, request_id).await?,
        Commands::Plugins => commands::plugins::run()?,
        Commands::Config => commands::config_cmd::run()?,
    }

    Ok(())
}
