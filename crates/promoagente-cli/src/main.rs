mod commands;
mod controller;
mod render;
mod repl;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "promoagente")]
#[command(about = "PromoAgente chat client and promotion completeness checker")]
struct Cli {
    /// Backend base URL (overrides `PROMOAGENTE_API_BASE_URL`)
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Interactive chat with the agent (default)
    Chat,
    /// Send one message in the stored session and print the reply
    Send {
        /// Message text
        #[arg(required = true, trailing_var_arg = true)]
        message: Vec<String>,
    },
    /// Show backend subsystem health
    Status,
    /// List promotions stored on the backend
    Promotions,
    /// Start a fresh session id without contacting the backend
    NewSession,
    /// Export every stored promotion to a spreadsheet
    ExportAll,
    /// Inspect or drive the backend's per-session promotion state
    State {
        /// Session id (defaults to the stored session)
        #[arg(long)]
        session: Option<String>,
        #[command(subcommand)]
        command: StateCommands,
    },
    /// Check promotion JSON (object or array) for completeness, offline
    Check {
        /// Path to a JSON file
        file: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, Subcommand)]
enum StateCommands {
    /// Print the raw state
    Show,
    /// Ask the backend to validate the promotion
    Validate,
    /// Print the backend's summary of the promotion
    Summary,
    /// Persist the promotion on the backend
    Save,
    /// E-mail the promotion
    Email,
    /// Discard the backend state for the session
    Reset,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = promoagente_core::load_app_config()?;
    if let Some(api_url) = cli.api_url.as_deref() {
        config = config.with_api_base_url(api_url);
    }

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
    tracing::debug!(env = %config.env, api = %config.api_base_url, "configuration loaded");

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chat => commands::run_chat(&config).await,
        Commands::Send { message } => commands::run_send(&config, &message.join(" ")).await,
        Commands::Status => commands::run_status(&config).await,
        Commands::Promotions => commands::run_promotions(&config).await,
        Commands::NewSession => commands::run_new_session(&config),
        Commands::ExportAll => commands::run_export_all(&config).await,
        Commands::State { session, command } => {
            commands::run_state(&config, session.as_deref(), command).await
        }
        Commands::Check { file } => commands::run_check(&file),
    }
}
