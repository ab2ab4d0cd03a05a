use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod format;

use commands::{AppContext, SettingsAction};
use config::Config;
use format::{FormatOptions, OutputFormat};
use greenhouse_core::api::{ApiClient, SensorApi};
use greenhouse_core::events::EventDispatcher;
use greenhouse_core::session::{FileTokenStore, SessionStore};

#[derive(Parser)]
#[command(name = "greenhouse")]
#[command(author, version, about = "CLI for the greenhouse monitoring service", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Backend base URL
    #[arg(long, global = true, env = "GREENHOUSE_API_URL")]
    api_url: Option<String>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in to the backend and store the session token
    Login {
        /// Username (prompted when omitted)
        #[arg(short, long)]
        username: Option<String>,

        /// Password (prompted when omitted)
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Log out and clear the stored session token
    Logout,

    /// Show the latest readings with their threshold status
    Status {
        /// Output format (text, json)
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Query historical readings within a time range
    History {
        /// Start of the range (RFC 3339 or YYYY-MM-DD)
        #[arg(long)]
        from: String,

        /// End of the range (RFC 3339 or YYYY-MM-DD)
        #[arg(long)]
        to: String,

        /// Output format (text, json)
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Show or update the threshold configuration
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },

    /// Change the account password
    ChangePassword {
        /// Generate a policy-compliant password instead of prompting
        #[arg(long)]
        suggest: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // When quiet mode is enabled, suppress info-level logging
    let filter = if cli.quiet {
        EnvFilter::new("warn")
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    // Logs go to stderr so JSON output stays pipeable
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load()?;
    let api_url = config.resolve_api_url(cli.api_url.as_deref());
    tracing::debug!("Using backend at {}", api_url);

    let api: Arc<dyn SensorApi> = Arc::new(ApiClient::new(&api_url)?);
    let session = Arc::new(SessionStore::new(FileTokenStore::new()));
    session.hydrate();

    let ctx = AppContext {
        api,
        session,
        events: EventDispatcher::default(),
    };
    let opts = FormatOptions::new(cli.no_color);

    match cli.command {
        Commands::Login { username, password } => {
            commands::cmd_login(&ctx, username, password).await
        }
        Commands::Logout => commands::cmd_logout(&ctx).await,
        Commands::Status { format } => commands::cmd_status(&ctx, format, &opts).await,
        Commands::History { from, to, format } => {
            commands::cmd_history(&ctx, &from, &to, format, &opts).await
        }
        Commands::Settings { action } => commands::cmd_settings(&ctx, action, &opts).await,
        Commands::ChangePassword { suggest } => {
            commands::cmd_change_password(&ctx, suggest).await
        }
    }
}
