//! # hmchat
//!
//! Command-line client for hackmud chat.
//!
//! ## Commands
//!
//! - `login`: Exchange a chat pass (or store a token) and save the session
//! - `logout`: Forget the saved session
//! - `status`: Show session and configuration
//! - `tail`: Follow incoming chats until Ctrl-C
//! - `send`: Send a chat to a channel or user
//! - `users`: List the account's users
//! - `channels`: List joined channels and their members
//!
//! ## Example
//!
//! ```bash
//! # Log in with the pass from `chat_pass` in game
//! hmchat login ab3de
//!
//! # Follow chat
//! hmchat tail
//!
//! # Talk
//! hmchat send --from alice --channel 0000 "hello"
//! hmchat send --from alice --tell bob "hi bob"
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use chat_client::{HttpTransport, Transport};

mod commands;
mod config;

use commands::{channels, login, send, status, tail, users};
use config::CliConfig;

const DEFAULT_FILTER: &str = "warn,hmchat=info";
const VERBOSE_FILTER: &str = "info,hmchat=debug";

/// Command-line client for hackmud chat.
#[derive(Parser, Debug)]
#[command(name = "hmchat")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Data directory for the session and config files
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Config file (default: <data-dir>/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Use an offline mock API instead of the real service (for testing/demo)
    #[arg(long, global = true)]
    mock: bool,

    /// Log debug output to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Log in with a chat pass or token
    Login {
        /// Chat pass (5 characters) or token (will prompt if not provided)
        credential: Option<String>,
    },

    /// Forget the saved session
    Logout,

    /// Show session and configuration
    Status,

    /// Follow incoming chats
    Tail {
        /// Exit after printing this many chats
        #[arg(long)]
        count: Option<usize>,
    },

    /// Send a chat
    Send {
        /// User to send as
        #[arg(long)]
        from: String,

        /// Channel to post in
        #[arg(long, conflicts_with = "tell", required_unless_present = "tell")]
        channel: Option<String>,

        /// User to send a tell to
        #[arg(long, conflicts_with = "channel")]
        tell: Option<String>,

        /// Message text
        message: String,
    },

    /// List the account's users
    Users,

    /// List joined channels and their members
    Channels {
        /// Only show channels of this user
        #[arg(long)]
        user: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Determine data directory
    let data_dir = match cli.data_dir {
        Some(dir) => dir,
        None => default_data_dir()?,
    };

    // Ensure data directory exists
    tokio::fs::create_dir_all(&data_dir)
        .await
        .context("Failed to create data directory")?;

    // An explicit --config must exist; the default one is optional
    let config = match cli.config.as_deref() {
        Some(path) => CliConfig::from_file(path)?,
        None => CliConfig::load(&CliConfig::default_path(&data_dir))?,
    };

    if cli.mock {
        dispatch(cli.command, &data_dir, &config, commands::demo_transport()).await
    } else {
        let transport = HttpTransport::with_config(config.http.clone())?;
        dispatch(cli.command, &data_dir, &config, transport).await
    }
}

async fn dispatch<T: Transport + 'static>(
    command: Commands,
    data_dir: &Path,
    config: &CliConfig,
    transport: T,
) -> Result<()> {
    match command {
        Commands::Login { credential } => {
            login::run(data_dir, config, transport, credential.as_deref()).await?;
        }
        Commands::Logout => {
            login::logout(data_dir).await?;
        }
        Commands::Status => {
            status::run(data_dir, config).await?;
        }
        Commands::Tail { count } => {
            tail::run(data_dir, config, transport, count).await?;
        }
        Commands::Send {
            from,
            channel,
            tell,
            message,
        } => {
            let destination = send::destination(channel, tell)?;
            send::run(data_dir, config, transport, &from, &message, destination).await?;
        }
        Commands::Users => {
            users::run(data_dir, transport).await?;
        }
        Commands::Channels { user } => {
            channels::run(data_dir, transport, user.as_deref()).await?;
        }
    }

    Ok(())
}

/// Install the stderr subscriber; `RUST_LOG` overrides the built-in filter.
fn init_logging(verbose: bool) {
    let fallback = if verbose { VERBOSE_FILTER } else { DEFAULT_FILTER };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Get the default data directory for hmchat.
fn default_data_dir() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("com", "hmchat", "hmchat")
        .context("Could not determine home directory")?;
    Ok(dirs.data_dir().to_path_buf())
}
