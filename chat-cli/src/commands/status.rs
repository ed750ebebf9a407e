//! Show session and configuration.

use anyhow::Result;
use chrono::{TimeZone, Utc};
use std::path::Path;

use crate::config::{CliConfig, Session};

/// Run the status command.
pub async fn run(data_dir: &Path, config: &CliConfig) -> Result<()> {
    println!("=== hmchat status ===");
    println!();

    match Session::load(data_dir).await {
        Ok(session) => {
            println!("Session:");
            println!("  Logged in: {}", format_timestamp(session.created_at));
        }
        Err(_) => {
            println!("Session: NOT LOGGED IN");
            println!();
            println!("Run 'hmchat login' to log in.");
        }
    }

    println!();
    println!("Polling:");
    println!("  Chats every:        {} ms", config.client.poll_frequency_ms);
    println!("  Account data every: {} ms", config.client.account_frequency_ms);
    println!("  Empty batches:      {}", config.client.emit_empty_chats);
    println!();
    println!("API:");
    println!("  Base URL: {}", config.http.base_url);
    println!("  Timeout:  {} s", config.http.request_timeout_secs);
    println!();
    println!("Data dir: {}", data_dir.display());

    Ok(())
}

/// Format a Unix timestamp as a UTC date and time.
fn format_timestamp(ts: i64) -> String {
    match Utc.timestamp_opt(ts, 0).single() {
        Some(at) => at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        None => format!("invalid timestamp {}", ts),
    }
}
