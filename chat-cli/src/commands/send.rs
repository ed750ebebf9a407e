//! Send a chat.

use anyhow::Result;
use chat_client::{Destination, Transport};
use std::path::Path;

use super::logged_in_client;
use crate::config::CliConfig;

/// Pick the destination from the `--channel` / `--tell` flags.
pub fn destination(channel: Option<String>, tell: Option<String>) -> Result<Destination> {
    match (channel, tell) {
        (Some(channel), None) => Ok(Destination::Channel(channel)),
        (None, Some(user)) => Ok(Destination::Tell(user)),
        (Some(_), Some(_)) => anyhow::bail!("Specify only one of --channel or --tell"),
        (None, None) => anyhow::bail!("Must specify either --channel or --tell"),
    }
}

/// Run the send command.
pub async fn run<T: Transport + 'static>(
    data_dir: &Path,
    config: &CliConfig,
    transport: T,
    from: &str,
    message: &str,
    destination: Destination,
) -> Result<()> {
    if message.is_empty() {
        anyhow::bail!("Message is empty");
    }

    let client = logged_in_client(data_dir, config.client.clone(), transport).await?;
    client.send_chat(from, message, destination.clone()).await?;

    match destination {
        Destination::Channel(channel) => println!("Sent to #{} as {}.", channel, from),
        Destination::Tell(user) => println!("Sent to {} as {}.", user, from),
    }
    Ok(())
}
