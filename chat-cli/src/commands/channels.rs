//! List joined channels and their members.

use anyhow::Result;
use chat_client::{ChannelMembers, Transport};
use std::path::Path;

use super::fetch_account_data;

/// Run the channels command.
///
/// Without `user`, channels of every user are merged; when two users share a
/// channel name the later user's member list is shown.
pub async fn run<T: Transport>(data_dir: &Path, transport: T, user: Option<&str>) -> Result<()> {
    let data = fetch_account_data(data_dir, &transport).await?;

    let channels = match user {
        Some(user) => match data.channels_of(user) {
            Some(channels) => channels.clone(),
            None => anyhow::bail!("No user named {} on this account", user),
        },
        None => data.channels(),
    };

    for line in format_channels(&channels) {
        println!("{}", line);
    }
    Ok(())
}

fn format_channels(channels: &ChannelMembers) -> Vec<String> {
    channels
        .iter()
        .map(|(name, members)| {
            let members: Vec<&str> = members.iter().map(String::as_str).collect();
            format!("#{} ({}): {}", name, members.len(), members.join(", "))
        })
        .collect()
}
