//! List the account's users.

use anyhow::Result;
use chat_client::Transport;
use std::path::Path;

use super::fetch_account_data;

/// Run the users command.
pub async fn run<T: Transport>(data_dir: &Path, transport: T) -> Result<()> {
    let data = fetch_account_data(data_dir, &transport).await?;

    if data.is_empty() {
        println!("No users on this account.");
        return Ok(());
    }

    for (user, channels) in data.iter() {
        println!("{} ({} channels)", user, channels.len());
    }
    Ok(())
}
