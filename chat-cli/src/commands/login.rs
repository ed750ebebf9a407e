//! Log in and out.

use anyhow::{Context, Result};
use chat_client::{ChatClient, Transport};
use std::path::Path;

use crate::config::{CliConfig, Session};

/// Run the login command.
pub async fn run<T: Transport + 'static>(
    data_dir: &Path,
    config: &CliConfig,
    transport: T,
    credential: Option<&str>,
) -> Result<()> {
    let credential = match credential {
        Some(c) => c.to_string(),
        None => rpassword::prompt_password("Chat pass or token: ")
            .context("Failed to read credential")?,
    };
    let credential = credential.trim();
    if credential.is_empty() {
        anyhow::bail!("No credential given");
    }

    let client = ChatClient::new(config.client.clone(), transport);
    client.login(credential, false).await.context("Login failed")?;
    let token = client.token().context("Login did not produce a token")?;

    Session::new(token).save(data_dir).await?;

    println!("Logged in.");
    println!();
    println!("  Session: {}", data_dir.join("session.json").display());
    println!();
    println!("Next steps:");
    println!("  hmchat users");
    println!("  hmchat tail");

    Ok(())
}

/// Run the logout command.
pub async fn logout(data_dir: &Path) -> Result<()> {
    if Session::remove(data_dir).await? {
        println!("Logged out.");
    } else {
        println!("Not logged in.");
    }
    Ok(())
}
