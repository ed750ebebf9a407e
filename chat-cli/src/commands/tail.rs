//! Follow incoming chats.

use anyhow::Result;
use chat_client::{Chat, ClientStatus, EventHandler, Transport};
use std::path::Path;
use tokio::sync::mpsc;

use super::logged_in_client;
use crate::config::CliConfig;

/// What the event handlers tell the command loop.
enum Signal {
    Printed(usize),
    Stopped,
}

/// Run the tail command.
///
/// Prints chats as they arrive until Ctrl-C, until `count` chats have been
/// printed, or until the loop stops on an error.
pub async fn run<T: Transport + 'static>(
    data_dir: &Path,
    config: &CliConfig,
    transport: T,
    count: Option<usize>,
) -> Result<()> {
    let client = logged_in_client(data_dir, config.client.clone(), transport).await?;
    let (tx, mut rx) = mpsc::unbounded_channel();

    let chats_tx = tx.clone();
    client.on(EventHandler::chats(move |chats| {
        for chat in chats {
            println!("{}", format_chat(chat));
        }
        let _ = chats_tx.send(Signal::Printed(chats.len()));
    }));
    client.on(EventHandler::error(|err| {
        eprintln!("Error: {}", err);
    }));
    client.on(EventHandler::stopped(move || {
        let _ = tx.send(Signal::Stopped);
    }));

    client.start();

    let mut printed = 0;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted");
                client.pause();
                return Ok(());
            }
            signal = rx.recv() => match signal {
                Some(Signal::Printed(n)) => {
                    printed += n;
                    if count.is_some_and(|limit| printed >= limit) {
                        client.pause();
                        return Ok(());
                    }
                }
                Some(Signal::Stopped) | None => {
                    if client.status() == ClientStatus::Errored {
                        anyhow::bail!("Polling stopped after an error");
                    }
                    return Ok(());
                }
            },
        }
    }
}

/// One line per chat: `[HH:MM:SS] #channel user: text` or `[HH:MM:SS] user -> recipients: text`.
pub fn format_chat(chat: &Chat) -> String {
    let time = chat.t.format("%H:%M:%S");

    if chat.is_tell() {
        let to: Vec<&str> = chat.to_users.iter().map(String::as_str).collect();
        return format!("[{}] {} -> {}: {}", time, chat.from_user, to.join(","), chat.msg);
    }

    let channel = chat.channel.as_deref().unwrap_or_default();
    if chat.is_join {
        format!("[{}] #{} -- {} joined", time, channel, chat.from_user)
    } else if chat.is_leave {
        format!("[{}] #{} -- {} left", time, channel, chat.from_user)
    } else {
        format!("[{}] #{} {}: {}", time, channel, chat.from_user, chat.msg)
    }
}
