//! CLI command implementations.

pub mod channels;
pub mod login;
pub mod send;
pub mod status;
pub mod tail;
pub mod users;

use anyhow::Result;
use chat_client::{AccountData, ChatClient, ClientConfig, MockTransport, Transport};
use chat_types::{AccountUsers, ChatId, ChatsByUser, RawChat, UserChannels};
use std::path::Path;

use crate::config::Session;

/// Offline transport seeded with a small account, used by `--mock`.
pub fn demo_transport() -> MockTransport {
    let transport = MockTransport::new();

    let members = |names: &[&str]| names.iter().map(|n| n.to_string()).collect::<Vec<_>>();
    transport.set_account_data(AccountUsers::from([
        (
            "demo".to_string(),
            UserChannels::from([
                ("0000".to_string(), members(&["demo", "trust"])),
                ("town".to_string(), members(&["demo"])),
            ]),
        ),
        (
            "demo_alt".to_string(),
            UserChannels::from([("0000".to_string(), members(&["demo_alt", "trust"]))]),
        ),
    ]));

    let now = chrono::Utc::now().timestamp() as f64;
    let greeting = RawChat {
        id: ChatId::new("demo-1"),
        t: now,
        from_user: "trust".into(),
        msg: "welcome to hackmud".into(),
        is_join: None,
        is_leave: None,
        channel: Some("0000".into()),
    };
    let chats = ChatsByUser::from([
        ("demo".to_string(), vec![greeting.clone()]),
        ("demo_alt".to_string(), vec![greeting]),
    ]);
    transport.queue_chats(chats);

    transport
}

/// Build a client that uses the saved session's token as is.
pub async fn logged_in_client<T: Transport + 'static>(
    data_dir: &Path,
    config: ClientConfig,
    transport: T,
) -> Result<ChatClient<T>> {
    let session = Session::load(data_dir).await?;
    let client = ChatClient::new(config, transport);
    client.set_token(session.chat_token);
    Ok(client)
}

/// Fetch account data once with the saved session.
pub async fn fetch_account_data<T: Transport>(data_dir: &Path, transport: &T) -> Result<AccountData> {
    let session = Session::load(data_dir).await?;
    let users = transport.fetch_account_data(&session.chat_token).await?;
    Ok(AccountData::from_wire(users))
}
