//! # chat-client
//!
//! Polling client library for the hackmud chat API.
//!
//! This is the main library that applications use to follow chat.
//!
//! ## Features
//!
//! - **Polling Loop**: Refreshes account data and chats on independent intervals
//! - **Fan-out Collapse**: One [`Chat`] per ID, with every recipient recorded
//! - **Typed Events**: Subscribe to started/stopped/error/chats/account-data
//! - **Transport Abstraction**: Pluggable transport layer (HTTP, mock)
//! - **Pure State Machine**: Uses chat-core for side-effect-free logic
//!
//! ## Example
//!
//! ```ignore
//! use chat_client::{ChatClient, ClientConfig, EventHandler, HttpTransport};
//!
//! let client = ChatClient::new(ClientConfig::default(), HttpTransport::new()?);
//! client.on(EventHandler::chats(|chats| {
//!     for chat in chats {
//!         println!("{}: {}", chat.from_user, chat.msg);
//!     }
//! }));
//!
//! // Exchange a chat pass and start polling
//! client.login("ab3de", true).await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod clock;
pub mod config;
pub mod events;
pub mod transport;

pub use chat_core::{AccountData, Chat, ChannelMembers, ClientStatus};
pub use chat_types::{ChatId, ChatPass, ChatToken, Destination};
pub use client::{ChatClient, ClientError};
pub use clock::{Clock, SystemClock};
pub use config::ClientConfig;
pub use events::{EventHandler, EventKind, HandlerId};
pub use transport::{
    HttpTransport, HttpTransportConfig, MockTransport, Transport, TransportError,
    DEFAULT_BASE_URL,
};
