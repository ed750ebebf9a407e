//! Transport abstraction for hmchat.
//!
//! This module provides a pluggable transport layer for the four chat API
//! operations (HTTP for real use, mock for testing).
//!
//! # Design
//!
//! Every operation either resolves with a typed payload or fails with a
//! single [`TransportError`] carrying a human-readable message. Network
//! failures, non-success statuses, malformed bodies and explicit rejections
//! from the service are not distinguished beyond that message.
//!
//! # Example
//!
//! ```ignore
//! let transport = MockTransport::new();
//! let token = transport.exchange_token(&ChatPass::new("ab3de")).await?;
//! let users = transport.fetch_account_data(&token).await?;
//! ```

mod http;
mod mock;

pub use http::{HttpTransport, HttpTransportConfig, DEFAULT_BASE_URL};
pub use mock::{MockCall, MockTransport};

use async_trait::async_trait;
use chat_types::{AccountUsers, ChatPass, ChatToken, ChatsByUser, Destination, Username};
use thiserror::Error;

/// Failure of a transport operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct TransportError {
    message: String,
}

impl TransportError {
    /// Create an error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The human-readable message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Transport trait for the chat API operations.
///
/// Implementations handle the underlying request mechanism
/// (HTTP, mock, etc).
#[async_trait]
pub trait Transport: Send + Sync {
    /// Exchange a chat pass for a token.
    async fn exchange_token(&self, pass: &ChatPass) -> Result<ChatToken, TransportError>;

    /// Fetch every user on the account with their channel memberships.
    async fn fetch_account_data(
        &self,
        token: &ChatToken,
    ) -> Result<AccountUsers, TransportError>;

    /// Fetch chats received by `usernames` after `after` (seconds since epoch).
    async fn fetch_chats(
        &self,
        token: &ChatToken,
        usernames: &[Username],
        after: i64,
    ) -> Result<ChatsByUser, TransportError>;

    /// Send a chat from `sender` to a channel or user.
    async fn send_chat(
        &self,
        token: &ChatToken,
        sender: &str,
        msg: &str,
        destination: &Destination,
    ) -> Result<(), TransportError>;
}
