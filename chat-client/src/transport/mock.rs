//! Mock transport for testing.
//!
//! Allows scripting responses and capturing calls for verification.

use super::{Transport, TransportError};
use async_trait::async_trait;
use chat_types::{AccountUsers, ChatPass, ChatToken, ChatsByUser, Destination, Username};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A call the mock received.
#[derive(Debug, Clone, PartialEq)]
pub enum MockCall {
    /// `exchange_token`
    ExchangeToken {
        /// The pass that was exchanged.
        pass: ChatPass,
    },
    /// `fetch_account_data`
    FetchAccountData {
        /// Token used.
        token: ChatToken,
    },
    /// `fetch_chats`
    FetchChats {
        /// Token used.
        token: ChatToken,
        /// Users requested.
        usernames: Vec<Username>,
        /// Lower bound in seconds.
        after: i64,
    },
    /// `send_chat`
    SendChat {
        /// Token used.
        token: ChatToken,
        /// Sending user.
        sender: String,
        /// Text.
        msg: String,
        /// Channel or user.
        destination: Destination,
    },
}

/// Mock transport for testing.
///
/// Account data is sticky: every fetch returns the last value set. Chat
/// responses are queued and consumed one per fetch; an empty queue yields no
/// chats. A chat fetch can be held in flight with [`delay_next_chats`].
///
/// [`delay_next_chats`]: MockTransport::delay_next_chats
#[derive(Debug, Default)]
pub struct MockTransport {
    inner: Arc<Mutex<MockTransportInner>>,
}

#[derive(Debug, Default)]
struct MockTransportInner {
    token: Option<ChatToken>,
    account_data: AccountUsers,
    chat_queue: VecDeque<ChatsByUser>,
    calls: Vec<MockCall>,
    fail_next_exchange: Option<String>,
    fail_next_account_data: Option<String>,
    fail_next_chats: Option<String>,
    fail_next_send: Option<String>,
    delay_next_chats: Option<Duration>,
}

impl MockTransport {
    /// Token returned by `exchange_token` unless another is set.
    pub const DEFAULT_TOKEN: &'static str = "mock-chat-token";

    /// Create a new mock transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the token that `exchange_token` returns.
    pub fn set_token(&self, token: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.token = Some(ChatToken::new(token));
    }

    /// Set the account data every `fetch_account_data` returns.
    pub fn set_account_data(&self, users: AccountUsers) {
        let mut inner = self.inner.lock().unwrap();
        inner.account_data = users;
    }

    /// Queue a response for the next `fetch_chats` call.
    pub fn queue_chats(&self, chats: ChatsByUser) {
        let mut inner = self.inner.lock().unwrap();
        inner.chat_queue.push_back(chats);
    }

    /// Get all calls received, oldest first.
    pub fn calls(&self) -> Vec<MockCall> {
        let inner = self.inner.lock().unwrap();
        inner.calls.clone()
    }

    /// Get the `(usernames, after)` of every chat fetch.
    pub fn chat_requests(&self) -> Vec<(Vec<Username>, i64)> {
        let inner = self.inner.lock().unwrap();
        inner
            .calls
            .iter()
            .filter_map(|call| match call {
                MockCall::FetchChats {
                    usernames, after, ..
                } => Some((usernames.clone(), *after)),
                _ => None,
            })
            .collect()
    }

    /// Number of account-data fetches received.
    pub fn account_data_requests(&self) -> usize {
        let inner = self.inner.lock().unwrap();
        inner
            .calls
            .iter()
            .filter(|call| matches!(call, MockCall::FetchAccountData { .. }))
            .count()
    }

    /// Get the last call received.
    pub fn last_call(&self) -> Option<MockCall> {
        let inner = self.inner.lock().unwrap();
        inner.calls.last().cloned()
    }

    /// Cause the next exchange_token() to fail with the given message.
    pub fn fail_next_exchange(&self, error: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_next_exchange = Some(error.to_string());
    }

    /// Cause the next fetch_account_data() to fail with the given message.
    pub fn fail_next_account_data(&self, error: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_next_account_data = Some(error.to_string());
    }

    /// Cause the next fetch_chats() to fail with the given message.
    pub fn fail_next_chats(&self, error: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_next_chats = Some(error.to_string());
    }

    /// Cause the next send_chat() to fail with the given message.
    pub fn fail_next_send(&self, error: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_next_send = Some(error.to_string());
    }

    /// Hold the next fetch_chats() for `delay` before it answers.
    ///
    /// The call is recorded and its response picked when it starts.
    pub fn delay_next_chats(&self, delay: Duration) {
        let mut inner = self.inner.lock().unwrap();
        inner.delay_next_chats = Some(delay);
    }
}

impl Clone for MockTransport {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn exchange_token(&self, pass: &ChatPass) -> Result<ChatToken, TransportError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(MockCall::ExchangeToken { pass: pass.clone() });

        if let Some(error) = inner.fail_next_exchange.take() {
            return Err(TransportError::new(error));
        }

        Ok(inner
            .token
            .clone()
            .unwrap_or_else(|| ChatToken::new(Self::DEFAULT_TOKEN)))
    }

    async fn fetch_account_data(
        &self,
        token: &ChatToken,
    ) -> Result<AccountUsers, TransportError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(MockCall::FetchAccountData {
            token: token.clone(),
        });

        if let Some(error) = inner.fail_next_account_data.take() {
            return Err(TransportError::new(error));
        }

        Ok(inner.account_data.clone())
    }

    async fn fetch_chats(
        &self,
        token: &ChatToken,
        usernames: &[Username],
        after: i64,
    ) -> Result<ChatsByUser, TransportError> {
        let (result, delay) = {
            let mut inner = self.inner.lock().unwrap();
            inner.calls.push(MockCall::FetchChats {
                token: token.clone(),
                usernames: usernames.to_vec(),
                after,
            });

            let result = match inner.fail_next_chats.take() {
                Some(error) => Err(TransportError::new(error)),
                None => Ok(inner.chat_queue.pop_front().unwrap_or_default()),
            };
            (result, inner.delay_next_chats.take())
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        result
    }

    async fn send_chat(
        &self,
        token: &ChatToken,
        sender: &str,
        msg: &str,
        destination: &Destination,
    ) -> Result<(), TransportError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(MockCall::SendChat {
            token: token.clone(),
            sender: sender.to_string(),
            msg: msg.to_string(),
            destination: destination.clone(),
        });

        if let Some(error) = inner.fail_next_send.take() {
            return Err(TransportError::new(error));
        }

        Ok(())
    }
}
