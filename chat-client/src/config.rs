//! Configuration for [`ChatClient`](crate::ChatClient).
//!
//! Every field has a default, so a partial TOML or JSON document deserializes
//! into a complete configuration with only the given fields overridden.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for ChatClient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Delay between loop iterations, and the minimum gap between chat
    /// requests, in milliseconds.
    pub poll_frequency_ms: u64,
    /// Minimum gap between account-data requests, in milliseconds.
    pub account_frequency_ms: u64,
    /// Emit chats-received even when a refresh found nothing new.
    pub emit_empty_chats: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            poll_frequency_ms: 2 * 1000,
            account_frequency_ms: 5 * 60 * 1000,
            emit_empty_chats: true,
        }
    }
}

impl ClientConfig {
    /// Set the poll frequency.
    pub fn with_poll_frequency(mut self, every: Duration) -> Self {
        self.poll_frequency_ms = duration_to_millis(every);
        self
    }

    /// Set the account-data refresh frequency.
    pub fn with_account_frequency(mut self, every: Duration) -> Self {
        self.account_frequency_ms = duration_to_millis(every);
        self
    }

    /// Choose whether empty chat batches are emitted.
    pub fn with_emit_empty_chats(mut self, emit: bool) -> Self {
        self.emit_empty_chats = emit;
        self
    }

    /// Poll frequency as a duration.
    pub fn poll_frequency(&self) -> Duration {
        Duration::from_millis(self.poll_frequency_ms)
    }

    /// Account-data refresh frequency as a duration.
    pub fn account_frequency(&self) -> Duration {
        Duration::from_millis(self.account_frequency_ms)
    }
}

fn duration_to_millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
