//! Credential and identity types for the chat API.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A username in the game.
pub type Username = String;

/// A channel name.
pub type Channel = String;

/// A short-lived chat pass, obtained in game with `chat_pass`.
///
/// Passes are exchanged once for a long-lived [`ChatToken`].
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatPass(String);

impl ChatPass {
    /// Length of a chat pass in characters.
    pub const LEN: usize = 5;

    /// Wrap a pass string.
    pub fn new(pass: impl Into<String>) -> Self {
        Self(pass.into())
    }

    /// Get the pass as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ChatPass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ChatPass([REDACTED])")
    }
}

/// An opaque authentication token sent with every request.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatToken(String);

impl ChatToken {
    /// Wrap a token string.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Get the token as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ChatToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ChatToken([REDACTED])")
    }
}

/// A chat identifier, unique across the whole service.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(String);

impl ChatId {
    /// Wrap an identifier string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChatId({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_debug_is_redacted() {
        let token = ChatToken::new("super-secret-token");
        let debug = format!("{:?}", token);
        assert_eq!(debug, "ChatToken([REDACTED])");
        assert!(!debug.contains("super-secret"));
    }

    #[test]
    fn pass_debug_is_redacted() {
        let debug = format!("{:?}", ChatPass::new("ab3de"));
        assert!(!debug.contains("ab3de"));
    }

    #[test]
    fn ids_serialize_as_plain_strings() {
        let json = serde_json::to_string(&ChatId::new("5f1e")).unwrap();
        assert_eq!(json, "\"5f1e\"");

        let token: ChatToken = serde_json::from_str("\"tok\"").unwrap();
        assert_eq!(token.as_str(), "tok");
    }

    #[test]
    fn chat_id_display() {
        assert_eq!(ChatId::new("abc123").to_string(), "abc123");
    }
}
