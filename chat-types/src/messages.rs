//! Request and response bodies for the `/mobile/*.json` endpoints.
//!
//! Every endpoint takes a JSON object via POST and answers with a JSON object
//! carrying an `ok` flag. Failures come back as [`ApiFailure`].

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use indexmap::IndexMap;

use crate::{Channel, ChatId, ChatPass, ChatToken, Username, WireError};

/// Channel name to member usernames, as seen by one user.
pub type UserChannels = IndexMap<Channel, Vec<Username>>;

/// Username to that user's channels, in the order the server listed them.
pub type AccountUsers = IndexMap<Username, UserChannels>;

/// Chats grouped by the username that received them.
///
/// A chat delivered to several of the account's users appears once under
/// each of them. Key order is the order the server sent.
pub type ChatsByUser = IndexMap<Username, Vec<RawChat>>;

/// Exchange a chat pass for a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetTokenRequest {
    /// The 5 character pass
    pub pass: ChatPass,
}

/// Response to [`GetTokenRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetTokenResponse {
    /// Always true on success
    pub ok: bool,
    /// Long-lived token for subsequent requests
    pub chat_token: ChatToken,
}

/// Fetch the account's users and their channel memberships.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountDataRequest {
    /// Authentication token
    pub chat_token: ChatToken,
}

/// Response to [`AccountDataRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountDataResponse {
    /// Always true on success
    pub ok: bool,
    /// Username to that user's channels
    pub users: AccountUsers,
}

/// Fetch chats received by a set of users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatsRequest {
    /// Authentication token
    pub chat_token: ChatToken,
    /// Users whose chats to fetch
    pub usernames: Vec<Username>,
    /// Only chats strictly before this time (seconds since epoch)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before: Option<i64>,
    /// Only chats after this time (seconds since epoch)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<i64>,
}

/// Response to [`ChatsRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatsResponse {
    /// Always true on success
    pub ok: bool,
    /// Chats keyed by recipient
    pub chats: ChatsByUser,
}

/// A chat as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawChat {
    /// Unique identifier
    pub id: ChatId,
    /// Creation time, seconds since epoch (may carry a fraction)
    pub t: f64,
    /// Sender
    pub from_user: Username,
    /// Text
    pub msg: String,
    /// Set when this is a channel join notice
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_join: Option<bool>,
    /// Set when this is a channel leave notice
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_leave: Option<bool>,
    /// Channel the chat was sent to; absent for direct messages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<Channel>,
}

/// Where a sent chat goes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Destination {
    /// Post to a channel the sender has joined
    Channel(Channel),
    /// Direct message to a user
    Tell(Username),
}

/// Send a chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateChatRequest {
    /// Authentication token
    pub chat_token: ChatToken,
    /// Sending user (must belong to the account)
    pub username: Username,
    /// Text
    pub msg: String,
    /// Serialized as either a `channel` or a `tell` field
    #[serde(flatten)]
    pub destination: Destination,
}

/// Response to [`CreateChatRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateChatResponse {
    /// Always true on success
    pub ok: bool,
}

/// Body the API sends when it rejects a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiFailure {
    /// False for a rejection
    pub ok: bool,
    /// Human-readable reason
    pub msg: String,
}

impl ApiFailure {
    /// Interpret a decoded body as a rejection.
    ///
    /// Returns `Some` only for `{"ok": false, "msg": "<string>"}`.
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        let ok = value.get("ok")?.as_bool()?;
        let msg = value.get("msg")?.as_str()?;
        if ok {
            return None;
        }
        Some(Self {
            ok,
            msg: msg.to_string(),
        })
    }
}

/// Serialize a request body to JSON.
pub fn encode<T: Serialize>(body: &T) -> Result<String, WireError> {
    serde_json::to_string(body).map_err(WireError::Serialization)
}

/// Deserialize a response body from JSON.
pub fn decode<T: DeserializeOwned>(body: &str) -> Result<T, WireError> {
    serde_json::from_str(body).map_err(WireError::Deserialization)
}
