//! Chat cache and fan-out reconciliation.
//!
//! The API reports one entry per (recipient, chat) pair, so a chat seen by
//! three of the account's users arrives three times with the same ID. The
//! cache collapses those entries into one [`Chat`] whose recipient set grows
//! with each observation.

use chat_types::{Channel, ChatId, ChatsByUser, RawChat, Username};
use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashMap};

/// A chat after normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chat {
    /// Unique identifier.
    pub id: ChatId,
    /// Creation time.
    pub t: DateTime<Utc>,
    /// Sender.
    pub from_user: Username,
    /// Text.
    pub msg: String,
    /// Channel join notice.
    pub is_join: bool,
    /// Channel leave notice.
    pub is_leave: bool,
    /// Channel, or `None` for a direct message.
    pub channel: Option<Channel>,
    /// The account's users that received this chat.
    pub to_users: BTreeSet<Username>,
}

impl Chat {
    /// Normalize a raw chat observed under `recipient`.
    ///
    /// Returns `None` if the timestamp cannot be represented.
    pub fn from_raw(raw: RawChat, recipient: Username) -> Option<Self> {
        let t = timestamp_from_seconds(raw.t)?;
        Some(Self {
            id: raw.id,
            t,
            from_user: raw.from_user,
            msg: raw.msg,
            is_join: raw.is_join.unwrap_or(false),
            is_leave: raw.is_leave.unwrap_or(false),
            channel: raw.channel,
            to_users: BTreeSet::from([recipient]),
        })
    }

    /// Check if this is a direct message rather than a channel chat.
    pub fn is_tell(&self) -> bool {
        self.channel.is_none()
    }
}

/// Convert seconds since epoch (possibly fractional) to a timestamp.
///
/// Sub-millisecond digits are truncated.
pub fn timestamp_from_seconds(seconds: f64) -> Option<DateTime<Utc>> {
    if !seconds.is_finite() {
        return None;
    }
    let millis = (seconds * 1_000.0).trunc();
    if millis < i64::MIN as f64 || millis > i64::MAX as f64 {
        return None;
    }
    DateTime::from_timestamp_millis(millis as i64)
}

/// Result of merging one chats response into the cache.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Chats not seen before, in encounter order.
    pub new_chats: Vec<Chat>,
    /// Recipients added to chats that were already cached.
    pub recipients_added: usize,
    /// Entries dropped because their timestamp was unusable.
    pub skipped: usize,
}

/// Every chat observed so far, keyed by ID.
#[derive(Debug, Clone, Default)]
pub struct ChatCache {
    chats: HashMap<ChatId, Chat>,
}

impl ChatCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a response grouped by recipient.
    ///
    /// A cached ID only gains the recipient; its other fields keep their
    /// first-seen values. An unseen ID becomes a new chat with that recipient
    /// as its only member.
    pub fn merge(&mut self, response: ChatsByUser) -> MergeOutcome {
        let mut outcome = MergeOutcome::default();

        for (user, raws) in response {
            for raw in raws {
                if let Some(existing) = self.chats.get_mut(&raw.id) {
                    if existing.to_users.insert(user.clone()) {
                        outcome.recipients_added += 1;
                    }
                    continue;
                }

                match Chat::from_raw(raw, user.clone()) {
                    Some(chat) => {
                        self.chats.insert(chat.id.clone(), chat.clone());
                        outcome.new_chats.push(chat);
                    }
                    None => outcome.skipped += 1,
                }
            }
        }

        outcome
    }

    /// Look up a chat by ID.
    pub fn get(&self, id: &ChatId) -> Option<&Chat> {
        self.chats.get(id)
    }

    /// Number of cached chats.
    pub fn len(&self) -> usize {
        self.chats.len()
    }

    /// Check if nothing has been cached.
    pub fn is_empty(&self) -> bool {
        self.chats.is_empty()
    }

    /// All chats, oldest first (ties broken by ID).
    pub fn sorted(&self) -> Vec<Chat> {
        let mut chats: Vec<Chat> = self.chats.values().cloned().collect();
        chats.sort_by(|a, b| a.t.cmp(&b.t).then_with(|| a.id.cmp(&b.id)));
        chats
    }
}
