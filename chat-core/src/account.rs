//! Account data: which users the account has and what channels they sit in.
//!
//! Each refresh produces a complete snapshot that replaces the previous one.

use chat_types::{AccountUsers, Channel, Username};
use indexmap::IndexMap;
use std::collections::{BTreeMap, BTreeSet};

/// Channel name to the set of its members.
pub type ChannelMembers = BTreeMap<Channel, BTreeSet<Username>>;

/// Point-in-time snapshot of the account's users and their channels.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountData {
    users: IndexMap<Username, ChannelMembers>,
}

impl AccountData {
    /// Create an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a snapshot from the API's nested lists.
    ///
    /// Duplicate members in a channel list collapse into one.
    pub fn from_wire(users: AccountUsers) -> Self {
        let users = users
            .into_iter()
            .map(|(user, channels)| {
                let channels = channels
                    .into_iter()
                    .map(|(channel, members)| (channel, members.into_iter().collect()))
                    .collect();
                (user, channels)
            })
            .collect();
        Self { users }
    }

    /// Usernames present in the snapshot.
    pub fn users(&self) -> BTreeSet<Username> {
        self.users.keys().cloned().collect()
    }

    /// Usernames in the order the server listed them.
    pub fn usernames(&self) -> Vec<Username> {
        self.users.keys().cloned().collect()
    }

    /// Channels one user is in.
    pub fn channels_of(&self, user: &str) -> Option<&ChannelMembers> {
        self.users.get(user)
    }

    /// All channels across users, merged into one map.
    ///
    /// Users are visited in the order the server listed them and a later
    /// user's entry for a channel replaces an earlier one, so membership seen
    /// by earlier users is lost when two users share a channel.
    pub fn channels(&self) -> ChannelMembers {
        let mut merged = ChannelMembers::new();
        for channels in self.users.values() {
            for (channel, members) in channels {
                merged.insert(channel.clone(), members.clone());
            }
        }
        merged
    }

    /// Iterate over users and their channels.
    pub fn iter(&self) -> impl Iterator<Item = (&Username, &ChannelMembers)> {
        self.users.iter()
    }

    /// Number of users.
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Check if the snapshot has no users.
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl From<AccountUsers> for AccountData {
    fn from(users: AccountUsers) -> Self {
        Self::from_wire(users)
    }
}
