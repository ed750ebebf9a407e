//! # chat-core
//!
//! Pure logic for hmchat (no I/O, instant tests).
//!
//! This crate implements the state machine and the reconciliation rules for
//! the chat client without any network I/O or timers, enabling fast unit
//! tests.
//!
//! ## Design Philosophy
//!
//! All modules in this crate are **pure** - they take input and produce output
//! without side effects. Time is passed in as epoch milliseconds rather than
//! read from a clock.
//!
//! The actual I/O (HTTP requests, scheduling, event dispatch) is performed by
//! `chat-client`, which interprets the actions produced here.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod account;
pub mod chats;
pub mod credential;
pub mod pacing;
pub mod status;

pub use account::{AccountData, ChannelMembers};
pub use chats::{timestamp_from_seconds, Chat, ChatCache, MergeOutcome};
pub use credential::Credential;
pub use pacing::{chat_lower_bound, PollTimers, CHAT_OVERLAP_MS, MAX_LOOKBACK_MS};
pub use status::{Action, ClientStatus, Notice, StatusEvent};
