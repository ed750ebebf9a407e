//! # chat-types
//!
//! Wire format types for the hackmud chat API.
//!
//! This crate provides the foundational types used across all hmchat crates:
//! - [`ChatPass`], [`ChatToken`], [`ChatId`] - Credential and identity types
//! - [`RawChat`] - A chat as the API returns it, once per recipient
//! - Request/response bodies for the four `/mobile/*.json` operations
//! - [`WireError`] - Error types

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod ids;
mod messages;

pub use error::WireError;
pub use ids::{Channel, ChatId, ChatPass, ChatToken, Username};
pub use messages::{
    decode, encode, AccountDataRequest, AccountDataResponse, AccountUsers, ApiFailure, ChatsByUser,
    ChatsRequest, ChatsResponse, CreateChatRequest, CreateChatResponse, Destination,
    GetTokenRequest, GetTokenResponse, RawChat, UserChannels,
};
