//! Classifying what the caller hands to `login`.

use chat_types::{ChatPass, ChatToken};

/// A login credential: either a short pass to exchange, or a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    /// A chat pass that must be exchanged for a token first.
    Pass(ChatPass),
    /// A token usable as-is.
    Token(ChatToken),
}

impl Credential {
    /// Classify a credential string.
    ///
    /// Exactly [`ChatPass::LEN`] characters means a pass; anything else is
    /// taken to be a token and kept unchanged.
    pub fn parse(credential: &str) -> Self {
        if credential.chars().count() == ChatPass::LEN {
            Self::Pass(ChatPass::new(credential))
        } else {
            Self::Token(ChatToken::new(credential))
        }
    }
}
