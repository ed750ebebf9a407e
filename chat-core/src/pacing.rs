//! Poll pacing for hmchat.
//!
//! Tracks when each kind of data was last requested and decides whether a
//! refresh is due. Timestamps are epoch milliseconds supplied by the caller.
//!
//! Both timestamps are recorded when a request is *issued*, so a failed
//! request still counts as a poll and later attempts are paced from its start.

use std::time::Duration;

/// Overlap between consecutive chat windows, in milliseconds.
pub const CHAT_OVERLAP_MS: i64 = 2_000;

/// Furthest back a chat request ever looks, in milliseconds.
pub const MAX_LOOKBACK_MS: i64 = 5 * 60 * 1_000;

/// Compute the `after` bound (whole seconds) for a chat request.
///
/// `floor(max(last - 2000, now - 300000) / 1000)`. With no previous poll the
/// bound is the maximum lookback.
pub fn chat_lower_bound(now_ms: i64, last_poll_ms: Option<i64>) -> i64 {
    let floor = now_ms - MAX_LOOKBACK_MS;
    let bound = match last_poll_ms {
        Some(last) => (last - CHAT_OVERLAP_MS).max(floor),
        None => floor,
    };
    bound.div_euclid(1_000)
}

/// Last-poll bookkeeping for account data and chats.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollTimers {
    last_account_poll: Option<i64>,
    last_chat_poll: Option<i64>,
}

impl PollTimers {
    /// Create timers with nothing polled yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether account data should be refreshed at `now_ms`.
    pub fn account_due(&self, now_ms: i64, every: Duration) -> bool {
        is_due(self.last_account_poll, now_ms, every)
    }

    /// Check whether chats should be refreshed at `now_ms`.
    pub fn chats_due(&self, now_ms: i64, every: Duration) -> bool {
        is_due(self.last_chat_poll, now_ms, every)
    }

    /// Record an account-data request issued at `now_ms`.
    pub fn mark_account_poll(&mut self, now_ms: i64) {
        self.last_account_poll = Some(now_ms);
    }

    /// Record a chat request issued at `now_ms` and return its lower bound.
    ///
    /// The bound is computed from the previous poll, then the poll time is
    /// replaced.
    pub fn begin_chat_poll(&mut self, now_ms: i64) -> i64 {
        let after = chat_lower_bound(now_ms, self.last_chat_poll);
        self.last_chat_poll = Some(now_ms);
        after
    }
}

fn is_due(last: Option<i64>, now_ms: i64, every: Duration) -> bool {
    match last {
        None => true,
        Some(last) => {
            let every_ms = i64::try_from(every.as_millis()).unwrap_or(i64::MAX);
            now_ms.saturating_sub(last) >= every_ms
        }
    }
}
