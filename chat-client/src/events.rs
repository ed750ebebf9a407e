//! Typed event subscriptions.
//!
//! Each [`EventKind`] has exactly one handler signature, encoded as a variant
//! of [`EventHandler`]. Registration returns a [`HandlerId`] that is later
//! used for removal.
//!
//! Dispatch runs over a snapshot of the registered handlers, so a handler may
//! register or remove handlers without affecting the emission in progress. A
//! handler that panics is logged and skipped; the remaining handlers still run.

use chat_core::{AccountData, Chat};
use std::collections::HashMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use crate::client::ClientError;

/// The five kinds of event the client emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// The polling loop started.
    Started,
    /// The polling loop stopped (paused or errored).
    Stopped,
    /// A poll cycle failed.
    Error,
    /// A chat refresh completed.
    Chats,
    /// An account-data refresh completed.
    AccountData,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Started => "started",
            Self::Stopped => "stopped",
            Self::Error => "error",
            Self::Chats => "chats",
            Self::AccountData => "accountData",
        };
        f.write_str(name)
    }
}

/// A subscriber callback, typed by the event it handles.
#[derive(Clone)]
pub enum EventHandler {
    /// Called when the loop starts.
    Started(Arc<dyn Fn() + Send + Sync>),
    /// Called when the loop stops.
    Stopped(Arc<dyn Fn() + Send + Sync>),
    /// Called with the failure that stopped a cycle.
    Error(Arc<dyn Fn(&ClientError) + Send + Sync>),
    /// Called with chats not seen before, in encounter order.
    Chats(Arc<dyn Fn(&[Chat]) + Send + Sync>),
    /// Called with the complete new account-data snapshot.
    AccountData(Arc<dyn Fn(&AccountData) + Send + Sync>),
}

impl EventHandler {
    /// Handler for [`EventKind::Started`].
    pub fn started(f: impl Fn() + Send + Sync + 'static) -> Self {
        Self::Started(Arc::new(f))
    }

    /// Handler for [`EventKind::Stopped`].
    pub fn stopped(f: impl Fn() + Send + Sync + 'static) -> Self {
        Self::Stopped(Arc::new(f))
    }

    /// Handler for [`EventKind::Error`].
    pub fn error(f: impl Fn(&ClientError) + Send + Sync + 'static) -> Self {
        Self::Error(Arc::new(f))
    }

    /// Handler for [`EventKind::Chats`].
    pub fn chats(f: impl Fn(&[Chat]) + Send + Sync + 'static) -> Self {
        Self::Chats(Arc::new(f))
    }

    /// Handler for [`EventKind::AccountData`].
    pub fn account_data(f: impl Fn(&AccountData) + Send + Sync + 'static) -> Self {
        Self::AccountData(Arc::new(f))
    }

    /// The event this handler subscribes to.
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Started(_) => EventKind::Started,
            Self::Stopped(_) => EventKind::Stopped,
            Self::Error(_) => EventKind::Error,
            Self::Chats(_) => EventKind::Chats,
            Self::AccountData(_) => EventKind::AccountData,
        }
    }
}

impl fmt::Debug for EventHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventHandler({})", self.kind())
    }
}

/// Identifies one registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

/// An emitted event with its payload.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Event<'a> {
    Started,
    Stopped,
    Error(&'a ClientError),
    Chats(&'a [Chat]),
    AccountData(&'a AccountData),
}

impl Event<'_> {
    pub(crate) fn kind(&self) -> EventKind {
        match self {
            Self::Started => EventKind::Started,
            Self::Stopped => EventKind::Stopped,
            Self::Error(_) => EventKind::Error,
            Self::Chats(_) => EventKind::Chats,
            Self::AccountData(_) => EventKind::AccountData,
        }
    }
}

/// Handlers per event kind, in registration order.
#[derive(Debug, Default)]
pub(crate) struct EventRegistry {
    next_id: u64,
    handlers: HashMap<EventKind, Vec<(HandlerId, EventHandler)>>,
}

impl EventRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn register(&mut self, handler: EventHandler) -> HandlerId {
        self.next_id += 1;
        let id = HandlerId(self.next_id);
        self.handlers
            .entry(handler.kind())
            .or_default()
            .push((id, handler));
        id
    }

    /// Returns false if the id was not registered under `kind`.
    pub(crate) fn remove(&mut self, kind: EventKind, id: HandlerId) -> bool {
        let Some(list) = self.handlers.get_mut(&kind) else {
            return false;
        };
        let before = list.len();
        list.retain(|(existing, _)| *existing != id);
        list.len() != before
    }

    pub(crate) fn snapshot(&self, kind: EventKind) -> Vec<EventHandler> {
        self.handlers
            .get(&kind)
            .map(|list| list.iter().map(|(_, h)| h.clone()).collect())
            .unwrap_or_default()
    }

    pub(crate) fn count(&self, kind: EventKind) -> usize {
        self.handlers.get(&kind).map_or(0, Vec::len)
    }
}

/// Invoke every handler that matches the event.
///
/// Returns how many handlers panicked.
pub(crate) fn dispatch(handlers: &[EventHandler], event: Event<'_>) -> usize {
    let mut panicked = 0;

    for handler in handlers {
        let result = catch_unwind(AssertUnwindSafe(|| match (handler, event) {
            (EventHandler::Started(f), Event::Started) => f(),
            (EventHandler::Stopped(f), Event::Stopped) => f(),
            (EventHandler::Error(f), Event::Error(err)) => f(err),
            (EventHandler::Chats(f), Event::Chats(chats)) => f(chats),
            (EventHandler::AccountData(f), Event::AccountData(data)) => f(data),
            _ => {}
        }));

        if result.is_err() {
            panicked += 1;
            tracing::error!("{} handler panicked; continuing", event.kind());
        }
    }

    panicked
}
