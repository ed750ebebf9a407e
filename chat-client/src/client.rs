//! ChatClient - the main interface for hmchat.
//!
//! This module provides [`ChatClient`], the primary API for applications to
//! follow and send chat.
//!
//! # Architecture
//!
//! ChatClient uses a pure state machine (from chat-core) for lifecycle logic
//! and interprets its actions to perform actual I/O via the Transport trait.
//!
//! ```text
//! Application → ChatClient → Transport → Network
//!                   ↓
//!              chat-core (status machine, pacing, reconciliation)
//! ```
//!
//! The polling loop is a chain of tokio tasks. Each iteration is spawned by
//! the scheduler, which holds at most one pending handle. An iteration
//! removes its own handle when it wakes, so `pause()` only ever aborts an
//! iteration that has not begun; one already in flight runs to completion and
//! then declines to reschedule because it re-checks status and start epoch
//! under the state lock.
//!
//! # Example
//!
//! ```ignore
//! use chat_client::{ChatClient, ClientConfig, EventHandler, MockTransport};
//!
//! let client = ChatClient::new(ClientConfig::default(), MockTransport::new());
//! client.on(EventHandler::account_data(|data| println!("{} users", data.len())));
//! client.login("ab3de", true).await?;
//! ```

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;

use chat_core::{
    AccountData, Action, ChannelMembers, Chat, ChatCache, ClientStatus, Credential, Notice,
    PollTimers, StatusEvent,
};
use chat_types::{ChatId, ChatToken, Destination, Username};

use crate::clock::{Clock, SystemClock};
use crate::config::ClientConfig;
use crate::events::{dispatch, Event, EventHandler, EventKind, EventRegistry, HandlerId};
use crate::transport::{Transport, TransportError};

/// Client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// No token yet; call `login` first.
    #[error("not logged in")]
    NotAuthenticated,
}

/// The main chat client.
///
/// Cheap to clone; clones share the same state and loop.
pub struct ChatClient<T: Transport> {
    shared: Arc<Shared<T>>,
}

struct Shared<T> {
    config: ClientConfig,
    transport: T,
    clock: Box<dyn Clock>,
    state: Mutex<ClientState>,
    events: Mutex<EventRegistry>,
    /// Held for the whole of an iteration so two never overlap.
    cycle: tokio::sync::Mutex<()>,
}

#[derive(Default)]
struct ClientState {
    token: Option<ChatToken>,
    status: ClientStatus,
    account_data: AccountData,
    chats: ChatCache,
    timers: PollTimers,
    /// Bumped by every `start()`; iterations from an older start never
    /// reschedule.
    epoch: u64,
    next_ticket: u64,
    scheduled: Option<Scheduled>,
}

/// The single pending iteration.
struct Scheduled {
    ticket: u64,
    handle: JoinHandle<()>,
}

/// What a list of state machine actions asks the client to do.
#[derive(Default)]
struct Plan {
    notices: Vec<Notice>,
    schedule: Option<Duration>,
    cancel: bool,
}

impl Plan {
    fn from_actions(actions: Vec<Action>) -> Self {
        let mut plan = Self::default();
        for action in actions {
            match action {
                Action::Emit(notice) => plan.notices.push(notice),
                Action::ScheduleIteration { delay } => plan.schedule = Some(delay),
                Action::CancelScheduled => plan.cancel = true,
            }
        }
        plan
    }
}

impl<T: Transport> Clone for ChatClient<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: Transport + 'static> ChatClient<T> {
    /// Create a new ChatClient.
    pub fn new(config: ClientConfig, transport: T) -> Self {
        Self::with_clock(config, transport, SystemClock)
    }

    /// Create a new ChatClient reading time from `clock`.
    pub fn with_clock(config: ClientConfig, transport: T, clock: impl Clock) -> Self {
        Self {
            shared: Arc::new(Shared {
                config,
                transport,
                clock: Box::new(clock),
                state: Mutex::new(ClientState::default()),
                events: Mutex::new(EventRegistry::new()),
                cycle: tokio::sync::Mutex::new(()),
            }),
        }
    }

    /// Authenticate, then optionally start polling.
    ///
    /// A 5 character credential is a chat pass and is exchanged for a token;
    /// anything else is stored as the token unchanged. Errors are returned to
    /// the caller and never emitted as events.
    pub async fn login(&self, credential: &str, autostart: bool) -> Result<(), ClientError> {
        let token = match Credential::parse(credential) {
            Credential::Pass(pass) => {
                tracing::info!("Exchanging chat pass for a token");
                self.shared.transport.exchange_token(&pass).await?
            }
            Credential::Token(token) => token,
        };

        self.set_token(token);

        if autostart {
            self.start();
        }
        Ok(())
    }

    /// Use a token obtained earlier, without looking at its length.
    pub fn set_token(&self, token: ChatToken) {
        self.state().token = Some(token);
        tracing::info!("Logged in");
    }

    /// Start (or restart) the polling loop.
    ///
    /// Emits started, then runs the first iteration immediately. Must be
    /// called from within a tokio runtime.
    pub fn start(&self) {
        let (epoch, plan) = {
            let mut state = self.state();
            state.epoch += 1;
            let (status, actions) = state.status.on_event(StatusEvent::StartRequested);
            state.status = status;
            (state.epoch, Plan::from_actions(actions))
        };

        tracing::info!("Polling started");
        self.emit_notices(&plan.notices, None);

        if let Some(delay) = plan.schedule {
            let mut state = self.state();
            // A pause() from a started handler wins
            if state.status.is_running() && state.epoch == epoch {
                self.schedule(&mut state, delay);
            }
        }
    }

    /// Stop the polling loop.
    ///
    /// Emits stopped and cancels the pending iteration. An iteration already
    /// in flight finishes but does not reschedule.
    pub fn pause(&self) {
        let plan = {
            let mut state = self.state();
            let (status, actions) = state.status.on_event(StatusEvent::PauseRequested);
            state.status = status;
            let plan = Plan::from_actions(actions);
            if plan.cancel {
                cancel_scheduled(&mut state);
            }
            plan
        };

        tracing::info!("Polling paused");
        self.emit_notices(&plan.notices, None);
    }

    /// Subscribe to an event.
    pub fn on(&self, handler: EventHandler) -> HandlerId {
        self.events().register(handler)
    }

    /// Unsubscribe a handler. Returns false if it was not registered.
    pub fn remove_event_handler(&self, kind: EventKind, id: HandlerId) -> bool {
        self.events().remove(kind, id)
    }

    /// Number of handlers registered for an event.
    pub fn handler_count(&self, kind: EventKind) -> usize {
        self.events().count(kind)
    }

    /// Send a chat from one of the account's users.
    pub async fn send_chat(
        &self,
        sender: &str,
        msg: &str,
        destination: Destination,
    ) -> Result<(), ClientError> {
        let token = self.token().ok_or(ClientError::NotAuthenticated)?;
        self.shared
            .transport
            .send_chat(&token, sender, msg, &destination)
            .await?;
        tracing::debug!("Sent chat from {} to {:?}", sender, destination);
        Ok(())
    }

    /// Current status.
    pub fn status(&self) -> ClientStatus {
        self.state().status
    }

    /// Current token, if logged in.
    pub fn token(&self) -> Option<ChatToken> {
        self.state().token.clone()
    }

    /// Check if an iteration is waiting to run.
    pub fn is_scheduled(&self) -> bool {
        self.state().scheduled.is_some()
    }

    /// Every chat seen so far, oldest first.
    pub fn chats(&self) -> Vec<Chat> {
        self.state().chats.sorted()
    }

    /// Look up one chat.
    pub fn chat(&self, id: &ChatId) -> Option<Chat> {
        self.state().chats.get(id).cloned()
    }

    /// The latest account-data snapshot.
    pub fn account_data(&self) -> AccountData {
        self.state().account_data.clone()
    }

    /// Usernames in the latest account data.
    pub fn users(&self) -> BTreeSet<Username> {
        self.state().account_data.users()
    }

    /// Channels across all users (later users win on name clashes).
    pub fn channels(&self) -> ChannelMembers {
        self.state().account_data.channels()
    }

    /// The client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.shared.config
    }

    /// Get a reference to the underlying transport (for testing).
    pub fn transport(&self) -> &T {
        &self.shared.transport
    }

    // --- Loop ---

    /// Arm the scheduler, replacing any pending iteration.
    fn schedule(&self, state: &mut ClientState, delay: Duration) {
        cancel_scheduled(state);

        state.next_ticket += 1;
        let ticket = state.next_ticket;
        let epoch = state.epoch;
        let client = self.clone();

        let handle = tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            client.run_iteration(epoch, ticket).await;
        });

        state.scheduled = Some(Scheduled { ticket, handle });
    }

    async fn run_iteration(&self, epoch: u64, ticket: u64) {
        {
            let mut state = self.state();
            let mine = state.scheduled.as_ref().map(|pending| pending.ticket) == Some(ticket);
            if !mine {
                return;
            }
            state.scheduled = None;
            if !state.status.is_running() || state.epoch != epoch {
                return;
            }
        }

        let _cycle = self.shared.cycle.lock().await;
        {
            let state = self.state();
            if !state.status.is_running() || state.epoch != epoch {
                return;
            }
        }

        let result = self.poll_once().await;

        let (plan, error) = {
            let mut state = self.state();
            let stale = state.epoch != epoch;

            match result {
                Ok(()) if stale => (Plan::default(), None),
                Ok(()) => {
                    let event = StatusEvent::CycleCompleted {
                        poll_interval: self.shared.config.poll_frequency(),
                    };
                    let (status, actions) = state.status.on_event(event);
                    state.status = status;
                    let plan = Plan::from_actions(actions);
                    if let Some(delay) = plan.schedule {
                        self.schedule(&mut state, delay);
                    }
                    (plan, None)
                }
                Err(err) if stale => (
                    Plan {
                        notices: vec![Notice::Error],
                        ..Plan::default()
                    },
                    Some(err),
                ),
                Err(err) => {
                    let (status, actions) = state.status.on_event(StatusEvent::CycleFailed);
                    state.status = status;
                    (Plan::from_actions(actions), Some(err))
                }
            }
        };

        if let Some(err) = &error {
            tracing::error!("Poll cycle failed: {}", err);
        }
        self.emit_notices(&plan.notices, error.as_ref());
    }

    /// One pass: account data if due, then chats if due.
    async fn poll_once(&self) -> Result<(), ClientError> {
        let config = &self.shared.config;

        let now = self.now();
        let account_due = self
            .state()
            .timers
            .account_due(now, config.account_frequency());
        if account_due {
            self.refresh_account_data().await?;
        }

        let now = self.now();
        let chats_due = self.state().timers.chats_due(now, config.poll_frequency());
        if chats_due {
            self.refresh_chats().await?;
        }

        Ok(())
    }

    async fn refresh_account_data(&self) -> Result<(), ClientError> {
        let token = {
            let mut state = self.state();
            state.timers.mark_account_poll(self.now());
            state.token.clone().ok_or(ClientError::NotAuthenticated)?
        };

        let users = self.shared.transport.fetch_account_data(&token).await?;
        let data = AccountData::from_wire(users);

        self.state().account_data = data.clone();
        tracing::debug!("Account data refreshed ({} users)", data.len());

        self.emit(Event::AccountData(&data));
        Ok(())
    }

    async fn refresh_chats(&self) -> Result<(), ClientError> {
        let (token, usernames, after) = {
            let mut state = self.state();
            let after = state.timers.begin_chat_poll(self.now());
            let token = state.token.clone().ok_or(ClientError::NotAuthenticated)?;
            (token, state.account_data.usernames(), after)
        };

        let response = self
            .shared
            .transport
            .fetch_chats(&token, &usernames, after)
            .await?;

        let outcome = self.state().chats.merge(response);
        if outcome.skipped > 0 {
            tracing::warn!("Dropped {} chats with unusable timestamps", outcome.skipped);
        }
        tracing::debug!(
            "Chats refreshed (after={}, new={}, recipients added={})",
            after,
            outcome.new_chats.len(),
            outcome.recipients_added
        );

        if !outcome.new_chats.is_empty() || self.shared.config.emit_empty_chats {
            self.emit(Event::Chats(&outcome.new_chats));
        }
        Ok(())
    }

    // --- Helpers ---

    fn now(&self) -> i64 {
        self.shared.clock.now_millis()
    }

    fn state(&self) -> MutexGuard<'_, ClientState> {
        self.shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn events(&self) -> MutexGuard<'_, EventRegistry> {
        self.shared
            .events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Dispatch to a snapshot of the handlers; the registry lock is released
    /// before any handler runs.
    fn emit(&self, event: Event<'_>) {
        let handlers = self.events().snapshot(event.kind());
        dispatch(&handlers, event);
    }

    fn emit_notices(&self, notices: &[Notice], error: Option<&ClientError>) {
        for notice in notices {
            match notice {
                Notice::Started => self.emit(Event::Started),
                Notice::Stopped => self.emit(Event::Stopped),
                Notice::Error => {
                    if let Some(err) = error {
                        self.emit(Event::Error(err));
                    }
                }
            }
        }
    }
}

fn cancel_scheduled(state: &mut ClientState) {
    if let Some(pending) = state.scheduled.take() {
        pending.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{MockCall, MockTransport};
    use chat_types::{AccountUsers, ChatsByUser, RawChat, UserChannels};

    const T: i64 = 1_700_000_000_000;
    const POLL: Duration = Duration::from_millis(2000);

    /// Wall clock that follows tokio's (pausable) clock.
    struct TestClock {
        base_ms: i64,
        start: tokio::time::Instant,
    }

    impl TestClock {
        fn new() -> Self {
            Self {
                base_ms: T,
                start: tokio::time::Instant::now(),
            }
        }
    }

    impl Clock for TestClock {
        fn now_millis(&self) -> i64 {
            self.base_ms + self.start.elapsed().as_millis() as i64
        }
    }

    /// Everything the handlers saw, in order.
    #[derive(Default)]
    struct Recorder {
        log: Mutex<Vec<&'static str>>,
        batches: Mutex<Vec<Vec<Chat>>>,
        snapshots: Mutex<Vec<AccountData>>,
        errors: Mutex<Vec<String>>,
    }

    impl Recorder {
        fn attach(client: &ChatClient<MockTransport>) -> Arc<Self> {
            let rec = Arc::new(Self::default());

            let r = Arc::clone(&rec);
            client.on(EventHandler::started(move || r.push("started")));
            let r = Arc::clone(&rec);
            client.on(EventHandler::stopped(move || r.push("stopped")));
            let r = Arc::clone(&rec);
            client.on(EventHandler::error(move |err| {
                r.push("error");
                r.errors.lock().unwrap().push(err.to_string());
            }));
            let r = Arc::clone(&rec);
            client.on(EventHandler::chats(move |chats| {
                r.push("chats");
                r.batches.lock().unwrap().push(chats.to_vec());
            }));
            let r = Arc::clone(&rec);
            client.on(EventHandler::account_data(move |data| {
                r.push("accountData");
                r.snapshots.lock().unwrap().push(data.clone());
            }));

            rec
        }

        fn push(&self, entry: &'static str) {
            self.log.lock().unwrap().push(entry);
        }

        fn log(&self) -> Vec<&'static str> {
            self.log.lock().unwrap().clone()
        }

        fn batches(&self) -> Vec<Vec<Chat>> {
            self.batches.lock().unwrap().clone()
        }

        fn snapshots(&self) -> Vec<AccountData> {
            self.snapshots.lock().unwrap().clone()
        }

        fn errors(&self) -> Vec<String> {
            self.errors.lock().unwrap().clone()
        }

        fn count(&self, entry: &str) -> usize {
            self.log().iter().filter(|e| **e == entry).count()
        }
    }

    fn roster() -> AccountUsers {
        AccountUsers::from([
            (
                "alice".to_string(),
                UserChannels::from([(
                    "general".to_string(),
                    vec!["alice".to_string(), "bob".to_string()],
                )]),
            ),
            (
                "carol".to_string(),
                UserChannels::from([("general".to_string(), vec!["carol".to_string()])]),
            ),
        ])
    }

    fn raw(id: &str, msg: &str) -> RawChat {
        RawChat {
            id: ChatId::new(id),
            t: 1_700_000_000.0,
            from_user: "bob".into(),
            msg: msg.into(),
            is_join: None,
            is_leave: None,
            channel: Some("general".into()),
        }
    }

    fn chats_for(entries: Vec<(&str, Vec<RawChat>)>) -> ChatsByUser {
        entries
            .into_iter()
            .map(|(user, chats)| (user.to_string(), chats))
            .collect()
    }

    fn test_client(config: ClientConfig) -> (ChatClient<MockTransport>, MockTransport) {
        let transport = MockTransport::new();
        transport.set_account_data(roster());
        let client = ChatClient::with_clock(config, transport.clone(), TestClock::new());
        (client, transport)
    }

    /// Let spawned iterations run without moving the clock.
    async fn settle() {
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
    }

    async fn advance(by: Duration) {
        tokio::time::advance(by).await;
        settle().await;
    }

    // ===========================================
    // Login Tests
    // ===========================================

    #[tokio::test]
    async fn login_with_pass_exchanges_token() {
        let (client, transport) = test_client(ClientConfig::default());

        client.login("ab3de", false).await.unwrap();

        assert_eq!(
            client.token(),
            Some(ChatToken::new(MockTransport::DEFAULT_TOKEN))
        );
        assert_eq!(
            transport.calls(),
            vec![MockCall::ExchangeToken {
                pass: chat_types::ChatPass::new("ab3de")
            }]
        );
        assert_eq!(client.status(), ClientStatus::Unauthenticated);
    }

    #[tokio::test]
    async fn login_with_token_stores_it_unchanged() {
        let (client, transport) = test_client(ClientConfig::default());

        client.login("0123456789abcdef", false).await.unwrap();

        assert_eq!(client.token(), Some(ChatToken::new("0123456789abcdef")));
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn set_token_skips_the_exchange_for_short_tokens() {
        let (client, transport) = test_client(ClientConfig::default());

        client.set_token(ChatToken::new("abcde"));
        client.send_chat("alice", "hi", Destination::Tell("bob".into())).await.unwrap();

        assert_eq!(client.token(), Some(ChatToken::new("abcde")));
        assert_eq!(
            transport.calls(),
            vec![MockCall::SendChat {
                token: ChatToken::new("abcde"),
                sender: "alice".into(),
                msg: "hi".into(),
                destination: Destination::Tell("bob".into()),
            }]
        );
    }

    #[tokio::test]
    async fn login_failure_is_returned_not_emitted() {
        let (client, transport) = test_client(ClientConfig::default());
        let rec = Recorder::attach(&client);
        transport.fail_next_exchange("invalid pass");

        let result = client.login("ab3de", true).await;

        match result {
            Err(ClientError::Transport(err)) => assert_eq!(err.message(), "invalid pass"),
            other => panic!("Expected transport error, got {:?}", other),
        }
        assert!(client.token().is_none());
        assert_eq!(client.status(), ClientStatus::Unauthenticated);
        assert!(rec.log().is_empty());
    }

    // ===========================================
    // Polling Loop Tests
    // ===========================================

    #[tokio::test(start_paused = true)]
    async fn end_to_end_pass_login_and_two_chat_polls() {
        let (client, transport) = test_client(ClientConfig::default().with_poll_frequency(POLL));
        let rec = Recorder::attach(&client);

        client.login("ab3de", true).await.unwrap();
        settle().await;

        assert_eq!(client.status(), ClientStatus::Running);
        assert_eq!(rec.log(), vec!["started", "accountData", "chats"]);
        assert_eq!(rec.batches(), vec![Vec::<Chat>::new()]);
        assert!(client.is_scheduled());

        let users = vec!["alice".to_string(), "carol".to_string()];
        assert_eq!(
            transport.chat_requests(),
            vec![(users.clone(), (T - 300_000) / 1_000)]
        );

        advance(POLL).await;

        assert_eq!(rec.log(), vec!["started", "accountData", "chats", "chats"]);
        assert_eq!(
            transport.chat_requests(),
            vec![
                (users.clone(), (T - 300_000) / 1_000),
                (users, (T - 2_000) / 1_000),
            ]
        );
        // Account data is on its own 5 minute interval
        assert_eq!(transport.account_data_requests(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn fan_out_is_collapsed_and_notified_once() {
        let (client, transport) = test_client(ClientConfig::default());
        let rec = Recorder::attach(&client);
        transport.queue_chats(chats_for(vec![("alice", vec![raw("1", "hello")])]));
        transport.queue_chats(chats_for(vec![(
            "carol",
            vec![raw("1", "hello"), raw("2", "again")],
        )]));

        client.login("token-for-tests", true).await.unwrap();
        settle().await;
        advance(POLL).await;

        let batches = rec.batches();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].len(), 1);
        assert_eq!(batches[0][0].id, ChatId::new("1"));
        assert_eq!(batches[1].len(), 1);
        assert_eq!(batches[1][0].id, ChatId::new("2"));

        let chat = client.chat(&ChatId::new("1")).unwrap();
        assert_eq!(
            chat.to_users,
            BTreeSet::from(["alice".to_string(), "carol".to_string()])
        );
        assert_eq!(client.chats().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn account_data_replacement_is_idempotent() {
        let config = ClientConfig::default()
            .with_poll_frequency(POLL)
            .with_account_frequency(POLL);
        let (client, transport) = test_client(config);
        let rec = Recorder::attach(&client);

        client.login("token-for-tests", true).await.unwrap();
        settle().await;
        advance(POLL).await;

        let snapshots = rec.snapshots();
        assert_eq!(transport.account_data_requests(), 2);
        assert_eq!(snapshots.len(), 2);
        assert_eq!(snapshots[0], snapshots[1]);
        assert_eq!(client.account_data(), snapshots[1]);
    }

    #[tokio::test(start_paused = true)]
    async fn derived_views_follow_account_data() {
        let (client, _transport) = test_client(ClientConfig::default());

        client.login("token-for-tests", true).await.unwrap();
        settle().await;

        assert_eq!(
            client.users(),
            BTreeSet::from(["alice".to_string(), "carol".to_string()])
        );
        let channels = client.channels();
        assert_eq!(channels.len(), 1);
        assert_eq!(
            channels["general"],
            BTreeSet::from(["carol".to_string()])
        );
    }

    #[tokio::test(start_paused = true)]
    async fn empty_batches_can_be_suppressed() {
        let (client, transport) =
            test_client(ClientConfig::default().with_emit_empty_chats(false));
        let rec = Recorder::attach(&client);

        client.login("token-for-tests", true).await.unwrap();
        settle().await;
        assert_eq!(rec.count("chats"), 0);
        assert_eq!(transport.chat_requests().len(), 1);

        transport.queue_chats(chats_for(vec![("alice", vec![raw("1", "hi")])]));
        advance(POLL).await;
        assert_eq!(rec.count("chats"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn double_start_keeps_a_single_loop() {
        let (client, transport) = test_client(ClientConfig::default());
        client.login("token-for-tests", false).await.unwrap();

        client.start();
        client.start();
        settle().await;

        assert_eq!(transport.account_data_requests(), 1);
        assert_eq!(transport.chat_requests().len(), 1);

        advance(POLL).await;
        assert_eq!(transport.chat_requests().len(), 2);
    }

    // ===========================================
    // Pause / Restart Tests
    // ===========================================

    #[tokio::test(start_paused = true)]
    async fn pause_stops_scheduling() {
        let (client, transport) = test_client(ClientConfig::default());
        let rec = Recorder::attach(&client);

        client.login("token-for-tests", true).await.unwrap();
        settle().await;
        assert!(client.is_scheduled());

        client.pause();

        assert_eq!(client.status(), ClientStatus::Paused);
        assert!(!client.is_scheduled());
        assert_eq!(rec.log().last(), Some(&"stopped"));

        advance(Duration::from_secs(30)).await;
        assert_eq!(transport.chat_requests().len(), 1);
        assert!(!client.is_scheduled());
    }

    #[tokio::test(start_paused = true)]
    async fn start_after_pause_resumes_immediately() {
        let (client, transport) = test_client(ClientConfig::default());
        let rec = Recorder::attach(&client);

        client.login("token-for-tests", true).await.unwrap();
        settle().await;
        client.pause();
        advance(Duration::from_secs(10)).await;

        client.start();
        settle().await;

        assert_eq!(client.status(), ClientStatus::Running);
        assert_eq!(rec.count("started"), 2);
        assert_eq!(transport.chat_requests().len(), 2);
        // 10s since the previous poll: the 2s overlap bound applies
        let (_, after) = transport.chat_requests()[1].clone();
        assert_eq!(after, (T - 2_000) / 1_000);
    }

    #[tokio::test(start_paused = true)]
    async fn pause_during_in_flight_poll_does_not_reschedule() {
        let (client, transport) = test_client(ClientConfig::default().with_poll_frequency(POLL));
        let rec = Recorder::attach(&client);
        transport.delay_next_chats(Duration::from_millis(500));

        client.login("token-for-tests", true).await.unwrap();
        settle().await;
        // The chat fetch is still waiting on the server
        assert_eq!(transport.chat_requests().len(), 1);
        assert!(!client.is_scheduled());

        client.pause();
        assert_eq!(client.status(), ClientStatus::Paused);
        assert_eq!(rec.count("stopped"), 1);

        advance(Duration::from_millis(500)).await;
        assert!(!client.is_scheduled());
        assert_eq!(client.status(), ClientStatus::Paused);
        assert_eq!(rec.count("stopped"), 1);

        advance(Duration::from_secs(10)).await;
        assert_eq!(transport.chat_requests().len(), 1);
        assert!(rec.errors().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn pause_then_start_in_flight_keeps_single_loop() {
        let (client, transport) = test_client(ClientConfig::default().with_poll_frequency(POLL));
        let rec = Recorder::attach(&client);
        transport.delay_next_chats(Duration::from_millis(500));

        client.login("token-for-tests", true).await.unwrap();
        settle().await;
        client.pause();
        client.start();

        // The new iteration waits for the old fetch, then finds chats not yet due
        advance(Duration::from_millis(500)).await;
        assert!(client.is_scheduled());
        assert_eq!(transport.chat_requests().len(), 1);

        advance(POLL).await;
        assert_eq!(transport.chat_requests().len(), 2);
        advance(POLL).await;
        assert_eq!(transport.chat_requests().len(), 3);

        assert_eq!(client.status(), ClientStatus::Running);
        assert_eq!(rec.count("started"), 2);
        assert_eq!(rec.count("stopped"), 1);
        assert!(rec.errors().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn failure_after_pause_emits_error_only() {
        let (client, transport) = test_client(ClientConfig::default().with_poll_frequency(POLL));
        let rec = Recorder::attach(&client);
        transport.delay_next_chats(Duration::from_millis(500));
        transport.fail_next_chats("boom");

        client.login("token-for-tests", true).await.unwrap();
        settle().await;
        client.pause();

        advance(Duration::from_millis(500)).await;

        assert_eq!(rec.errors(), vec!["transport error: boom".to_string()]);
        assert_eq!(rec.count("stopped"), 1);
        assert_eq!(rec.log().last(), Some(&"error"));
        assert_eq!(client.status(), ClientStatus::Paused);
        assert!(!client.is_scheduled());
    }

    #[tokio::test(start_paused = true)]
    async fn pause_from_started_handler_prevents_first_iteration() {
        let (client, transport) = test_client(ClientConfig::default());
        client.login("token-for-tests", false).await.unwrap();

        let c = client.clone();
        client.on(EventHandler::started(move || c.pause()));
        client.start();
        settle().await;

        assert_eq!(client.status(), ClientStatus::Paused);
        assert!(!client.is_scheduled());
        assert!(transport.calls().is_empty());
    }

    // ===========================================
    // Error Path Tests
    // ===========================================

    #[tokio::test(start_paused = true)]
    async fn chat_failure_errors_the_loop_once() {
        let (client, transport) = test_client(ClientConfig::default());
        let rec = Recorder::attach(&client);
        transport.fail_next_chats("boom");

        client.login("token-for-tests", true).await.unwrap();
        settle().await;

        assert_eq!(client.status(), ClientStatus::Errored);
        assert_eq!(rec.errors(), vec!["transport error: boom".to_string()]);
        assert_eq!(rec.count("error"), 1);
        assert_eq!(rec.count("stopped"), 1);
        assert_eq!(rec.log().last(), Some(&"stopped"));
        assert!(!client.is_scheduled());

        advance(Duration::from_secs(30)).await;
        assert_eq!(transport.chat_requests().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn account_failure_skips_chat_refresh() {
        let (client, transport) = test_client(ClientConfig::default());
        let rec = Recorder::attach(&client);
        transport.fail_next_account_data("invalid token");

        client.login("token-for-tests", true).await.unwrap();
        settle().await;

        assert_eq!(client.status(), ClientStatus::Errored);
        assert_eq!(rec.log(), vec!["started", "error", "stopped"]);
        assert!(transport.chat_requests().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn restart_after_error_paces_from_failed_request() {
        let (client, transport) = test_client(ClientConfig::default());
        transport.fail_next_account_data("invalid token");

        client.login("token-for-tests", true).await.unwrap();
        settle().await;
        assert_eq!(client.status(), ClientStatus::Errored);

        client.start();
        settle().await;

        // The failed request counted as the account poll
        assert_eq!(transport.account_data_requests(), 1);
        assert_eq!(transport.chat_requests().len(), 1);
        assert_eq!(client.status(), ClientStatus::Running);
    }

    #[tokio::test(start_paused = true)]
    async fn start_without_login_errors() {
        let (client, transport) = test_client(ClientConfig::default());
        let rec = Recorder::attach(&client);

        client.start();
        settle().await;

        assert_eq!(client.status(), ClientStatus::Errored);
        assert_eq!(rec.errors(), vec!["not logged in".to_string()]);
        assert!(transport.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn panicking_subscriber_does_not_stop_loop() {
        let (client, transport) = test_client(ClientConfig::default());
        client.on(EventHandler::chats(|_| panic!("bad subscriber")));

        client.login("token-for-tests", true).await.unwrap();
        settle().await;
        advance(POLL).await;

        assert_eq!(client.status(), ClientStatus::Running);
        assert_eq!(transport.chat_requests().len(), 2);
    }

    // ===========================================
    // Subscription Tests
    // ===========================================

    #[tokio::test(start_paused = true)]
    async fn removed_handler_is_not_called() {
        let (client, _transport) = test_client(ClientConfig::default());
        let rec = Arc::new(Recorder::default());
        let r = Arc::clone(&rec);
        let id = client.on(EventHandler::started(move || r.push("started")));

        assert_eq!(client.handler_count(EventKind::Started), 1);
        assert!(client.remove_event_handler(EventKind::Started, id));
        assert_eq!(client.handler_count(EventKind::Started), 0);

        client.login("token-for-tests", true).await.unwrap();
        settle().await;
        assert!(rec.log().is_empty());
    }

    // ===========================================
    // Send Tests
    // ===========================================

    #[tokio::test]
    async fn send_chat_uses_stored_token() {
        let (client, transport) = test_client(ClientConfig::default());
        client.login("token-for-tests", false).await.unwrap();

        client
            .send_chat("alice", "hello", Destination::Channel("general".into()))
            .await
            .unwrap();

        assert_eq!(
            transport.last_call(),
            Some(MockCall::SendChat {
                token: ChatToken::new("token-for-tests"),
                sender: "alice".into(),
                msg: "hello".into(),
                destination: Destination::Channel("general".into()),
            })
        );
    }

    #[tokio::test]
    async fn send_chat_requires_login() {
        let (client, transport) = test_client(ClientConfig::default());

        let result = client
            .send_chat("alice", "hello", Destination::Tell("bob".into()))
            .await;

        assert!(matches!(result, Err(ClientError::NotAuthenticated)));
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn send_chat_failure_is_returned() {
        let (client, transport) = test_client(ClientConfig::default());
        client.login("token-for-tests", false).await.unwrap();
        transport.fail_next_send("not in channel");

        let result = client
            .send_chat("alice", "hello", Destination::Channel("town".into()))
            .await;

        assert!(matches!(result, Err(ClientError::Transport(_))));
        assert_eq!(client.status(), ClientStatus::Unauthenticated);
    }

    #[test]
    fn client_error_display() {
        let err = ClientError::from(TransportError::new("boom"));
        assert_eq!(err.to_string(), "transport error: boom");
        assert_eq!(ClientError::NotAuthenticated.to_string(), "not logged in");
    }
}
