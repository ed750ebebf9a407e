//! Client status state machine for hmchat.
//!
//! This module provides a pure, side-effect-free state machine for the
//! polling client's lifecycle. The state machine takes events as input and
//! produces a new status plus a list of actions to execute.
//!
//! Emitting events and arming timers is performed by chat-client, not by
//! this module.

use std::fmt;
use std::time::Duration;

/// Client status - NO I/O, just state transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientStatus {
    /// Never started.
    Unauthenticated,
    /// Polling loop active.
    Running,
    /// Stopped by the application.
    Paused,
    /// Stopped by a failed poll cycle.
    Errored,
}

impl ClientStatus {
    /// Create a new state machine in the Unauthenticated state.
    pub fn new() -> Self {
        Self::Unauthenticated
    }

    /// Process an event and return the new status plus actions to execute.
    ///
    /// This is a pure function - no side effects. The caller (chat-client)
    /// is responsible for executing the returned actions.
    pub fn on_event(self, event: StatusEvent) -> (Self, Vec<Action>) {
        match (self, event) {
            // Start is accepted from every status, including Errored
            (_, StatusEvent::StartRequested) => (
                Self::Running,
                vec![
                    Action::Emit(Notice::Started),
                    Action::ScheduleIteration {
                        delay: Duration::ZERO,
                    },
                ],
            ),

            (_, StatusEvent::PauseRequested) => (
                Self::Paused,
                vec![Action::Emit(Notice::Stopped), Action::CancelScheduled],
            ),

            (Self::Running, StatusEvent::CycleFailed) => (
                Self::Errored,
                vec![Action::Emit(Notice::Error), Action::Emit(Notice::Stopped)],
            ),
            // A cycle that was already in flight when the loop stopped.
            // Stopped has been emitted once already.
            (state, StatusEvent::CycleFailed) => (state, vec![Action::Emit(Notice::Error)]),

            (Self::Running, StatusEvent::CycleCompleted { poll_interval }) => (
                Self::Running,
                vec![Action::ScheduleIteration {
                    delay: poll_interval,
                }],
            ),

            (state, StatusEvent::CycleCompleted { .. }) => (state, vec![]),
        }
    }

    /// Check if the polling loop should be active.
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }

    /// Lowercase name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthed",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Errored => "errored",
        }
    }
}

impl Default for ClientStatus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClientStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Events that can occur in the client lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusEvent {
    /// Application called `start()`.
    StartRequested,
    /// Application called `pause()`.
    PauseRequested,
    /// A poll cycle returned an error.
    CycleFailed,
    /// A poll cycle finished without error.
    CycleCompleted {
        /// Delay before the next cycle.
        poll_interval: Duration,
    },
}

/// Actions to be executed by the chat-client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Notify subscribers.
    Emit(Notice),
    /// Arm the scheduler, replacing any pending iteration.
    ScheduleIteration {
        /// Delay before the iteration runs.
        delay: Duration,
    },
    /// Drop the pending iteration, if any.
    CancelScheduled,
}

/// Lifecycle notifications. The error payload is supplied by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    /// Loop started.
    Started,
    /// Loop stopped.
    Stopped,
    /// A cycle failed.
    Error,
}
