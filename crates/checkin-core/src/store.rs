//! Shared store plumbing.
//!
//! A store owns one slice of client state inside a `watch` channel. Async
//! operations never hold the state while awaiting the network: they apply a
//! pending event, await the gateway, then apply the terminal event. That is
//! the whole pending/fulfilled/rejected contract.

use tokio::sync::watch;

use crate::gateway::ApiErrorKind;

/// Phase of the most recent operation issued on a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OperationPhase {
    #[default]
    Idle,
    Pending,
    Fulfilled,
    Rejected,
}

/// What an operation resolved to. Operations never return `Err`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationOutcome {
    Fulfilled,
    Rejected {
        /// `None` when the failure happened locally (e.g. the credential
        /// could not be persisted)
        kind: Option<ApiErrorKind>,
        message: String,
    },
}

impl OperationOutcome {
    pub fn is_fulfilled(&self) -> bool {
        matches!(self, OperationOutcome::Fulfilled)
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            OperationOutcome::Fulfilled => None,
            OperationOutcome::Rejected { message, .. } => Some(message),
        }
    }

    pub(crate) fn rejected(kind: Option<ApiErrorKind>, message: impl Into<String>) -> Self {
        OperationOutcome::Rejected {
            kind,
            message: message.into(),
        }
    }
}

/// Observable state cell driven by a reducer.
#[derive(Debug)]
pub(crate) struct StateCell<S> {
    tx: watch::Sender<S>,
}

impl<S: Clone + PartialEq> StateCell<S> {
    pub(crate) fn new(initial: S) -> Self {
        Self {
            tx: watch::Sender::new(initial),
        }
    }

    pub(crate) fn snapshot(&self) -> S {
        self.tx.borrow().clone()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<S> {
        self.tx.subscribe()
    }

    /// Runs `reduce` on the current state. Observers are notified only if
    /// the state actually changed.
    pub(crate) fn apply(&self, reduce: impl FnOnce(&mut S)) {
        self.tx.send_if_modified(|state| {
            let before = state.clone();
            reduce(state);
            *state != before
        });
    }
}
