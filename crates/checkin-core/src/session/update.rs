//! Session reducer.
//!
//! Pure state transitions; all I/O happens in the store before or after.

use checkin_types::UserProfile;

use super::state::{Session, SessionOperation};
use crate::store::OperationPhase;

/// Inputs to the session reducer.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    LoginPending,
    LoginFulfilled(UserProfile),
    LoginRejected(String),
    RegisterPending,
    RegisterFulfilled,
    RegisterRejected(String),
    /// Explicit, local-only logout.
    LoggedOut,
    /// The gateway discarded the credential after an authorization failure.
    Invalidated,
    ErrorCleared,
}

pub fn update(state: &mut Session, event: SessionEvent) {
    match event {
        SessionEvent::LoginPending => begin(state, SessionOperation::Login),
        SessionEvent::RegisterPending => begin(state, SessionOperation::Register),
        SessionEvent::LoginFulfilled(profile) => {
            finish(state, SessionOperation::Login, OperationPhase::Fulfilled);
            state.is_authenticated = true;
            state.user = Some(profile);
            state.error = None;
        }
        SessionEvent::RegisterFulfilled => {
            finish(state, SessionOperation::Register, OperationPhase::Fulfilled);
        }
        SessionEvent::LoginRejected(message) => {
            finish(state, SessionOperation::Login, OperationPhase::Rejected);
            state.error = Some(message);
        }
        SessionEvent::RegisterRejected(message) => {
            finish(state, SessionOperation::Register, OperationPhase::Rejected);
            state.error = Some(message);
        }
        SessionEvent::LoggedOut | SessionEvent::Invalidated => {
            state.is_authenticated = false;
            state.user = None;
        }
        SessionEvent::ErrorCleared => {
            state.error = None;
        }
    }
}

/// Pending: set loading and drop any previous error before the call resolves.
fn begin(state: &mut Session, op: SessionOperation) {
    state.loading = true;
    state.error = None;
    state.last_operation = Some(op);
    state.phase = OperationPhase::Pending;
}

fn finish(state: &mut Session, op: SessionOperation, phase: OperationPhase) {
    state.loading = false;
    state.last_operation = Some(op);
    state.phase = phase;
}
