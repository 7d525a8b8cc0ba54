//! Check-in reducer.

use checkin_types::CheckInRecord;

use super::state::{CheckInOperation, CheckInState};
use crate::store::OperationPhase;

#[derive(Debug, Clone, PartialEq)]
pub enum CheckInEvent {
    CheckInPending,
    CheckInFulfilled,
    CheckInRejected(String),
    StatusPending,
    StatusFulfilled(bool),
    StatusRejected(String),
    HistoryPending,
    HistoryFulfilled(Vec<CheckInRecord>),
    HistoryRejected(String),
    ErrorCleared,
}

pub fn update(state: &mut CheckInState, event: CheckInEvent) {
    match event {
        CheckInEvent::CheckInPending => begin(state, CheckInOperation::CheckIn),
        CheckInEvent::StatusPending => begin(state, CheckInOperation::TodayStatus),
        CheckInEvent::HistoryPending => begin(state, CheckInOperation::History),

        // Optimistic: a successful write always means checked in.
        CheckInEvent::CheckInFulfilled => {
            finish(state, CheckInOperation::CheckIn, OperationPhase::Fulfilled);
            state.today_checked_in = true;
        }
        // Authoritative: overwrite, never merge.
        CheckInEvent::StatusFulfilled(checked_in) => {
            finish(state, CheckInOperation::TodayStatus, OperationPhase::Fulfilled);
            state.today_checked_in = checked_in;
        }
        CheckInEvent::HistoryFulfilled(records) => {
            finish(state, CheckInOperation::History, OperationPhase::Fulfilled);
            state.history = records;
        }

        CheckInEvent::CheckInRejected(message) => reject(state, CheckInOperation::CheckIn, message),
        CheckInEvent::StatusRejected(message) => {
            reject(state, CheckInOperation::TodayStatus, message);
        }
        CheckInEvent::HistoryRejected(message) => reject(state, CheckInOperation::History, message),

        CheckInEvent::ErrorCleared => {
            state.error = None;
        }
    }
}

fn begin(state: &mut CheckInState, op: CheckInOperation) {
    state.loading = true;
    state.error = None;
    state.last_operation = Some(op);
    state.phase = OperationPhase::Pending;
}

fn finish(state: &mut CheckInState, op: CheckInOperation, phase: OperationPhase) {
    state.loading = false;
    state.last_operation = Some(op);
    state.phase = phase;
}

fn reject(state: &mut CheckInState, op: CheckInOperation, message: String) {
    finish(state, op, OperationPhase::Rejected);
    state.error = Some(message);
}
