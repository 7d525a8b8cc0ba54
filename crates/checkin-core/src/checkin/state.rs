use checkin_types::CheckInRecord;

use crate::store::OperationPhase;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckInOperation {
    CheckIn,
    TodayStatus,
    History,
}

/// Check-in status and history for the signed-in user.
///
/// Status and history are written independently: an operation only touches
/// the fields it owns on success, and failures never clear loaded data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckInState {
    pub today_checked_in: bool,
    /// Server order, replaced wholesale on every successful fetch.
    pub history: Vec<CheckInRecord>,
    pub loading: bool,
    pub error: Option<String>,
    pub last_operation: Option<CheckInOperation>,
    pub phase: OperationPhase,
}
