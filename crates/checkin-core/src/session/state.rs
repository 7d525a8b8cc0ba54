use checkin_types::UserProfile;

use crate::store::OperationPhase;

/// Operations that drive the session's pending/fulfilled/rejected phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOperation {
    Login,
    Register,
}

/// Authentication-related client state.
///
/// `is_authenticated` implies `user` is present and a credential is stored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub is_authenticated: bool,
    pub user: Option<UserProfile>,
    pub loading: bool,
    pub error: Option<String>,
    pub last_operation: Option<SessionOperation>,
    pub phase: OperationPhase,
}
