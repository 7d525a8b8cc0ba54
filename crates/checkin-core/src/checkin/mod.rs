//! Check-in store: today's status, history and the check-in operations.

mod state;
mod store;
pub mod update;

pub use state::{CheckInOperation, CheckInState};
pub use store::{CHECK_IN_FAILED, CheckInStore, HISTORY_FAILED, TODAY_STATUS_FAILED};
pub use update::CheckInEvent;
