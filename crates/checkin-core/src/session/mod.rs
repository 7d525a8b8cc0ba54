//! Session store: authentication state and the login/register/logout operations.

mod state;
mod store;
pub mod update;

pub use state::{Session, SessionOperation};
pub use store::{LOGIN_FAILED, REGISTRATION_FAILED, SessionStore};
pub use update::SessionEvent;
