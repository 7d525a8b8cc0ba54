//! Session and check-in client core.
//!
//! All outbound calls go through [`gateway::GatewayClient`], which owns the
//! stored credential. [`session::SessionStore`] and [`checkin::CheckInStore`]
//! hold observable state and expose the async operations that mutate it.

pub mod api;
pub mod checkin;
pub mod config;
pub mod gateway;
pub mod logging;
pub mod session;
pub mod store;
