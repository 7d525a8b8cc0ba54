//! Endpoint wrappers for the check-in API contract.
//!
//! Each function is a thin typed call through the [`GatewayClient`]; none of
//! them touch store state.
//!
//! [`GatewayClient`]: crate::gateway::GatewayClient

pub mod auth;
pub mod checkins;
