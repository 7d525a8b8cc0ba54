//! CLI command handlers.

pub mod auth;
pub mod checkins;
pub mod config;
