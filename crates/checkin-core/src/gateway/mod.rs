//! Gateway client: credential attachment and global authorization-failure handling.

pub mod client;
pub mod credentials;
pub mod error;

pub use client::{GatewayClient, GatewayEvent, RawResponse, USER_AGENT};
pub use credentials::{CredentialStore, FileCredentialStore, MemoryCredentialStore, TOKEN_KEY};
pub use error::{ApiError, ApiErrorKind, ApiResult};
