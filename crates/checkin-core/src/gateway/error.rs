//! Typed failures produced by the gateway pipeline.

use std::fmt;

use checkin_types::ErrorBody;
use serde::{Deserialize, Serialize};

/// Categories of API failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiErrorKind {
    /// HTTP 401: credential missing, invalid or expired
    Unauthorized,
    /// Any other non-2xx status
    HttpStatus,
    /// No response received (connection refused, DNS, timeout)
    Transport,
    /// A 2xx response whose body could not be decoded
    Parse,
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiErrorKind::Unauthorized => write!(f, "unauthorized"),
            ApiErrorKind::HttpStatus => write!(f, "http_status"),
            ApiErrorKind::Transport => write!(f, "transport"),
            ApiErrorKind::Parse => write!(f, "parse"),
        }
    }
}

/// Structured API error with kind and details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub kind: ApiErrorKind,
    /// HTTP status, when a response was received
    pub status: Option<u16>,
    /// One-line summary suitable for logs
    pub message: String,
    /// `message` field of the server's JSON failure payload, if any
    pub server_message: Option<String>,
}

impl ApiError {
    /// Builds an error from a non-2xx response.
    pub fn from_status(status: u16, body: &str) -> Self {
        let server_message = ErrorBody::message_from(body);
        let kind = if status == 401 {
            ApiErrorKind::Unauthorized
        } else {
            ApiErrorKind::HttpStatus
        };
        let message = match &server_message {
            Some(msg) => format!("HTTP {status}: {msg}"),
            None => format!("HTTP {status}"),
        };
        Self {
            kind,
            status: Some(status),
            message,
            server_message,
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            kind: ApiErrorKind::Transport,
            status: None,
            message: message.into(),
            server_message: None,
        }
    }

    pub fn parse(status: u16, message: impl Into<String>) -> Self {
        Self {
            kind: ApiErrorKind::Parse,
            status: Some(status),
            message: message.into(),
            server_message: None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.kind == ApiErrorKind::Unauthorized
    }

    /// Text to surface to a user: the server's message, else `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        self.server_message
            .clone()
            .unwrap_or_else(|| fallback.to_string())
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}

/// Result type for gateway operations.
pub type ApiResult<T> = std::result::Result<T, ApiError>;
