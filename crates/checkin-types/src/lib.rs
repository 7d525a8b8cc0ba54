//! Wire and domain types shared by the check-in client crates.
//!
//! These mirror the JSON contract of the check-in API. Records are
//! immutable once decoded; the client only ever replaces whole lists.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Profile fields returned alongside the token on login.
///
/// The server decides which fields it sends; `username` is the only one the
/// client reads directly, everything else is kept verbatim in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl UserProfile {
    pub fn display_name(&self) -> &str {
        self.username.as_deref().unwrap_or("(unknown user)")
    }
}

/// Body of `POST /auth/login`.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Success payload of `POST /auth/login`: `{token, ...userProfile}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(flatten)]
    pub profile: UserProfile,
}

impl LoginResponse {
    /// Returns the token if present and non-blank.
    pub fn token(&self) -> Option<&str> {
        self.token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

/// Body of `POST /auth/register`.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

/// Record identifier. The server may send numeric or string ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Int(i64),
    Text(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Int(id) => write!(f, "{id}"),
            RecordId::Text(id) => f.write_str(id),
        }
    }
}

/// One check-in as returned by `GET /checkins/my` or `POST /checkins`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInRecord {
    pub id: RecordId,
    /// Timestamp exactly as sent by the server.
    pub checkin_time: String,
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl CheckInRecord {
    /// Parses `checkin_time` as RFC 3339 or as a naive ISO local time.
    pub fn parsed_time(&self) -> Option<NaiveDateTime> {
        let raw = self.checkin_time.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.naive_local());
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").ok()
    }
}

/// Result of `GET /checkins/today`.
///
/// The server answers with a bare boolean; some deployments wrap it in an
/// object, so both shapes are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum TodayStatus {
    Flag(bool),
    Object {
        #[serde(alias = "todayCheckedIn", alias = "checked_in", rename = "checkedIn")]
        checked_in: bool,
    },
}

impl TodayStatus {
    pub fn checked_in(self) -> bool {
        match self {
            TodayStatus::Flag(flag) => flag,
            TodayStatus::Object { checked_in } => checked_in,
        }
    }
}

/// Failure payload convention: a JSON object with a `message` field.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorBody {
    /// Extracts a non-blank `message` from a raw response body, if any.
    pub fn message_from(body: &str) -> Option<String> {
        serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.message)
            .filter(|m| !m.trim().is_empty())
    }
}
