//! The single outbound request pipeline.
//!
//! Every API call goes through [`GatewayClient::send`], which attaches the
//! bearer credential when one is stored and inspects the response before
//! the caller sees it. A 401 clears the credential and broadcasts
//! [`GatewayEvent::SessionInvalidated`]; every other outcome is passed
//! through untouched.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::broadcast;

use super::credentials::CredentialStore;
use super::error::{ApiError, ApiResult};

/// Standard User-Agent header for check-in API requests.
pub const USER_AGENT: &str = concat!("checkin/", env!("CARGO_PKG_VERSION"));

const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Signals emitted by the gateway for collaborators outside the stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayEvent {
    /// The server rejected the credential; it has already been discarded.
    /// Navigation should send the user back to the login entry point.
    SessionInvalidated,
}

/// Status and body of a successful (2xx) response.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    /// Decodes the body as JSON.
    ///
    /// # Errors
    /// Returns a `Parse` error if the body does not match `T`.
    pub fn json<T: DeserializeOwned>(&self) -> ApiResult<T> {
        serde_json::from_str(&self.body)
            .map_err(|e| ApiError::parse(self.status, format!("Parse error: {e}")))
    }
}

/// API client owning the credential slot.
#[derive(Clone)]
pub struct GatewayClient {
    http: reqwest::Client,
    base_url: String,
    credentials: Arc<dyn CredentialStore>,
    events: broadcast::Sender<GatewayEvent>,
}

impl GatewayClient {
    /// Creates a client for `base_url` backed by `credentials`.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(
        base_url: impl Into<String>,
        credentials: Arc<dyn CredentialStore>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().context("Failed to build HTTP client")?;
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        let base_url: String = base_url.into();
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
            events,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Subscribes to gateway events. Only events sent after this call are seen.
    pub fn subscribe(&self) -> broadcast::Receiver<GatewayEvent> {
        self.events.subscribe()
    }

    /// Startup probe: is a credential currently stored?
    pub fn has_credential(&self) -> bool {
        self.current_credential().is_some()
    }

    /// Persists a credential issued by a successful login.
    ///
    /// # Errors
    /// Returns an error if the credential cannot be written.
    pub fn store_credential(&self, token: &str) -> Result<()> {
        self.credentials.save(token)
    }

    /// Discards the stored credential.
    ///
    /// # Errors
    /// Returns an error if the credential slot cannot be written.
    pub fn clear_credential(&self) -> Result<()> {
        self.credentials.clear()
    }

    /// `GET {base}{path}` decoded as JSON.
    ///
    /// # Errors
    /// Returns the classified [`ApiError`] for any non-success outcome.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.send::<()>(Method::GET, path, None).await?.json()
    }

    /// `POST {base}{path}` with an optional JSON body, decoded as JSON.
    ///
    /// # Errors
    /// Returns the classified [`ApiError`] for any non-success outcome.
    pub async fn post<B, T>(&self, path: &str, body: Option<&B>) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(Method::POST, path, body).await?.json()
    }

    /// Sends a request through the pipeline and returns the raw 2xx response.
    ///
    /// # Errors
    /// - `Unauthorized` on 401, after the credential is cleared and the
    ///   invalidation event is broadcast
    /// - `HttpStatus` on any other non-2xx status
    /// - `Transport` if no response was received
    pub async fn send<B>(&self, method: Method, path: &str, body: Option<&B>) -> ApiResult<RawResponse>
    where
        B: Serialize + ?Sized,
    {
        let url = self.url(path);
        let mut builder = self
            .http
            .request(method.clone(), &url)
            .header("accept", "application/json");

        if let Some(token) = self.current_credential() {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        tracing::debug!(%method, path, "sending API request");
        let response = builder.send().await.map_err(|e| {
            let err = classify_transport_error(&e);
            tracing::warn!(%method, path, error = %err, "API request failed without a response");
            err
        })?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let error_body = response.text().await.unwrap_or_default();
            let err = ApiError::from_status(status, &error_body);
            if err.is_unauthorized() {
                self.invalidate_session(path);
            } else {
                tracing::debug!(%method, path, status, "API request rejected");
            }
            return Err(err);
        }

        let body = response
            .text()
            .await
            .map_err(|e| ApiError::transport(format!("Failed to read response body: {e}")))?;
        tracing::debug!(%method, path, status, "API request succeeded");
        Ok(RawResponse { status, body })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn current_credential(&self) -> Option<String> {
        match self.credentials.load() {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!(error = %e, "could not read stored credential; sending unauthenticated");
                None
            }
        }
    }

    fn invalidate_session(&self, path: &str) {
        if let Err(e) = self.credentials.clear() {
            tracing::warn!(error = %e, "failed to clear credential after authorization failure");
        }
        tracing::warn!(path, "authorization failure; session invalidated");
        // No subscribers is fine: nobody is waiting to navigate.
        let _ = self.events.send(GatewayEvent::SessionInvalidated);
    }
}

fn classify_transport_error(e: &reqwest::Error) -> ApiError {
    if e.is_timeout() {
        ApiError::transport("Request timed out")
    } else if e.is_connect() {
        ApiError::transport(format!("Connection failed: {e}"))
    } else {
        ApiError::transport(format!("Request failed: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};
    use tokio::sync::broadcast::error::TryRecvError;
    use wiremock::matchers::{header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::gateway::credentials::MemoryCredentialStore;
    use crate::gateway::error::ApiErrorKind;

    fn client_with(server: &MockServer, store: Arc<MemoryCredentialStore>) -> GatewayClient {
        GatewayClient::new(server.uri(), store, Some(Duration::from_secs(5))).unwrap()
    }

    #[tokio::test]
    async fn test_attaches_bearer_when_credential_present() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/checkins/today"))
            .and(header("authorization", "Bearer abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(true)))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_with(&server, Arc::new(MemoryCredentialStore::with_token("abc")));
        let checked: bool = client.get("/checkins/today").await.unwrap();
        assert!(checked);
    }

    #[tokio::test]
    async fn test_omits_authorization_without_credential() {
        let server = MockServer::start().await;
        Mock::given(header_exists("authorization"))
            .respond_with(ResponseTemplate::new(418))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/checkins/my"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let client = client_with(&server, Arc::new(MemoryCredentialStore::new()));
        let list: Vec<Value> = client.get("checkins/my").await.unwrap();
        assert!(list.is_empty());

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        assert!(!requests[0].headers.contains_key("authorization"));
    }

    #[tokio::test]
    async fn test_401_clears_credential_and_signals_once() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/checkins"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "expired"})))
            .mount(&server)
            .await;

        let store = Arc::new(MemoryCredentialStore::with_token("stale"));
        let client = client_with(&server, Arc::clone(&store));
        let mut events = client.subscribe();

        let err = client
            .post::<(), Value>("/checkins", None)
            .await
            .unwrap_err();

        assert_eq!(err.kind, ApiErrorKind::Unauthorized);
        assert_eq!(err.server_message.as_deref(), Some("expired"));
        assert_eq!(store.load().unwrap(), None);
        assert!(!client.has_credential());
        assert_eq!(events.try_recv().unwrap(), GatewayEvent::SessionInvalidated);
        assert_eq!(events.try_recv().unwrap_err(), TryRecvError::Empty);
    }

    #[tokio::test]
    async fn test_401_without_credential_still_signals() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let client = client_with(&server, Arc::new(MemoryCredentialStore::new()));
        let mut events = client.subscribe();

        let err = client.get::<Value>("/checkins/my").await.unwrap_err();
        assert!(err.is_unauthorized());
        assert_eq!(events.try_recv().unwrap(), GatewayEvent::SessionInvalidated);
    }

    #[tokio::test]
    async fn test_other_failures_pass_through_without_clearing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/checkins"))
            .respond_with(
                ResponseTemplate::new(409).set_body_json(json!({"message": "already checked in"})),
            )
            .mount(&server)
            .await;

        let store = Arc::new(MemoryCredentialStore::with_token("abc"));
        let client = client_with(&server, Arc::clone(&store));
        let mut events = client.subscribe();

        let err = client
            .post::<(), Value>("/checkins", None)
            .await
            .unwrap_err();

        assert_eq!(err.kind, ApiErrorKind::HttpStatus);
        assert_eq!(err.status, Some(409));
        assert_eq!(err.server_message.as_deref(), Some("already checked in"));
        assert_eq!(store.load().unwrap().as_deref(), Some("abc"));
        assert_eq!(events.try_recv().unwrap_err(), TryRecvError::Empty);
    }

    #[tokio::test]
    async fn test_transport_failure_keeps_credential() {
        // Nothing listens on port 1.
        let store = Arc::new(MemoryCredentialStore::with_token("abc"));
        let client = GatewayClient::new(
            "http://127.0.0.1:1",
            Arc::clone(&store) as Arc<dyn CredentialStore>,
            Some(Duration::from_secs(2)),
        )
        .unwrap();
        let mut events = client.subscribe();

        let err = client.get::<Value>("/checkins/today").await.unwrap_err();
        assert_eq!(err.kind, ApiErrorKind::Transport);
        assert_eq!(err.status, None);
        assert_eq!(store.load().unwrap().as_deref(), Some("abc"));
        assert_eq!(events.try_recv().unwrap_err(), TryRecvError::Empty);
    }

    #[tokio::test]
    async fn test_undecodable_success_body_is_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let client = client_with(&server, Arc::new(MemoryCredentialStore::new()));
        let err = client.get::<bool>("/checkins/today").await.unwrap_err();
        assert_eq!(err.kind, ApiErrorKind::Parse);
        assert_eq!(err.status, Some(200));
    }

    #[tokio::test]
    async fn test_sends_json_body_and_user_agent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .and(header("user-agent", USER_AGENT))
            .and(wiremock::matchers::body_json(json!({"username": "alice", "password": "pw"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "abc"})))
            .expect(1)
            .mount(&server)
            .await;

        let client = GatewayClient::new(
            format!("{}/api/", server.uri()),
            Arc::new(MemoryCredentialStore::new()),
            None,
        )
        .unwrap();
        assert!(client.base_url().ends_with("/api"));

        let body = json!({"username": "alice", "password": "pw"});
        let resp: Value = client.post("/auth/login", Some(&body)).await.unwrap();
        assert_eq!(resp["token"], "abc");
    }
}
