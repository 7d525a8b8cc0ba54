use std::sync::{Mutex, PoisonError};

use checkin_types::UserProfile;
use tokio::sync::broadcast::{self, error::TryRecvError};
use tokio::sync::watch;

use super::state::Session;
use super::update::{SessionEvent, update};
use crate::api;
use crate::gateway::{ApiError, GatewayClient, GatewayEvent};
use crate::store::{OperationOutcome, StateCell};

pub const LOGIN_FAILED: &str = "Login failed";
pub const REGISTRATION_FAILED: &str = "Registration failed";

/// Holds the session and issues auth operations through the gateway.
///
/// Concurrent calls are not deduplicated. Callers should not re-submit while
/// `loading` is true: a stale response can otherwise clear `loading` early.
///
/// The store follows the gateway's invalidation signal on its own: an
/// authorization failure from any request resets the session the next time
/// the store is read or used.
pub struct SessionStore {
    gateway: GatewayClient,
    state: StateCell<Session>,
    invalidations: Mutex<broadcast::Receiver<GatewayEvent>>,
}

impl SessionStore {
    /// Starts with an empty, unauthenticated session regardless of any
    /// stored credential; see [`SessionStore::has_stored_credential`].
    pub fn new(gateway: GatewayClient) -> Self {
        let invalidations = Mutex::new(gateway.subscribe());
        Self {
            gateway,
            state: StateCell::new(Session::default()),
            invalidations,
        }
    }

    pub fn gateway(&self) -> &GatewayClient {
        &self.gateway
    }

    pub fn snapshot(&self) -> Session {
        self.sync_invalidations();
        self.state.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.sync_invalidations();
        self.state.subscribe()
    }

    pub fn is_authenticated(&self) -> bool {
        self.snapshot().is_authenticated
    }

    /// Startup probe for an "already logged in" credential.
    pub fn has_stored_credential(&self) -> bool {
        self.gateway.has_credential()
    }

    /// Authenticates and, on success, stores the returned credential.
    pub async fn login(&self, username: &str, password: &str) -> OperationOutcome {
        self.sync_invalidations();
        self.dispatch(SessionEvent::LoginPending);

        match api::auth::login(&self.gateway, username, password).await {
            Ok(response) => {
                let Some(token) = response.token() else {
                    tracing::warn!(username, "login succeeded without a token");
                    return self.reject_login(OperationOutcome::rejected(None, LOGIN_FAILED));
                };
                if let Err(e) = self.gateway.store_credential(token) {
                    tracing::warn!(error = %e, "failed to persist credential");
                    return self.reject_login(OperationOutcome::rejected(None, LOGIN_FAILED));
                }
                tracing::info!(username, "logged in");
                self.sync_invalidations();
                self.fulfill_login(response.profile)
            }
            Err(err) => self.reject_login(rejection(&err, LOGIN_FAILED)),
        }
    }

    /// Creates an account. Never stores a credential.
    pub async fn register(&self, username: &str, email: &str, password: &str) -> OperationOutcome {
        self.sync_invalidations();
        self.dispatch(SessionEvent::RegisterPending);

        match api::auth::register(&self.gateway, username, email, password).await {
            Ok(_) => {
                tracing::info!(username, "registered");
                self.dispatch(SessionEvent::RegisterFulfilled);
                OperationOutcome::Fulfilled
            }
            Err(err) => {
                let outcome = rejection(&err, REGISTRATION_FAILED);
                self.dispatch(SessionEvent::RegisterRejected(message_of(&outcome)));
                outcome
            }
        }
    }

    /// Local-only logout. Never fails: a credential that cannot be cleared
    /// is logged and the session is reset anyway.
    pub fn logout(&self) {
        if let Err(e) = self.gateway.clear_credential() {
            tracing::warn!(error = %e, "failed to clear credential on logout");
        }
        self.dispatch(SessionEvent::LoggedOut);
    }

    /// Resets the session after the gateway reported an authorization
    /// failure. The credential is already gone by then.
    pub fn invalidate(&self) {
        self.dispatch(SessionEvent::Invalidated);
    }

    pub fn clear_error(&self) {
        self.sync_invalidations();
        self.dispatch(SessionEvent::ErrorCleared);
    }

    /// Applies invalidations the gateway raised since the last call.
    fn sync_invalidations(&self) {
        let mut invalidated = false;
        {
            let mut rx = self
                .invalidations
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            loop {
                match rx.try_recv() {
                    Ok(GatewayEvent::SessionInvalidated) | Err(TryRecvError::Lagged(_)) => {
                        invalidated = true;
                    }
                    Err(TryRecvError::Empty | TryRecvError::Closed) => break,
                }
            }
        }
        if invalidated {
            self.dispatch(SessionEvent::Invalidated);
        }
    }

    fn dispatch(&self, event: SessionEvent) {
        self.state.apply(|state| update(state, event));
    }

    fn fulfill_login(&self, profile: UserProfile) -> OperationOutcome {
        self.dispatch(SessionEvent::LoginFulfilled(profile));
        OperationOutcome::Fulfilled
    }

    fn reject_login(&self, outcome: OperationOutcome) -> OperationOutcome {
        self.dispatch(SessionEvent::LoginRejected(message_of(&outcome)));
        outcome
    }
}

fn rejection(err: &ApiError, fallback: &str) -> OperationOutcome {
    tracing::debug!(kind = %err.kind, error = %err, "session operation rejected");
    OperationOutcome::rejected(Some(err.kind), err.user_message(fallback))
}

fn message_of(outcome: &OperationOutcome) -> String {
    outcome.error_message().unwrap_or_default().to_string()
}
