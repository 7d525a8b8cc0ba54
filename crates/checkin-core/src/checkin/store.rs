use tokio::sync::watch;

use super::state::CheckInState;
use super::update::{CheckInEvent, update};
use crate::api;
use crate::gateway::{ApiError, GatewayClient};
use crate::store::{OperationOutcome, StateCell};

pub const CHECK_IN_FAILED: &str = "Check-in failed";
pub const TODAY_STATUS_FAILED: &str = "Failed to get today status";
pub const HISTORY_FAILED: &str = "Failed to get check-in records";

/// Holds check-in state and issues the check-in operations.
pub struct CheckInStore {
    gateway: GatewayClient,
    state: StateCell<CheckInState>,
}

impl CheckInStore {
    pub fn new(gateway: GatewayClient) -> Self {
        Self {
            gateway,
            state: StateCell::new(CheckInState::default()),
        }
    }

    pub fn snapshot(&self) -> CheckInState {
        self.state.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<CheckInState> {
        self.state.subscribe()
    }

    /// Creates today's check-in.
    pub async fn perform_check_in(&self) -> OperationOutcome {
        self.dispatch(CheckInEvent::CheckInPending);

        match api::checkins::create(&self.gateway).await {
            Ok(record) => {
                if let Some(record) = &record {
                    tracing::info!(id = %record.id, "checked in");
                }
                self.dispatch(CheckInEvent::CheckInFulfilled);
                OperationOutcome::Fulfilled
            }
            Err(err) => self.reject(&err, CHECK_IN_FAILED, CheckInEvent::CheckInRejected),
        }
    }

    /// Reads whether today's check-in exists. Overwrites any optimistic value.
    pub async fn get_today_status(&self) -> OperationOutcome {
        self.dispatch(CheckInEvent::StatusPending);

        match api::checkins::today(&self.gateway).await {
            Ok(checked_in) => {
                self.dispatch(CheckInEvent::StatusFulfilled(checked_in));
                OperationOutcome::Fulfilled
            }
            Err(err) => self.reject(&err, TODAY_STATUS_FAILED, CheckInEvent::StatusRejected),
        }
    }

    /// Replaces the history with the server's list.
    pub async fn get_my_check_ins(&self) -> OperationOutcome {
        self.dispatch(CheckInEvent::HistoryPending);

        match api::checkins::mine(&self.gateway).await {
            Ok(records) => {
                tracing::debug!(count = records.len(), "loaded check-in history");
                self.dispatch(CheckInEvent::HistoryFulfilled(records));
                OperationOutcome::Fulfilled
            }
            Err(err) => self.reject(&err, HISTORY_FAILED, CheckInEvent::HistoryRejected),
        }
    }

    pub fn clear_error(&self) {
        self.dispatch(CheckInEvent::ErrorCleared);
    }

    fn dispatch(&self, event: CheckInEvent) {
        self.state.apply(|state| update(state, event));
    }

    fn reject(
        &self,
        err: &ApiError,
        fallback: &str,
        event: fn(String) -> CheckInEvent,
    ) -> OperationOutcome {
        tracing::debug!(kind = %err.kind, error = %err, "check-in operation rejected");
        let message = err.user_message(fallback);
        self.dispatch(event(message.clone()));
        OperationOutcome::rejected(Some(err.kind), message)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use checkin_types::RecordId;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::gateway::{ApiErrorKind, CredentialStore, MemoryCredentialStore};
    use crate::store::OperationPhase;

    fn store_with(server: &MockServer, creds: &Arc<MemoryCredentialStore>) -> CheckInStore {
        let gateway = GatewayClient::new(
            server.uri(),
            Arc::clone(creds) as Arc<dyn CredentialStore>,
            None,
        )
        .unwrap();
        CheckInStore::new(gateway)
    }

    fn authed() -> Arc<MemoryCredentialStore> {
        Arc::new(MemoryCredentialStore::with_token("abc"))
    }

    #[tokio::test]
    async fn test_check_in_then_status_false_reads_false() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/checkins"))
            .and(header("authorization", "Bearer abc"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": 9,
                "checkinTime": "2024-05-01T08:30:00"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/checkins/today"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(false)))
            .mount(&server)
            .await;

        let store = store_with(&server, &authed());

        assert!(store.perform_check_in().await.is_fulfilled());
        assert!(store.snapshot().today_checked_in);

        assert!(store.get_today_status().await.is_fulfilled());
        let state = store.snapshot();
        assert!(!state.today_checked_in);
        assert!(!state.loading);
        assert_eq!(state.phase, OperationPhase::Fulfilled);
    }

    #[tokio::test]
    async fn test_check_in_with_plain_text_body_still_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/checkins"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&server)
            .await;

        let store = store_with(&server, &authed());
        assert!(store.perform_check_in().await.is_fulfilled());
        assert!(store.snapshot().today_checked_in);
    }

    #[tokio::test]
    async fn test_check_in_conflict_keeps_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/checkins"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(json!({"message": "already checked in today"})),
            )
            .mount(&server)
            .await;

        let store = store_with(&server, &authed());
        let outcome = store.perform_check_in().await;

        assert_eq!(
            outcome,
            OperationOutcome::rejected(Some(ApiErrorKind::HttpStatus), "already checked in today")
        );
        let state = store.snapshot();
        assert!(!state.today_checked_in);
        assert_eq!(state.error.as_deref(), Some("already checked in today"));
    }

    #[tokio::test]
    async fn test_status_accepts_object_payload() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/checkins/today"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"checkedIn": true})))
            .mount(&server)
            .await;

        let store = store_with(&server, &authed());
        assert!(store.get_today_status().await.is_fulfilled());
        assert!(store.snapshot().today_checked_in);
    }

    #[tokio::test]
    async fn test_status_parse_failure_uses_fallback() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/checkins/today"))
            .respond_with(ResponseTemplate::new(200).set_body_string("maybe"))
            .mount(&server)
            .await;

        let store = store_with(&server, &authed());
        let outcome = store.get_today_status().await;

        assert_eq!(
            outcome,
            OperationOutcome::rejected(Some(ApiErrorKind::Parse), TODAY_STATUS_FAILED)
        );
    }

    #[tokio::test]
    async fn test_history_failure_after_success_keeps_list() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/checkins/my"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 1, "checkinTime": "2024-05-01T08:30:00", "status": "on_time"}
            ])))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/checkins/my"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let store = store_with(&server, &authed());

        assert!(store.get_my_check_ins().await.is_fulfilled());
        let loaded = store.snapshot().history;
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, RecordId::Int(1));

        let outcome = store.get_my_check_ins().await;
        assert_eq!(outcome.error_message(), Some(HISTORY_FAILED));

        let state = store.snapshot();
        assert_eq!(state.history, loaded);
        assert_eq!(state.error.as_deref(), Some(HISTORY_FAILED));
    }

    #[tokio::test]
    async fn test_history_keeps_server_order() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/checkins/my"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 3, "checkinTime": "2024-05-03T08:30:00"},
                {"id": 1, "checkinTime": "2024-05-01T08:30:00"},
                {"id": 2, "checkinTime": "2024-05-02T08:30:00"}
            ])))
            .mount(&server)
            .await;

        let store = store_with(&server, &authed());
        store.get_my_check_ins().await;

        let ids: Vec<_> = store.snapshot().history.into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![RecordId::Int(3), RecordId::Int(1), RecordId::Int(2)]);
    }

    #[tokio::test]
    async fn test_unauthorized_read_clears_credential() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/checkins/my"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let creds = authed();
        let store = store_with(&server, &creds);
        let outcome = store.get_my_check_ins().await;

        assert_eq!(
            outcome,
            OperationOutcome::rejected(Some(ApiErrorKind::Unauthorized), HISTORY_FAILED)
        );
        assert_eq!(creds.load().unwrap(), None);
    }

    #[tokio::test]
    async fn test_clear_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/checkins"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let store = store_with(&server, &authed());
        let mut rx = store.subscribe();

        store.clear_error();
        assert!(!rx.has_changed().unwrap());

        store.perform_check_in().await;
        assert_eq!(store.snapshot().error.as_deref(), Some(CHECK_IN_FAILED));
        let _ = rx.borrow_and_update();

        store.clear_error();
        assert!(rx.has_changed().unwrap());
        let state = store.snapshot();
        assert_eq!(state.error, None);
        assert_eq!(state.phase, OperationPhase::Rejected);
    }
}
