use checkin_types::{CheckInRecord, TodayStatus};
use reqwest::Method;

use crate::gateway::{ApiResult, GatewayClient};

/// `POST /checkins`, no body.
///
/// The created record is decoded when possible; a success with an
/// unexpected body is still a success.
///
/// # Errors
/// Returns the gateway's classified error.
pub async fn create(client: &GatewayClient) -> ApiResult<Option<CheckInRecord>> {
    let raw = client.send::<()>(Method::POST, "/checkins", None).await?;
    Ok(raw.json().ok())
}

/// `GET /checkins/today`.
///
/// # Errors
/// Returns the gateway's classified error.
pub async fn today(client: &GatewayClient) -> ApiResult<bool> {
    let status: TodayStatus = client.get("/checkins/today").await?;
    Ok(status.checked_in())
}

/// `GET /checkins/my`, in server order.
///
/// # Errors
/// Returns the gateway's classified error.
pub async fn mine(client: &GatewayClient) -> ApiResult<Vec<CheckInRecord>> {
    client.get("/checkins/my").await
}
