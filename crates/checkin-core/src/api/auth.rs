use checkin_types::{LoginRequest, LoginResponse, RegisterRequest};
use reqwest::Method;

use crate::gateway::{ApiResult, GatewayClient, RawResponse};

/// `POST /auth/login`. Does not store the returned token.
///
/// # Errors
/// Returns the gateway's classified error.
pub async fn login(client: &GatewayClient, username: &str, password: &str) -> ApiResult<LoginResponse> {
    let body = LoginRequest { username, password };
    client.post("/auth/login", Some(&body)).await
}

/// `POST /auth/register`.
///
/// The created-resource payload is returned undecoded; some servers answer
/// with plain text.
///
/// # Errors
/// Returns the gateway's classified error.
pub async fn register(
    client: &GatewayClient,
    username: &str,
    email: &str,
    password: &str,
) -> ApiResult<RawResponse> {
    let body = RegisterRequest {
        username,
        email,
        password,
    };
    client.send(Method::POST, "/auth/register", Some(&body)).await
}
