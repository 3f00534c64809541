//! Authentication API endpoints
//!
//! - POST /api/v1/auth/token - Log in with username and password
//! - POST /api/v1/auth/refresh - Extend the current session
//! - POST /api/v1/auth/logout - Drop the current session
//! - GET  /api/v1/auth/me - Current user and roles
//! - POST /api/v1/auth/reset-password - Request a password reset code
//! - GET  /api/v1/auth/reset-password/{code} - Check a reset code
//! - POST /api/v1/auth/change-password - Redeem a reset code

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;
use std::net::IpAddr;

use crate::api::middleware::{session_token, ApiError, AppState};
use crate::api::roles::RoleResponse;
use crate::api::users::UserResponse;

/// Response for a successful login or refresh
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
    pub expires_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserResponse>,
}

/// Response for the current user
#[derive(Debug, Serialize)]
pub struct MeResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub roles: Vec<RoleResponse>,
}

/// Response for a reset code check
#[derive(Debug, Serialize)]
pub struct ResetCheckResponse {
    pub valid: bool,
}

/// Build the public auth router
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/token", post(login))
        .route("/reset-password", post(request_reset))
        .route("/reset-password/{code}", get(check_reset))
        .route("/change-password", post(change_password))
}

/// Build the auth router that requires a valid session
pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/refresh", post(refresh))
        .route("/logout", post(logout))
        .route("/me", get(me))
}

/// Client IP as reported by the reverse proxy, falling back to
/// loopback for direct connections
fn client_ip(headers: &HeaderMap) -> IpAddr {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|v| v.trim().parse::<IpAddr>().ok());

    forwarded
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<IpAddr>().ok())
        })
        .unwrap_or(IpAddr::from([127, 0, 0, 1]))
}

fn user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string())
}

/// POST /api/v1/auth/token - Log in
async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<Value>,
) -> Result<Json<TokenResponse>, ApiError> {
    let ip = client_ip(&headers);
    let agent = user_agent(&headers);

    let (session, user) = state.auth_service.login(&payload, ip, agent).await?;

    Ok(Json(TokenResponse {
        token: session.token.to_string(),
        expires_at: session.expires_at.to_rfc3339(),
        user: Some(user.into()),
    }))
}

/// POST /api/v1/auth/refresh - Extend the current session
async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<TokenResponse>, ApiError> {
    let token = session_token(&headers)?;
    let session = state.auth_service.refresh(token).await?;

    Ok(Json(TokenResponse {
        token: session.token.to_string(),
        expires_at: session.expires_at.to_rfc3339(),
        user: None,
    }))
}

/// POST /api/v1/auth/logout - Drop the current session
async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    let token = session_token(&headers)?;
    state.auth_service.logout(token).await?;

    Ok(Json(serde_json::json!({ "message": "Logged out" })))
}

/// GET /api/v1/auth/me - Current user and roles
async fn me(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<MeResponse>, ApiError> {
    let token = session_token(&headers)?;
    let (user, roles) = state.auth_service.me(token).await?;

    Ok(Json(MeResponse {
        user: user.into(),
        roles: roles.into_iter().map(Into::into).collect(),
    }))
}

/// POST /api/v1/auth/reset-password - Request a reset code
///
/// Always returns success so the endpoint does not reveal whether the
/// address is registered.
async fn request_reset(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    state.auth_service.request_reset(&payload).await?;

    Ok(Json(serde_json::json!({ "message": "Reset code issued" })))
}

/// GET /api/v1/auth/reset-password/{code} - Check a reset code
async fn check_reset(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<ResetCheckResponse>, ApiError> {
    let valid = state.auth_service.check_reset(&code).await?;

    Ok(Json(ResetCheckResponse { valid }))
}

/// POST /api/v1/auth/change-password - Redeem a reset code
async fn change_password(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    state.auth_service.change_password(&payload).await?;

    Ok(Json(serde_json::json!({ "message": "Password changed" })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_client_ip_prefers_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.2"));

        assert_eq!(client_ip(&headers), "203.0.113.7".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn test_client_ip_falls_back_to_real_ip() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.4"));

        assert_eq!(client_ip(&headers), "198.51.100.4".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn test_client_ip_defaults_to_loopback() {
        assert_eq!(client_ip(&HeaderMap::new()), IpAddr::from([127, 0, 0, 1]));
    }

    #[test]
    fn test_invalid_forwarded_for_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("not-an-ip"));

        assert_eq!(client_ip(&headers), IpAddr::from([127, 0, 0, 1]));
    }
}
