//! Failed login API endpoints
//!
//! - GET    /api/v1/failed-logins - Paged attempt list
//! - GET    /api/v1/failed-logins/ip-addresses - Distinct source IPs
//! - GET    /api/v1/failed-logins/usernames - Distinct usernames
//! - DELETE /api/v1/failed-logins/{id} - Delete a recorded attempt

use axum::{
    extract::{Path, Query, State},
    routing::{delete, get},
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::api::middleware::{ApiError, AppState};
use crate::api::responses::{PageQuery, Paged};

/// Response for a single recorded attempt
#[derive(Debug, Serialize)]
pub struct FailedLoginResponse {
    pub id: Uuid,
    pub username: String,
    pub ip_address: String,
    pub user_agent: Option<String>,
    pub created_at: String,
}

impl From<crate::models::FailedLogin> for FailedLoginResponse {
    fn from(attempt: crate::models::FailedLogin) -> Self {
        Self {
            id: attempt.id,
            username: attempt.username,
            ip_address: attempt.ip_address,
            user_agent: attempt.user_agent,
            created_at: attempt.created_at.to_rfc3339(),
        }
    }
}

/// Build the failed-logins router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_failed_logins))
        .route("/ip-addresses", get(list_ip_addresses))
        .route("/usernames", get(list_usernames))
        .route("/{id}", delete(delete_failed_login))
}

/// GET /api/v1/failed-logins - Paged attempt list
async fn list_failed_logins(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Paged<FailedLoginResponse>>, ApiError> {
    let page = state.failed_login_service.list(&query.params()).await?;

    Ok(Json(Paged::from_page(page)))
}

/// GET /api/v1/failed-logins/ip-addresses - Distinct source IPs
async fn list_ip_addresses(
    State(state): State<AppState>,
) -> Result<Json<Vec<String>>, ApiError> {
    let ips = state.failed_login_service.list_ips().await?;

    Ok(Json(ips))
}

/// GET /api/v1/failed-logins/usernames - Distinct usernames
async fn list_usernames(State(state): State<AppState>) -> Result<Json<Vec<String>>, ApiError> {
    let usernames = state.failed_login_service.list_usernames().await?;

    Ok(Json(usernames))
}

/// DELETE /api/v1/failed-logins/{id} - Delete a recorded attempt
async fn delete_failed_login(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    state
        .failed_login_service
        .delete(&serde_json::json!({ "id": id.to_string() }))
        .await?;

    Ok(Json(serde_json::json!({ "message": "Failed login deleted" })))
}
