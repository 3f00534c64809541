//! User API endpoints
//!
//! - GET    /api/v1/users - Paged user list
//! - GET    /api/v1/users/all - All users
//! - GET    /api/v1/users/{id} - Single user with roles
//! - POST   /api/v1/users - Create a user
//! - PUT    /api/v1/users/{id} - Update a user
//! - PUT    /api/v1/users/{id}/password - Set a user's password
//! - DELETE /api/v1/users/{id} - Delete a user

use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::api::middleware::{ApiError, AppState};
use crate::api::responses::{PageQuery, Paged};
use crate::api::roles::RoleResponse;
use crate::validation::Method;

/// Response for a single user
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<crate::models::User> for UserResponse {
    fn from(user: crate::models::User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            active: user.active,
            created_at: user.created_at.to_rfc3339(),
            updated_at: user.updated_at.to_rfc3339(),
        }
    }
}

/// Response for a user together with their roles
#[derive(Debug, Serialize)]
pub struct UserDetailResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub roles: Vec<RoleResponse>,
}

/// Build the users router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users))
        .route("/", post(create_user))
        .route("/all", get(list_all_users))
        .route("/{id}", get(get_user))
        .route("/{id}", put(update_user))
        .route("/{id}", delete(delete_user))
        .route("/{id}/password", put(save_password))
}

/// GET /api/v1/users - Paged user list
async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Paged<UserResponse>>, ApiError> {
    let page = state.user_service.list(&query.params()).await?;

    Ok(Json(Paged::from_page(page)))
}

/// GET /api/v1/users/all - All users
async fn list_all_users(
    State(state): State<AppState>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let users = state.user_service.list_all().await?;

    Ok(Json(users.into_iter().map(Into::into).collect()))
}

/// GET /api/v1/users/{id} - Single user with roles
async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<UserDetailResponse>, ApiError> {
    let (user, roles) = state
        .user_service
        .get_with_roles(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("User not found: {}", id)))?;

    Ok(Json(UserDetailResponse {
        user: user.into(),
        roles: roles.into_iter().map(Into::into).collect(),
    }))
}

/// POST /api/v1/users - Create a user
async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state.user_service.save(&payload, Method::Create).await?;

    Ok(Json(user.into()))
}

/// PUT /api/v1/users/{id} - Update a user
async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(mut payload): Json<Value>,
) -> Result<Json<UserResponse>, ApiError> {
    set_payload_id(&mut payload, id);
    let user = state.user_service.save(&payload, Method::Update).await?;

    Ok(Json(user.into()))
}

/// PUT /api/v1/users/{id}/password - Set a user's password
async fn save_password(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(mut payload): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    set_payload_id(&mut payload, id);
    state.user_service.save_password(&payload).await?;

    Ok(Json(serde_json::json!({ "message": "Password updated" })))
}

/// DELETE /api/v1/users/{id} - Delete a user
async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    state
        .user_service
        .delete(&serde_json::json!({ "id": id.to_string() }))
        .await?;

    Ok(Json(serde_json::json!({ "message": "User deleted" })))
}

/// The path id is authoritative for update payloads
pub(crate) fn set_payload_id(payload: &mut Value, id: Uuid) {
    if let Some(object) = payload.as_object_mut() {
        object.insert("id".to_string(), Value::String(id.to_string()));
    }
}
