//! Role API endpoints
//!
//! - GET    /api/v1/roles - Paged role list
//! - GET    /api/v1/roles/all - All roles
//! - GET    /api/v1/roles/{id} - Single role
//! - GET    /api/v1/roles/{id}/permissions - Permissions of a role
//! - POST   /api/v1/roles - Create a role
//! - PUT    /api/v1/roles/{id} - Update a role
//! - DELETE /api/v1/roles/{id} - Delete a role

use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::api::middleware::{ApiError, AppState};
use crate::api::permissions::PermissionResponse;
use crate::api::responses::{PageQuery, Paged};
use crate::api::users::set_payload_id;
use crate::validation::Method;

/// Response for a single role
#[derive(Debug, Serialize)]
pub struct RoleResponse {
    pub id: Uuid,
    pub name: String,
    pub level: i32,
    pub created_at: String,
}

impl From<crate::models::Role> for RoleResponse {
    fn from(role: crate::models::Role) -> Self {
        Self {
            id: role.id,
            name: role.name,
            level: role.level,
            created_at: role.created_at.to_rfc3339(),
        }
    }
}

/// Build the roles router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_roles))
        .route("/", post(create_role))
        .route("/all", get(list_all_roles))
        .route("/{id}", get(get_role))
        .route("/{id}", put(update_role))
        .route("/{id}", delete(delete_role))
        .route("/{id}/permissions", get(get_role_permissions))
}

/// GET /api/v1/roles - Paged role list
async fn list_roles(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Paged<RoleResponse>>, ApiError> {
    let page = state.role_service.list(&query.params()).await?;

    Ok(Json(Paged::from_page(page)))
}

/// GET /api/v1/roles/all - All roles
async fn list_all_roles(
    State(state): State<AppState>,
) -> Result<Json<Vec<RoleResponse>>, ApiError> {
    let roles = state.role_service.list_all().await?;

    Ok(Json(roles.into_iter().map(Into::into).collect()))
}

/// GET /api/v1/roles/{id} - Single role
async fn get_role(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RoleResponse>, ApiError> {
    let role = state
        .role_service
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Role not found: {}", id)))?;

    Ok(Json(role.into()))
}

/// GET /api/v1/roles/{id}/permissions - Permissions of a role
async fn get_role_permissions(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<PermissionResponse>>, ApiError> {
    let permissions = state.role_service.get_permissions(id).await?;

    Ok(Json(permissions.into_iter().map(Into::into).collect()))
}

/// POST /api/v1/roles - Create a role
async fn create_role(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<Json<RoleResponse>, ApiError> {
    let role = state.role_service.save(&payload, Method::Create).await?;

    Ok(Json(role.into()))
}

/// PUT /api/v1/roles/{id} - Update a role
async fn update_role(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(mut payload): Json<Value>,
) -> Result<Json<RoleResponse>, ApiError> {
    set_payload_id(&mut payload, id);
    let role = state.role_service.save(&payload, Method::Update).await?;

    Ok(Json(role.into()))
}

/// DELETE /api/v1/roles/{id} - Delete a role
async fn delete_role(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    state
        .role_service
        .delete(&serde_json::json!({ "id": id.to_string() }))
        .await?;

    Ok(Json(serde_json::json!({ "message": "Role deleted" })))
}
