//! Permission API endpoints
//!
//! - GET    /api/v1/permissions - Paged permission list
//! - GET    /api/v1/permissions/all - All permissions
//! - GET    /api/v1/permissions/modules - Distinct module names
//! - GET    /api/v1/permissions/{id} - Single permission
//! - POST   /api/v1/permissions - Create a permission
//! - POST   /api/v1/permissions/{id}/copy - Duplicate a permission
//! - PUT    /api/v1/permissions/{id} - Update a permission
//! - DELETE /api/v1/permissions/{id} - Delete a permission

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
use crate::api::users::set_payload_id;
use crate::validation::Method;

/// Response for a single permission
#[derive(Debug, Serialize)]
pub struct PermissionResponse {
    pub id: Uuid,
    pub module: String,
    pub name: String,
    pub action: String,
    pub route: Option<String>,
    pub method: String,
    pub created_at: String,
}

impl From<crate::models::Permission> for PermissionResponse {
    fn from(permission: crate::models::Permission) -> Self {
        Self {
            id: permission.id,
            module: permission.module,
            name: permission.name,
            action: permission.action,
            route: permission.route,
            method: permission.method,
            created_at: permission.created_at.to_rfc3339(),
        }
    }
}

/// Build the permissions router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_permissions))
        .route("/", post(create_permission))
        .route("/all", get(list_all_permissions))
        .route("/modules", get(list_modules))
        .route("/{id}", get(get_permission))
        .route("/{id}", put(update_permission))
        .route("/{id}", delete(delete_permission))
        .route("/{id}/copy", post(copy_permission))
}

/// GET /api/v1/permissions - Paged permission list
async fn list_permissions(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Paged<PermissionResponse>>, ApiError> {
    let page = state.permission_service.list(&query.params()).await?;

    Ok(Json(Paged::from_page(page)))
}

/// GET /api/v1/permissions/all - All permissions
async fn list_all_permissions(
    State(state): State<AppState>,
) -> Result<Json<Vec<PermissionResponse>>, ApiError> {
    let permissions = state.permission_service.list_all().await?;

    Ok(Json(permissions.into_iter().map(Into::into).collect()))
}

/// GET /api/v1/permissions/modules - Distinct module names
async fn list_modules(State(state): State<AppState>) -> Result<Json<Vec<String>>, ApiError> {
    let modules = state.permission_service.list_modules().await?;

    Ok(Json(modules))
}

/// GET /api/v1/permissions/{id} - Single permission
async fn get_permission(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PermissionResponse>, ApiError> {
    let permission = state
        .permission_service
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Permission not found: {}", id)))?;

    Ok(Json(permission.into()))
}

/// POST /api/v1/permissions - Create a permission
async fn create_permission(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<Json<PermissionResponse>, ApiError> {
    let permission = state
        .permission_service
        .save(&payload, Method::Create)
        .await?;

    Ok(Json(permission.into()))
}

/// POST /api/v1/permissions/{id}/copy - Duplicate a permission
async fn copy_permission(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PermissionResponse>, ApiError> {
    let copy = state.permission_service.copy(id).await?;

    Ok(Json(copy.into()))
}

/// PUT /api/v1/permissions/{id} - Update a permission
async fn update_permission(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(mut payload): Json<Value>,
) -> Result<Json<PermissionResponse>, ApiError> {
    set_payload_id(&mut payload, id);
    let permission = state
        .permission_service
        .save(&payload, Method::Update)
        .await?;

    Ok(Json(permission.into()))
}

/// DELETE /api/v1/permissions/{id} - Delete a permission
async fn delete_permission(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    state
        .permission_service
        .delete(&serde_json::json!({ "id": id.to_string() }))
        .await?;

    Ok(Json(serde_json::json!({ "message": "Permission deleted" })))
}
