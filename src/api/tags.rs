//! Tag API endpoints
//!
//! - GET    /api/v1/tags - Paged tag list
//! - GET    /api/v1/tags/all - All tags
//! - GET    /api/v1/tags/{id} - Single tag
//! - POST   /api/v1/tags - Create a tag
//! - PUT    /api/v1/tags/{id} - Update a tag
//! - DELETE /api/v1/tags/{id} - Delete a tag

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

/// Response for a single tag
#[derive(Debug, Serialize)]
pub struct TagResponse {
    pub id: Uuid,
    pub name: String,
    pub created_at: String,
}

impl From<crate::models::Tag> for TagResponse {
    fn from(tag: crate::models::Tag) -> Self {
        Self {
            id: tag.id,
            name: tag.name,
            created_at: tag.created_at.to_rfc3339(),
        }
    }
}

/// Build the tags router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_tags))
        .route("/", post(create_tag))
        .route("/all", get(list_all_tags))
        .route("/{id}", get(get_tag))
        .route("/{id}", put(update_tag))
        .route("/{id}", delete(delete_tag))
}

/// GET /api/v1/tags - Paged tag list
async fn list_tags(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Paged<TagResponse>>, ApiError> {
    let page = state.tag_service.list(&query.params()).await?;

    Ok(Json(Paged::from_page(page)))
}

/// GET /api/v1/tags/all - All tags
async fn list_all_tags(State(state): State<AppState>) -> Result<Json<Vec<TagResponse>>, ApiError> {
    let tags = state.tag_service.list_all().await?;

    Ok(Json(tags.into_iter().map(Into::into).collect()))
}

/// GET /api/v1/tags/{id} - Single tag
async fn get_tag(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TagResponse>, ApiError> {
    let tag = state
        .tag_service
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Tag not found: {}", id)))?;

    Ok(Json(tag.into()))
}

/// POST /api/v1/tags - Create a tag
async fn create_tag(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<Json<TagResponse>, ApiError> {
    let tag = state.tag_service.save(&payload, Method::Create).await?;

    Ok(Json(tag.into()))
}

/// PUT /api/v1/tags/{id} - Update a tag
async fn update_tag(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(mut payload): Json<Value>,
) -> Result<Json<TagResponse>, ApiError> {
    set_payload_id(&mut payload, id);
    let tag = state.tag_service.save(&payload, Method::Update).await?;

    Ok(Json(tag.into()))
}

/// DELETE /api/v1/tags/{id} - Delete a tag
async fn delete_tag(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    state
        .tag_service
        .delete(&serde_json::json!({ "id": id.to_string() }))
        .await?;

    Ok(Json(serde_json::json!({ "message": "Tag deleted" })))
}
