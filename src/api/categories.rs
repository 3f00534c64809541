//! Category API endpoints
//!
//! - GET    /api/v1/categories - Paged category list
//! - GET    /api/v1/categories/all - All categories
//! - GET    /api/v1/categories/{id} - Single category
//! - POST   /api/v1/categories - Create a category
//! - PUT    /api/v1/categories/{id} - Update a category
//! - DELETE /api/v1/categories/{id} - Delete a category

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

/// Response for a single category
#[derive(Debug, Serialize)]
pub struct CategoryResponse {
    pub id: Uuid,
    pub name: String,
    pub created_at: String,
}

impl From<crate::models::Category> for CategoryResponse {
    fn from(category: crate::models::Category) -> Self {
        Self {
            id: category.id,
            name: category.name,
            created_at: category.created_at.to_rfc3339(),
        }
    }
}

/// Build the categories router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_categories))
        .route("/", post(create_category))
        .route("/all", get(list_all_categories))
        .route("/{id}", get(get_category))
        .route("/{id}", put(update_category))
        .route("/{id}", delete(delete_category))
}

/// GET /api/v1/categories - Paged category list
async fn list_categories(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Paged<CategoryResponse>>, ApiError> {
    let page = state.category_service.list(&query.params()).await?;

    Ok(Json(Paged::from_page(page)))
}

/// GET /api/v1/categories/all - All categories
async fn list_all_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<CategoryResponse>>, ApiError> {
    let categories = state.category_service.list_all().await?;

    Ok(Json(categories.into_iter().map(Into::into).collect()))
}

/// GET /api/v1/categories/{id} - Single category
async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CategoryResponse>, ApiError> {
    let category = state
        .category_service
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Category not found: {}", id)))?;

    Ok(Json(category.into()))
}

/// POST /api/v1/categories - Create a category
async fn create_category(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<Json<CategoryResponse>, ApiError> {
    let category = state
        .category_service
        .save(&payload, Method::Create)
        .await?;

    Ok(Json(category.into()))
}

/// PUT /api/v1/categories/{id} - Update a category
async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(mut payload): Json<Value>,
) -> Result<Json<CategoryResponse>, ApiError> {
    set_payload_id(&mut payload, id);
    let category = state
        .category_service
        .save(&payload, Method::Update)
        .await?;

    Ok(Json(category.into()))
}

/// DELETE /api/v1/categories/{id} - Delete a category
async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    state
        .category_service
        .delete(&serde_json::json!({ "id": id.to_string() }))
        .await?;

    Ok(Json(serde_json::json!({ "message": "Category deleted" })))
}
