//! Post API endpoints
//!
//! - GET    /api/v1/posts - Paged post list, optionally by status
//! - GET    /api/v1/posts/{id} - Single post with categories and tags
//! - POST   /api/v1/posts - Create a post
//! - PUT    /api/v1/posts/{id} - Update a post
//! - DELETE /api/v1/posts/{id} - Delete a post

use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::api::categories::CategoryResponse;
use crate::api::middleware::{ApiError, AppState};
use crate::api::responses::Paged;
use crate::api::tags::TagResponse;
use crate::api::users::set_payload_id;
use crate::models::{ListParams, PublishStatus};
use crate::services::PostWithLinks;
use crate::validation::Method;

/// Query parameters for the post list
#[derive(Debug, Deserialize)]
pub struct ListPostsQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    /// Restrict the list to one publish status
    pub status: Option<PublishStatus>,
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    10
}

/// Summary of a post for list views
#[derive(Debug, Serialize)]
pub struct PostSummary {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub permalink: String,
    pub description: Option<String>,
    pub publish_status: String,
    pub featured_image_id: Option<Uuid>,
    pub published_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<crate::models::Post> for PostSummary {
    fn from(post: crate::models::Post) -> Self {
        Self {
            id: post.id,
            author_id: post.author_id,
            title: post.title,
            permalink: post.permalink,
            description: post.description,
            publish_status: post.publish_status.to_string(),
            featured_image_id: post.featured_image_id,
            published_at: post.published_at.map(|dt| dt.to_rfc3339()),
            created_at: post.created_at.to_rfc3339(),
            updated_at: post.updated_at.to_rfc3339(),
        }
    }
}

/// Full post response including content and links
#[derive(Debug, Serialize)]
pub struct PostResponse {
    #[serde(flatten)]
    pub post: PostSummary,
    pub content_json: String,
    pub content_html: String,
    pub categories: Vec<CategoryResponse>,
    pub tags: Vec<TagResponse>,
}

impl From<PostWithLinks> for PostResponse {
    fn from(linked: PostWithLinks) -> Self {
        let content_json = linked.post.content_json.clone();
        let content_html = linked.post.content_html.clone();
        Self {
            post: linked.post.into(),
            content_json,
            content_html,
            categories: linked.categories.into_iter().map(Into::into).collect(),
            tags: linked.tags.into_iter().map(Into::into).collect(),
        }
    }
}

/// Build the posts router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_posts))
        .route("/", post(create_post))
        .route("/{id}", get(get_post))
        .route("/{id}", put(update_post))
        .route("/{id}", delete(delete_post))
}

/// GET /api/v1/posts - Paged post list
async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<ListPostsQuery>,
) -> Result<Json<Paged<PostSummary>>, ApiError> {
    let params = ListParams::new(query.page, query.per_page);
    let page = state.post_service.list(&params, query.status).await?;

    Ok(Json(Paged::from_page(page)))
}

/// GET /api/v1/posts/{id} - Single post with links
async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PostResponse>, ApiError> {
    let post = state
        .post_service
        .get_with_links(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Post not found: {}", id)))?;

    Ok(Json(post.into()))
}

/// POST /api/v1/posts - Create a post
async fn create_post(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<Json<PostResponse>, ApiError> {
    let post = state.post_service.save(&payload, Method::Create).await?;

    Ok(Json(post.into()))
}

/// PUT /api/v1/posts/{id} - Update a post
async fn update_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(mut payload): Json<Value>,
) -> Result<Json<PostResponse>, ApiError> {
    set_payload_id(&mut payload, id);
    let post = state.post_service.save(&payload, Method::Update).await?;

    Ok(Json(post.into()))
}

/// DELETE /api/v1/posts/{id} - Delete a post
async fn delete_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    state
        .post_service
        .delete(&serde_json::json!({ "id": id.to_string() }))
        .await?;

    Ok(Json(serde_json::json!({ "message": "Post deleted" })))
}
