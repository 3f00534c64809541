//! File API endpoints
//!
//! Files are read-only through the API.
//!
//! - GET /api/v1/files - Paged metadata list
//! - GET /api/v1/files/{id} - File metadata
//! - GET /api/v1/files/{id}/content - Raw bytes with the stored MIME type

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::Response,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use uuid::Uuid;

use crate::api::middleware::{ApiError, AppState};
use crate::api::responses::{PageQuery, Paged};
use crate::db::repositories::FileMetadata;

/// Response for file metadata
#[derive(Debug, Serialize)]
pub struct FileResponse {
    pub id: Uuid,
    pub name: String,
    pub mime_type: String,
    pub size: i64,
    pub created_at: String,
}

impl From<FileMetadata> for FileResponse {
    fn from(meta: FileMetadata) -> Self {
        Self {
            id: meta.id,
            name: meta.name,
            mime_type: meta.mime_type,
            size: meta.size,
            created_at: meta.created_at.to_rfc3339(),
        }
    }
}

/// Build the files router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_files))
        .route("/{id}", get(get_file))
        .route("/{id}/content", get(read_file))
}

/// GET /api/v1/files - Paged metadata list
async fn list_files(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Paged<FileResponse>>, ApiError> {
    let page = state.file_service.list(&query.params()).await?;

    Ok(Json(Paged::from_page(page)))
}

/// GET /api/v1/files/{id} - File metadata
async fn get_file(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<FileResponse>, ApiError> {
    let meta = state.file_service.get_metadata(id).await?;

    Ok(Json(meta.into()))
}

/// GET /api/v1/files/{id}/content - Raw bytes
async fn read_file(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let file = state.file_service.read(id).await?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, file.mime_type)
        .header(
            header::CONTENT_DISPOSITION,
            format!("inline; filename=\"{}\"", file.name),
        )
        .body(Body::from(file.data))
        .map_err(|e| ApiError::internal_error(e.to_string()))
}
