//! Tag service

use crate::db::repositories::TagRepository;
use crate::models::{ListParams, Paginated, Tag};
use crate::validation::{filters, Method};
use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use sqlx::SqlitePool;
use std::sync::Arc;
use uuid::Uuid;

/// Error types for tag service operations
#[derive(Debug, thiserror::Error)]
pub enum TagServiceError {
    #[error("Tag not found: {0}")]
    NotFound(Uuid),

    #[error("Validation failed")]
    Validation(Value),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

#[derive(Deserialize)]
struct SaveTag {
    id: Uuid,
    name: String,
}

/// Tag service
pub struct TagService {
    repo: Arc<dyn TagRepository>,
    pool: SqlitePool,
}

impl TagService {
    pub fn new(repo: Arc<dyn TagRepository>, pool: SqlitePool) -> Self {
        Self { repo, pool }
    }

    /// Validate and persist a tag payload.
    pub async fn save(&self, payload: &Value, method: Method) -> Result<Tag, TagServiceError> {
        let result = filters::tags::save_filter()
            .validate(payload, &self.pool, method)
            .await?;
        if !result.is_valid() {
            return Err(TagServiceError::Validation(result.into_value()));
        }

        let input: SaveTag = serde_json::from_value(payload.clone())
            .context("Failed to deserialize tag payload")?;

        let tag = match method {
            Method::Create => {
                let tag = Tag::new(input.id, input.name);
                self.repo.create(&tag).await.context("Failed to create tag")?
            }
            Method::Update => {
                let mut tag = self
                    .repo
                    .get_by_id(input.id)
                    .await
                    .context("Failed to get tag")?
                    .ok_or(TagServiceError::NotFound(input.id))?;
                tag.name = input.name;
                self.repo.update(&tag).await.context("Failed to update tag")?
            }
        };

        Ok(tag)
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<Tag>, TagServiceError> {
        self.repo
            .get_by_id(id)
            .await
            .context("Failed to get tag by ID")
            .map_err(Into::into)
    }

    pub async fn list(&self, params: &ListParams) -> Result<Paginated<Tag>, TagServiceError> {
        self.repo
            .list(params)
            .await
            .context("Failed to list tags")
            .map_err(Into::into)
    }

    pub async fn list_all(&self) -> Result<Vec<Tag>, TagServiceError> {
        self.repo
            .list_all()
            .await
            .context("Failed to list all tags")
            .map_err(Into::into)
    }

    /// Validate a delete payload and remove the tag.
    pub async fn delete(&self, payload: &Value) -> Result<(), TagServiceError> {
        let result = filters::tags::delete_filter()
            .validate(payload, &self.pool, Method::Update)
            .await?;
        if !result.is_valid() {
            return Err(TagServiceError::Validation(result.into_value()));
        }

        let id = payload_id(payload)?;
        if !self.repo.delete(id).await.context("Failed to delete tag")? {
            return Err(TagServiceError::NotFound(id));
        }

        Ok(())
    }
}

/// Pull the validated id out of a payload.
pub(crate) fn payload_id(payload: &Value) -> Result<Uuid> {
    let raw = payload
        .get("id")
        .and_then(Value::as_str)
        .context("Payload is missing an id")?;
    Uuid::parse_str(raw).context("Payload id is not a UUID")
}
