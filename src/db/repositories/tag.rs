//! Tag repository
//!
//! Database operations for tags.
//!
//! This module provides:
//! - `TagRepository` trait defining the interface for tag data access
//! - `SqlxTagRepository` implementing the trait against SQLite

use crate::models::{ListParams, Paginated, Tag};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;
use uuid::Uuid;

/// Tag repository trait
#[async_trait]
pub trait TagRepository: Send + Sync {
    /// Create a new tag
    async fn create(&self, tag: &Tag) -> Result<Tag>;

    /// Get tag by ID
    async fn get_by_id(&self, id: Uuid) -> Result<Option<Tag>>;

    /// Get tag by name
    async fn get_by_name(&self, name: &str) -> Result<Option<Tag>>;

    /// List tags, newest first, paginated
    async fn list(&self, params: &ListParams) -> Result<Paginated<Tag>>;

    /// List all tags ordered by name
    async fn list_all(&self) -> Result<Vec<Tag>>;

    /// Update a tag's name
    async fn update(&self, tag: &Tag) -> Result<Tag>;

    /// Delete a tag
    async fn delete(&self, id: Uuid) -> Result<bool>;
}

/// SQLx-based tag repository implementation
pub struct SqlxTagRepository {
    pool: SqlitePool,
}

impl SqlxTagRepository {
    /// Create a new SQLx tag repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: SqlitePool) -> Arc<dyn TagRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl TagRepository for SqlxTagRepository {
    async fn create(&self, tag: &Tag) -> Result<Tag> {
        sqlx::query(
            r#"
            INSERT INTO tags (id, name, created_at)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(tag.id.to_string())
        .bind(&tag.name)
        .bind(tag.created_at)
        .execute(&self.pool)
        .await
        .context("Failed to create tag")?;

        Ok(tag.clone())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Tag>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, created_at
            FROM tags
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get tag by ID")?;

        match row {
            Some(row) => Ok(Some(row_to_tag(&row)?)),
            None => Ok(None),
        }
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<Tag>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, created_at
            FROM tags
            WHERE name = ?
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get tag by name")?;

        match row {
            Some(row) => Ok(Some(row_to_tag(&row)?)),
            None => Ok(None),
        }
    }

    async fn list(&self, params: &ListParams) -> Result<Paginated<Tag>> {
        let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tags")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count tags")?;

        let rows = sqlx::query(
            r#"
            SELECT id, name, created_at
            FROM tags
            ORDER BY created_at DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list tags")?;

        let mut tags = Vec::new();
        for row in rows {
            tags.push(row_to_tag(&row)?);
        }

        Ok(Paginated::new(tags, total.0, params))
    }

    async fn list_all(&self) -> Result<Vec<Tag>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, created_at
            FROM tags
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list tags")?;

        let mut tags = Vec::new();
        for row in rows {
            tags.push(row_to_tag(&row)?);
        }

        Ok(tags)
    }

    async fn update(&self, tag: &Tag) -> Result<Tag> {
        sqlx::query("UPDATE tags SET name = ? WHERE id = ?")
            .bind(&tag.name)
            .bind(tag.id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to update tag")?;

        Ok(tag.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        // post_tags entries go away via ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM tags WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to delete tag")?;

        Ok(result.rows_affected() > 0)
    }
}

fn row_to_tag(row: &sqlx::sqlite::SqliteRow) -> Result<Tag> {
    let id: String = row.get("id");
    Ok(Tag {
        id: Uuid::parse_str(&id).context("Invalid tag id in database")?,
        name: row.get("name"),
        created_at: row.get("created_at"),
    })
}
