//! File repository
//!
//! Database operations for stored files. File bytes live in the `data`
//! BLOB column; metadata queries skip it.

use crate::models::{ListParams, Paginated, StoredFile};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;
use uuid::Uuid;

/// File metadata without the raw bytes
#[derive(Debug, Clone, serde::Serialize)]
pub struct FileMetadata {
    pub id: Uuid,
    pub name: String,
    pub mime_type: String,
    pub size: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// File repository trait
#[async_trait]
pub trait FileRepository: Send + Sync {
    /// Create a new file record
    async fn create(&self, file: &StoredFile) -> Result<StoredFile>;

    /// Get file metadata by ID (no bytes)
    async fn get_metadata(&self, id: Uuid) -> Result<Option<FileMetadata>>;

    /// Get the full file including bytes
    async fn get_by_id(&self, id: Uuid) -> Result<Option<StoredFile>>;

    /// List file metadata, newest first, paginated
    async fn list(&self, params: &ListParams) -> Result<Paginated<FileMetadata>>;

    /// Delete a file record
    async fn delete(&self, id: Uuid) -> Result<bool>;
}

/// SQLx-based file repository implementation
pub struct SqlxFileRepository {
    pool: SqlitePool,
}

impl SqlxFileRepository {
    /// Create a new SQLx file repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: SqlitePool) -> Arc<dyn FileRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl FileRepository for SqlxFileRepository {
    async fn create(&self, file: &StoredFile) -> Result<StoredFile> {
        sqlx::query(
            r#"
            INSERT INTO files (id, name, mime_type, size, data, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(file.id.to_string())
        .bind(&file.name)
        .bind(&file.mime_type)
        .bind(file.size)
        .bind(&file.data)
        .bind(file.created_at)
        .execute(&self.pool)
        .await
        .context("Failed to create file record")?;

        Ok(file.clone())
    }

    async fn get_metadata(&self, id: Uuid) -> Result<Option<FileMetadata>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, mime_type, size, created_at
            FROM files
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get file metadata")?;

        match row {
            Some(row) => Ok(Some(row_to_metadata(&row)?)),
            None => Ok(None),
        }
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<StoredFile>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, mime_type, size, data, created_at
            FROM files
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get file by ID")?;

        match row {
            Some(row) => {
                let id: String = row.get("id");
                Ok(Some(StoredFile {
                    id: Uuid::parse_str(&id).context("Invalid file id in database")?,
                    name: row.get("name"),
                    mime_type: row.get("mime_type"),
                    size: row.get("size"),
                    data: row.get("data"),
                    created_at: row.get("created_at"),
                }))
            }
            None => Ok(None),
        }
    }

    async fn list(&self, params: &ListParams) -> Result<Paginated<FileMetadata>> {
        let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM files")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count files")?;

        let rows = sqlx::query(
            r#"
            SELECT id, name, mime_type, size, created_at
            FROM files
            ORDER BY created_at DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list files")?;

        let mut files = Vec::new();
        for row in rows {
            files.push(row_to_metadata(&row)?);
        }

        Ok(Paginated::new(files, total.0, params))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM files WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to delete file")?;

        Ok(result.rows_affected() > 0)
    }
}

fn row_to_metadata(row: &sqlx::sqlite::SqliteRow) -> Result<FileMetadata> {
    let id: String = row.get("id");
    Ok(FileMetadata {
        id: Uuid::parse_str(&id).context("Invalid file id in database")?,
        name: row.get("name"),
        mime_type: row.get("mime_type"),
        size: row.get("size"),
        created_at: row.get("created_at"),
    })
}
