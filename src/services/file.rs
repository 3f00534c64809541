//! File service
//!
//! Files are read-only through the API: metadata lookup and raw
//! content download. Both run the read filter so unknown ids surface
//! as validation failures rather than bare 404s.

use crate::db::repositories::{FileMetadata, FileRepository};
use crate::models::{ListParams, Paginated, StoredFile};
use crate::validation::{filters, Method};
use anyhow::{Context, Result};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use std::sync::Arc;
use uuid::Uuid;

/// Error types for file service operations
#[derive(Debug, thiserror::Error)]
pub enum FileServiceError {
    #[error("File not found: {0}")]
    NotFound(Uuid),

    #[error("Validation failed")]
    Validation(Value),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// File service
pub struct FileService {
    repo: Arc<dyn FileRepository>,
    pool: SqlitePool,
}

impl FileService {
    pub fn new(repo: Arc<dyn FileRepository>, pool: SqlitePool) -> Self {
        Self { repo, pool }
    }

    async fn check_read(&self, id: Uuid) -> Result<(), FileServiceError> {
        let payload = json!({ "id": id.to_string() });
        let result = filters::files::read_filter()
            .validate(&payload, &self.pool, Method::Update)
            .await?;
        if !result.is_valid() {
            return Err(FileServiceError::Validation(result.into_value()));
        }
        Ok(())
    }

    /// Metadata for a stored file, without the content bytes.
    pub async fn get_metadata(&self, id: Uuid) -> Result<FileMetadata, FileServiceError> {
        self.check_read(id).await?;

        self.repo
            .get_metadata(id)
            .await
            .context("Failed to get file metadata")?
            .ok_or(FileServiceError::NotFound(id))
    }

    /// The full file including content bytes.
    pub async fn read(&self, id: Uuid) -> Result<StoredFile, FileServiceError> {
        self.check_read(id).await?;

        self.repo
            .get_by_id(id)
            .await
            .context("Failed to read file")?
            .ok_or(FileServiceError::NotFound(id))
    }

    pub async fn list(
        &self,
        params: &ListParams,
    ) -> Result<Paginated<FileMetadata>, FileServiceError> {
        self.repo
            .list(params)
            .await
            .context("Failed to list files")
            .map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::SqlxFileRepository;
    use crate::db::{create_test_pool, migrations};

    async fn setup() -> (FileService, StoredFile) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let repo = SqlxFileRepository::new(pool.clone());
        let file = StoredFile::new(
            Uuid::new_v4(),
            "cover.png".to_string(),
            "image/png".to_string(),
            vec![137, 80, 78, 71],
        );
        use crate::db::repositories::FileRepository as _;
        repo.create(&file).await.expect("Failed to create file");

        (
            FileService::new(SqlxFileRepository::boxed(pool.clone()), pool),
            file,
        )
    }

    #[tokio::test]
    async fn test_metadata_skips_bytes() {
        let (service, file) = setup().await;

        let meta = service.get_metadata(file.id).await.unwrap();
        assert_eq!(meta.name, "cover.png");
        assert_eq!(meta.size, 4);
    }

    #[tokio::test]
    async fn test_read_returns_bytes() {
        let (service, file) = setup().await;

        let stored = service.read(file.id).await.unwrap();
        assert_eq!(stored.data, vec![137, 80, 78, 71]);
        assert_eq!(stored.mime_type, "image/png");
    }

    #[tokio::test]
    async fn test_unknown_id_fails_validation() {
        let (service, _file) = setup().await;

        let result = service.get_metadata(Uuid::new_v4()).await;
        assert!(matches!(result, Err(FileServiceError::Validation(_))));
    }
}
