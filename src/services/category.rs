//! Category service
//!
//! Category lookups are hot on the read side, so single records and the
//! full list are memoized in the cache and invalidated on every write.

use crate::cache::{CacheLayer, MemoryCache};
use crate::db::repositories::CategoryRepository;
use crate::models::{Category, ListParams, Paginated};
use crate::validation::{filters, Method};
use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

const CACHE_TTL: Duration = Duration::from_secs(300);

/// Error types for category service operations
#[derive(Debug, thiserror::Error)]
pub enum CategoryServiceError {
    #[error("Category not found: {0}")]
    NotFound(Uuid),

    #[error("Validation failed")]
    Validation(Value),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

#[derive(Deserialize)]
struct SaveCategory {
    id: Uuid,
    name: String,
}

/// Category service
pub struct CategoryService {
    repo: Arc<dyn CategoryRepository>,
    pool: SqlitePool,
    cache: Arc<MemoryCache>,
}

impl CategoryService {
    pub fn new(
        repo: Arc<dyn CategoryRepository>,
        pool: SqlitePool,
        cache: Arc<MemoryCache>,
    ) -> Self {
        Self { repo, pool, cache }
    }

    /// Validate and persist a category payload.
    pub async fn save(
        &self,
        payload: &Value,
        method: Method,
    ) -> Result<Category, CategoryServiceError> {
        let result = filters::categories::save_filter()
            .validate(payload, &self.pool, method)
            .await?;
        if !result.is_valid() {
            return Err(CategoryServiceError::Validation(result.into_value()));
        }

        let input: SaveCategory = serde_json::from_value(payload.clone())
            .context("Failed to deserialize category payload")?;

        let category = match method {
            Method::Create => {
                let category = Category::new(input.id, input.name);
                self.repo
                    .create(&category)
                    .await
                    .context("Failed to create category")?
            }
            Method::Update => {
                let mut category = self
                    .repo
                    .get_by_id(input.id)
                    .await
                    .context("Failed to get category")?
                    .ok_or(CategoryServiceError::NotFound(input.id))?;
                category.name = input.name;
                self.repo
                    .update(&category)
                    .await
                    .context("Failed to update category")?
            }
        };

        self.invalidate().await?;
        Ok(category)
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<Category>, CategoryServiceError> {
        let key = format!("categories:id:{}", id);
        if let Some(cached) = self.cache.get::<Category>(&key).await? {
            return Ok(Some(cached));
        }

        let category = self
            .repo
            .get_by_id(id)
            .await
            .context("Failed to get category by ID")?;

        if let Some(ref category) = category {
            self.cache.set(&key, category, CACHE_TTL).await?;
        }

        Ok(category)
    }

    pub async fn list(
        &self,
        params: &ListParams,
    ) -> Result<Paginated<Category>, CategoryServiceError> {
        self.repo
            .list(params)
            .await
            .context("Failed to list categories")
            .map_err(Into::into)
    }

    pub async fn list_all(&self) -> Result<Vec<Category>, CategoryServiceError> {
        if let Some(cached) = self.cache.get::<Vec<Category>>("categories:all").await? {
            return Ok(cached);
        }

        let categories = self
            .repo
            .list_all()
            .await
            .context("Failed to list all categories")?;

        self.cache
            .set("categories:all", &categories, CACHE_TTL)
            .await?;

        Ok(categories)
    }

    /// Validate a delete payload and remove the category.
    pub async fn delete(&self, payload: &Value) -> Result<(), CategoryServiceError> {
        let result = filters::categories::delete_filter()
            .validate(payload, &self.pool, Method::Update)
            .await?;
        if !result.is_valid() {
            return Err(CategoryServiceError::Validation(result.into_value()));
        }

        let id = super::tag::payload_id(payload)?;
        if !self
            .repo
            .delete(id)
            .await
            .context("Failed to delete category")?
        {
            return Err(CategoryServiceError::NotFound(id));
        }

        self.invalidate().await?;
        Ok(())
    }

    async fn invalidate(&self) -> Result<()> {
        self.cache.delete_pattern("categories:*").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::create_cache;
    use crate::config::CacheConfig;
    use crate::db::repositories::SqlxCategoryRepository;
    use crate::db::{create_test_pool, migrations};
    use serde_json::json;

    async fn setup_test_service() -> CategoryService {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        CategoryService::new(
            SqlxCategoryRepository::boxed(pool.clone()),
            pool,
            create_cache(&CacheConfig::default()),
        )
    }

    #[tokio::test]
    async fn test_save_and_cached_lookup() {
        let service = setup_test_service().await;
        let id = Uuid::new_v4();

        service
            .save(&json!({ "id": id.to_string(), "name": "News" }), Method::Create)
            .await
            .expect("Failed to create category");

        // First read populates the cache, second read hits it
        let first = service.get_by_id(id).await.unwrap().unwrap();
        let second = service.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(first.name, second.name);
    }

    #[tokio::test]
    async fn test_write_invalidates_list_cache() {
        let service = setup_test_service().await;

        let first_id = Uuid::new_v4();
        service
            .save(
                &json!({ "id": first_id.to_string(), "name": "One" }),
                Method::Create,
            )
            .await
            .unwrap();

        assert_eq!(service.list_all().await.unwrap().len(), 1);

        service
            .save(
                &json!({ "id": Uuid::new_v4().to_string(), "name": "Two" }),
                Method::Create,
            )
            .await
            .unwrap();

        // The second write must not serve the stale cached list
        assert_eq!(service.list_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_delete_removes_category() {
        let service = setup_test_service().await;
        let id = Uuid::new_v4();

        service
            .save(&json!({ "id": id.to_string(), "name": "Temp" }), Method::Create)
            .await
            .unwrap();
        service
            .delete(&json!({ "id": id.to_string() }))
            .await
            .expect("Failed to delete category");

        assert!(service.get_by_id(id).await.unwrap().is_none());
    }
}
