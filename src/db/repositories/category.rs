//! Category repository
//!
//! Database operations for categories.

use crate::models::{Category, ListParams, Paginated};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;
use uuid::Uuid;

/// Category repository trait
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// Create a new category
    async fn create(&self, category: &Category) -> Result<Category>;

    /// Get category by ID
    async fn get_by_id(&self, id: Uuid) -> Result<Option<Category>>;

    /// Get category by name
    async fn get_by_name(&self, name: &str) -> Result<Option<Category>>;

    /// List categories, newest first, paginated
    async fn list(&self, params: &ListParams) -> Result<Paginated<Category>>;

    /// List all categories ordered by name
    async fn list_all(&self) -> Result<Vec<Category>>;

    /// Update a category's name
    async fn update(&self, category: &Category) -> Result<Category>;

    /// Delete a category
    async fn delete(&self, id: Uuid) -> Result<bool>;
}

/// SQLx-based category repository implementation
pub struct SqlxCategoryRepository {
    pool: SqlitePool,
}

impl SqlxCategoryRepository {
    /// Create a new SQLx category repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: SqlitePool) -> Arc<dyn CategoryRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl CategoryRepository for SqlxCategoryRepository {
    async fn create(&self, category: &Category) -> Result<Category> {
        sqlx::query(
            r#"
            INSERT INTO categories (id, name, created_at)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(category.id.to_string())
        .bind(&category.name)
        .bind(category.created_at)
        .execute(&self.pool)
        .await
        .context("Failed to create category")?;

        Ok(category.clone())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Category>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, created_at
            FROM categories
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get category by ID")?;

        match row {
            Some(row) => Ok(Some(row_to_category(&row)?)),
            None => Ok(None),
        }
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<Category>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, created_at
            FROM categories
            WHERE name = ?
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get category by name")?;

        match row {
            Some(row) => Ok(Some(row_to_category(&row)?)),
            None => Ok(None),
        }
    }

    async fn list(&self, params: &ListParams) -> Result<Paginated<Category>> {
        let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM categories")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count categories")?;

        let rows = sqlx::query(
            r#"
            SELECT id, name, created_at
            FROM categories
            ORDER BY created_at DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list categories")?;

        let mut categories = Vec::new();
        for row in rows {
            categories.push(row_to_category(&row)?);
        }

        Ok(Paginated::new(categories, total.0, params))
    }

    async fn list_all(&self) -> Result<Vec<Category>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, created_at
            FROM categories
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list categories")?;

        let mut categories = Vec::new();
        for row in rows {
            categories.push(row_to_category(&row)?);
        }

        Ok(categories)
    }

    async fn update(&self, category: &Category) -> Result<Category> {
        sqlx::query("UPDATE categories SET name = ? WHERE id = ?")
            .bind(&category.name)
            .bind(category.id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to update category")?;

        Ok(category.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        // post_categories entries go away via ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM categories WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to delete category")?;

        Ok(result.rows_affected() > 0)
    }
}

fn row_to_category(row: &sqlx::sqlite::SqliteRow) -> Result<Category> {
    let id: String = row.get("id");
    Ok(Category {
        id: Uuid::parse_str(&id).context("Invalid category id in database")?,
        name: row.get("name"),
        created_at: row.get("created_at"),
    })
}
