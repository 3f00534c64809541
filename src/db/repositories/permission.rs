//! Permission repository
//!
//! Database operations for permissions.

use crate::models::{ListParams, Paginated, Permission};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;
use uuid::Uuid;

/// Permission repository trait
#[async_trait]
pub trait PermissionRepository: Send + Sync {
    /// Create a new permission
    async fn create(&self, permission: &Permission) -> Result<Permission>;

    /// Get permission by ID
    async fn get_by_id(&self, id: Uuid) -> Result<Option<Permission>>;

    /// Get permission by name
    async fn get_by_name(&self, name: &str) -> Result<Option<Permission>>;

    /// List permissions grouped by module, paginated
    async fn list(&self, params: &ListParams) -> Result<Paginated<Permission>>;

    /// List all permissions grouped by module
    async fn list_all(&self) -> Result<Vec<Permission>>;

    /// List the distinct modules that have permissions
    async fn list_modules(&self) -> Result<Vec<String>>;

    /// Update a permission
    async fn update(&self, permission: &Permission) -> Result<Permission>;

    /// Delete a permission
    async fn delete(&self, id: Uuid) -> Result<bool>;
}

/// SQLx-based permission repository implementation
pub struct SqlxPermissionRepository {
    pool: SqlitePool,
}

impl SqlxPermissionRepository {
    /// Create a new SQLx permission repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: SqlitePool) -> Arc<dyn PermissionRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl PermissionRepository for SqlxPermissionRepository {
    async fn create(&self, permission: &Permission) -> Result<Permission> {
        sqlx::query(
            r#"
            INSERT INTO permissions (id, module, name, action, route, method, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(permission.id.to_string())
        .bind(&permission.module)
        .bind(&permission.name)
        .bind(&permission.action)
        .bind(&permission.route)
        .bind(&permission.method)
        .bind(permission.created_at)
        .execute(&self.pool)
        .await
        .context("Failed to create permission")?;

        Ok(permission.clone())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Permission>> {
        let row = sqlx::query(
            r#"
            SELECT id, module, name, action, route, method, created_at
            FROM permissions
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get permission by ID")?;

        match row {
            Some(row) => Ok(Some(row_to_permission(&row)?)),
            None => Ok(None),
        }
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<Permission>> {
        let row = sqlx::query(
            r#"
            SELECT id, module, name, action, route, method, created_at
            FROM permissions
            WHERE name = ?
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get permission by name")?;

        match row {
            Some(row) => Ok(Some(row_to_permission(&row)?)),
            None => Ok(None),
        }
    }

    async fn list(&self, params: &ListParams) -> Result<Paginated<Permission>> {
        let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM permissions")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count permissions")?;

        let rows = sqlx::query(
            r#"
            SELECT id, module, name, action, route, method, created_at
            FROM permissions
            ORDER BY module, name
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list permissions")?;

        let mut permissions = Vec::new();
        for row in rows {
            permissions.push(row_to_permission(&row)?);
        }

        Ok(Paginated::new(permissions, total.0, params))
    }

    async fn list_all(&self) -> Result<Vec<Permission>> {
        let rows = sqlx::query(
            r#"
            SELECT id, module, name, action, route, method, created_at
            FROM permissions
            ORDER BY module, name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list permissions")?;

        let mut permissions = Vec::new();
        for row in rows {
            permissions.push(row_to_permission(&row)?);
        }

        Ok(permissions)
    }

    async fn list_modules(&self) -> Result<Vec<String>> {
        let rows = sqlx::query("SELECT DISTINCT module FROM permissions ORDER BY module")
            .fetch_all(&self.pool)
            .await
            .context("Failed to list permission modules")?;

        Ok(rows.iter().map(|row| row.get("module")).collect())
    }

    async fn update(&self, permission: &Permission) -> Result<Permission> {
        sqlx::query(
            r#"
            UPDATE permissions
            SET module = ?, name = ?, action = ?, route = ?, method = ?
            WHERE id = ?
            "#,
        )
        .bind(&permission.module)
        .bind(&permission.name)
        .bind(&permission.action)
        .bind(&permission.route)
        .bind(&permission.method)
        .bind(permission.id.to_string())
        .execute(&self.pool)
        .await
        .context("Failed to update permission")?;

        Ok(permission.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM permissions WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to delete permission")?;

        Ok(result.rows_affected() > 0)
    }
}

fn row_to_permission(row: &sqlx::sqlite::SqliteRow) -> Result<Permission> {
    let id: String = row.get("id");
    Ok(Permission {
        id: Uuid::parse_str(&id).context("Invalid permission id in database")?,
        module: row.get("module"),
        name: row.get("name"),
        action: row.get("action"),
        route: row.get("route"),
        method: row.get("method"),
        created_at: row.get("created_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup_test_repo() -> SqlxPermissionRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxPermissionRepository::new(pool)
    }

    fn test_permission(module: &str, action: &str) -> Permission {
        Permission::new(
            Uuid::new_v4(),
            module.to_string(),
            format!("{}:{}", module, action),
            action.to_string(),
            "POST".to_string(),
        )
    }

    #[tokio::test]
    async fn test_create_and_get_permission() {
        let repo = setup_test_repo().await;
        let perm = test_permission("posts", "create");

        repo.create(&perm).await.expect("Failed to create");

        let found = repo.get_by_id(perm.id).await.unwrap().unwrap();
        assert_eq!(found.name, "posts:create");
        assert_eq!(found.module, "posts");
    }

    #[tokio::test]
    async fn test_get_by_name() {
        let repo = setup_test_repo().await;
        repo.create(&test_permission("tags", "delete")).await.unwrap();

        let found = repo.get_by_name("tags:delete").await.unwrap();
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn test_duplicate_name_rejected() {
        let repo = setup_test_repo().await;
        repo.create(&test_permission("posts", "create")).await.unwrap();

        assert!(repo.create(&test_permission("posts", "create")).await.is_err());
    }

    #[tokio::test]
    async fn test_list_modules_distinct() {
        let repo = setup_test_repo().await;
        repo.create(&test_permission("posts", "create")).await.unwrap();
        repo.create(&test_permission("posts", "delete")).await.unwrap();
        repo.create(&test_permission("tags", "create")).await.unwrap();

        let modules = repo.list_modules().await.unwrap();
        assert_eq!(modules, vec!["posts".to_string(), "tags".to_string()]);
    }

    #[tokio::test]
    async fn test_duplicate_copy_insertable() {
        let repo = setup_test_repo().await;
        let perm = test_permission("posts", "create");
        repo.create(&perm).await.unwrap();

        let copy = perm.duplicate();
        repo.create(&copy).await.expect("Copy should insert");

        let page = repo.list(&ListParams::new(1, 10)).await.unwrap();
        assert_eq!(page.total, 2);
    }

    #[tokio::test]
    async fn test_delete_permission() {
        let repo = setup_test_repo().await;
        let perm = test_permission("files", "delete");
        repo.create(&perm).await.unwrap();

        assert!(repo.delete(perm.id).await.unwrap());
        assert!(repo.get_by_id(perm.id).await.unwrap().is_none());
    }
}
