//! Role repository
//!
//! Database operations for roles and their permission assignments.

use crate::models::{ListParams, Paginated, Permission, Role};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;
use uuid::Uuid;

/// Role repository trait
#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// Create a new role
    async fn create(&self, role: &Role) -> Result<Role>;

    /// Get role by ID
    async fn get_by_id(&self, id: Uuid) -> Result<Option<Role>>;

    /// Get role by name
    async fn get_by_name(&self, name: &str) -> Result<Option<Role>>;

    /// List roles, highest level first, paginated
    async fn list(&self, params: &ListParams) -> Result<Paginated<Role>>;

    /// List all roles, highest level first
    async fn list_all(&self) -> Result<Vec<Role>>;

    /// Update a role
    async fn update(&self, role: &Role) -> Result<Role>;

    /// Delete a role
    async fn delete(&self, id: Uuid) -> Result<bool>;

    /// Replace a role's permission assignments
    async fn set_permissions(&self, role_id: Uuid, permission_ids: &[Uuid]) -> Result<()>;

    /// Get the permissions assigned to a role
    async fn get_permissions(&self, role_id: Uuid) -> Result<Vec<Permission>>;
}

/// SQLx-based role repository implementation
pub struct SqlxRoleRepository {
    pool: SqlitePool,
}

impl SqlxRoleRepository {
    /// Create a new SQLx role repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: SqlitePool) -> Arc<dyn RoleRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl RoleRepository for SqlxRoleRepository {
    async fn create(&self, role: &Role) -> Result<Role> {
        sqlx::query(
            r#"
            INSERT INTO roles (id, name, level, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(role.id.to_string())
        .bind(&role.name)
        .bind(role.level)
        .bind(role.created_at)
        .execute(&self.pool)
        .await
        .context("Failed to create role")?;

        Ok(role.clone())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Role>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, level, created_at
            FROM roles
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get role by ID")?;

        match row {
            Some(row) => Ok(Some(row_to_role(&row)?)),
            None => Ok(None),
        }
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<Role>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, level, created_at
            FROM roles
            WHERE name = ?
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get role by name")?;

        match row {
            Some(row) => Ok(Some(row_to_role(&row)?)),
            None => Ok(None),
        }
    }

    async fn list(&self, params: &ListParams) -> Result<Paginated<Role>> {
        let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM roles")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count roles")?;

        let rows = sqlx::query(
            r#"
            SELECT id, name, level, created_at
            FROM roles
            ORDER BY level DESC, name
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list roles")?;

        let mut roles = Vec::new();
        for row in rows {
            roles.push(row_to_role(&row)?);
        }

        Ok(Paginated::new(roles, total.0, params))
    }

    async fn list_all(&self) -> Result<Vec<Role>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, level, created_at
            FROM roles
            ORDER BY level DESC, name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list roles")?;

        let mut roles = Vec::new();
        for row in rows {
            roles.push(row_to_role(&row)?);
        }

        Ok(roles)
    }

    async fn update(&self, role: &Role) -> Result<Role> {
        sqlx::query("UPDATE roles SET name = ?, level = ? WHERE id = ?")
            .bind(&role.name)
            .bind(role.level)
            .bind(role.id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to update role")?;

        Ok(role.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM roles WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to delete role")?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_permissions(&self, role_id: Uuid, permission_ids: &[Uuid]) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;

        sqlx::query("DELETE FROM role_permissions WHERE role_id = ?")
            .bind(role_id.to_string())
            .execute(&mut *tx)
            .await
            .context("Failed to clear role permissions")?;

        for permission_id in permission_ids {
            sqlx::query(
                "INSERT OR IGNORE INTO role_permissions (role_id, permission_id) VALUES (?, ?)",
            )
            .bind(role_id.to_string())
            .bind(permission_id.to_string())
            .execute(&mut *tx)
            .await
            .context("Failed to assign permission")?;
        }

        tx.commit()
            .await
            .context("Failed to commit permission changes")?;
        Ok(())
    }

    async fn get_permissions(&self, role_id: Uuid) -> Result<Vec<Permission>> {
        let rows = sqlx::query(
            r#"
            SELECT p.id, p.module, p.name, p.action, p.route, p.method, p.created_at
            FROM permissions p
            INNER JOIN role_permissions rp ON p.id = rp.permission_id
            WHERE rp.role_id = ?
            ORDER BY p.module, p.name
            "#,
        )
        .bind(role_id.to_string())
        .fetch_all(&self.pool)
        .await
        .context("Failed to get role permissions")?;

        let mut permissions = Vec::new();
        for row in rows {
            let id: String = row.get("id");
            permissions.push(Permission {
                id: Uuid::parse_str(&id).context("Invalid permission id in database")?,
                module: row.get("module"),
                name: row.get("name"),
                action: row.get("action"),
                route: row.get("route"),
                method: row.get("method"),
                created_at: row.get("created_at"),
            });
        }

        Ok(permissions)
    }
}

fn row_to_role(row: &sqlx::sqlite::SqliteRow) -> Result<Role> {
    let id: String = row.get("id");
    Ok(Role {
        id: Uuid::parse_str(&id).context("Invalid role id in database")?,
        name: row.get("name"),
        level: row.get("level"),
        created_at: row.get("created_at"),
    })
}
