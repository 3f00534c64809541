//! User repository
//!
//! Database operations for users and their role assignments.

use crate::models::{ListParams, Paginated, Role, User};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;
use uuid::Uuid;

/// User repository trait
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a new user
    async fn create(&self, user: &User) -> Result<User>;

    /// Get user by ID
    async fn get_by_id(&self, id: Uuid) -> Result<Option<User>>;

    /// Get user by username
    async fn get_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Get user by email
    async fn get_by_email(&self, email: &str) -> Result<Option<User>>;

    /// List users, newest first, paginated
    async fn list(&self, params: &ListParams) -> Result<Paginated<User>>;

    /// List all users ordered by username
    async fn list_all(&self) -> Result<Vec<User>>;

    /// Update user profile fields
    async fn update(&self, user: &User) -> Result<User>;

    /// Update a user's password hash
    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<()>;

    /// Delete a user
    async fn delete(&self, id: Uuid) -> Result<bool>;

    /// Replace a user's role assignments
    async fn set_roles(&self, user_id: Uuid, role_ids: &[Uuid]) -> Result<()>;

    /// Get the roles assigned to a user
    async fn get_roles(&self, user_id: Uuid) -> Result<Vec<Role>>;
}

/// SQLx-based user repository implementation
pub struct SqlxUserRepository {
    pool: SqlitePool,
}

impl SqlxUserRepository {
    /// Create a new SQLx user repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: SqlitePool) -> Arc<dyn UserRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl UserRepository for SqlxUserRepository {
    async fn create(&self, user: &User) -> Result<User> {
        sqlx::query(
            r#"
            INSERT INTO users (id, username, email, password_hash, first_name, last_name, active, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(user.id.to_string())
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.active)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .context("Failed to create user")?;

        Ok(user.clone())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT id, username, email, password_hash, first_name, last_name, active, created_at, updated_at
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get user by ID")?;

        match row {
            Some(row) => Ok(Some(row_to_user(&row)?)),
            None => Ok(None),
        }
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT id, username, email, password_hash, first_name, last_name, active, created_at, updated_at
            FROM users
            WHERE username = ?
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get user by username")?;

        match row {
            Some(row) => Ok(Some(row_to_user(&row)?)),
            None => Ok(None),
        }
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT id, username, email, password_hash, first_name, last_name, active, created_at, updated_at
            FROM users
            WHERE email = ?
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get user by email")?;

        match row {
            Some(row) => Ok(Some(row_to_user(&row)?)),
            None => Ok(None),
        }
    }

    async fn list(&self, params: &ListParams) -> Result<Paginated<User>> {
        let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count users")?;

        let rows = sqlx::query(
            r#"
            SELECT id, username, email, password_hash, first_name, last_name, active, created_at, updated_at
            FROM users
            ORDER BY created_at DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list users")?;

        let mut users = Vec::new();
        for row in rows {
            users.push(row_to_user(&row)?);
        }

        Ok(Paginated::new(users, total.0, params))
    }

    async fn list_all(&self) -> Result<Vec<User>> {
        let rows = sqlx::query(
            r#"
            SELECT id, username, email, password_hash, first_name, last_name, active, created_at, updated_at
            FROM users
            ORDER BY username
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list users")?;

        let mut users = Vec::new();
        for row in rows {
            users.push(row_to_user(&row)?);
        }

        Ok(users)
    }

    async fn update(&self, user: &User) -> Result<User> {
        sqlx::query(
            r#"
            UPDATE users
            SET username = ?, email = ?, first_name = ?, last_name = ?, active = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.active)
        .bind(Utc::now())
        .bind(user.id.to_string())
        .execute(&self.pool)
        .await
        .context("Failed to update user")?;

        Ok(user.clone())
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<()> {
        sqlx::query("UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ?")
            .bind(password_hash)
            .bind(Utc::now())
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to update password")?;

        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to delete user")?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_roles(&self, user_id: Uuid, role_ids: &[Uuid]) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;

        sqlx::query("DELETE FROM user_roles WHERE user_id = ?")
            .bind(user_id.to_string())
            .execute(&mut *tx)
            .await
            .context("Failed to clear user roles")?;

        for role_id in role_ids {
            sqlx::query("INSERT OR IGNORE INTO user_roles (user_id, role_id) VALUES (?, ?)")
                .bind(user_id.to_string())
                .bind(role_id.to_string())
                .execute(&mut *tx)
                .await
                .context("Failed to assign role")?;
        }

        tx.commit().await.context("Failed to commit role changes")?;
        Ok(())
    }

    async fn get_roles(&self, user_id: Uuid) -> Result<Vec<Role>> {
        let rows = sqlx::query(
            r#"
            SELECT r.id, r.name, r.level, r.created_at
            FROM roles r
            INNER JOIN user_roles ur ON r.id = ur.role_id
            WHERE ur.user_id = ?
            ORDER BY r.level DESC
            "#,
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .context("Failed to get user roles")?;

        let mut roles = Vec::new();
        for row in rows {
            let id: String = row.get("id");
            roles.push(Role {
                id: Uuid::parse_str(&id).context("Invalid role id in database")?,
                name: row.get("name"),
                level: row.get("level"),
                created_at: row.get("created_at"),
            });
        }

        Ok(roles)
    }
}

fn row_to_user(row: &sqlx::sqlite::SqliteRow) -> Result<User> {
    let id: String = row.get("id");
    Ok(User {
        id: Uuid::parse_str(&id).context("Invalid user id in database")?,
        username: row.get("username"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        active: row.get("active"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup_test_repo() -> SqlxUserRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxUserRepository::new(pool)
    }

    fn test_user(username: &str) -> User {
        User::new(
            Uuid::new_v4(),
            username.to_string(),
            format!("{}@example.com", username),
            "hash".to_string(),
        )
    }

    #[tokio::test]
    async fn test_create_and_get_user() {
        let repo = setup_test_repo().await;
        let user = test_user("alice");

        repo.create(&user).await.expect("Failed to create user");

        let found = repo
            .get_by_id(user.id)
            .await
            .expect("Failed to get user")
            .expect("User not found");
        assert_eq!(found.username, "alice");
        assert!(found.active);
    }

    #[tokio::test]
    async fn test_get_by_username_and_email() {
        let repo = setup_test_repo().await;
        repo.create(&test_user("bob")).await.unwrap();

        let by_name = repo.get_by_username("bob").await.unwrap();
        assert!(by_name.is_some());

        let by_email = repo.get_by_email("bob@example.com").await.unwrap();
        assert!(by_email.is_some());
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let repo = setup_test_repo().await;
        repo.create(&test_user("carol")).await.unwrap();

        let mut dup = test_user("carol");
        dup.email = "other@example.com".to_string();
        assert!(repo.create(&dup).await.is_err());
    }

    #[tokio::test]
    async fn test_update_password() {
        let repo = setup_test_repo().await;
        let user = test_user("dave");
        repo.create(&user).await.unwrap();

        repo.update_password(user.id, "new-hash").await.unwrap();

        let found = repo.get_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(found.password_hash, "new-hash");
    }

    #[tokio::test]
    async fn test_update_persists_active_flag() {
        let repo = setup_test_repo().await;
        let user = test_user("erin");
        repo.create(&user).await.unwrap();

        let mut changed = user.clone();
        changed.first_name = Some("Erin".to_string());
        changed.active = false;
        repo.update(&changed).await.unwrap();

        let found = repo.get_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(found.first_name.as_deref(), Some("Erin"));
        assert!(!found.active);

        changed.active = true;
        repo.update(&changed).await.unwrap();
        let found = repo.get_by_id(user.id).await.unwrap().unwrap();
        assert!(found.active);
    }

    #[tokio::test]
    async fn test_set_and_get_roles() {
        let repo = setup_test_repo().await;
        let user = test_user("frank");
        repo.create(&user).await.unwrap();

        // Seeded roles from migrations
        let admin = Uuid::parse_str("00000000-0000-0000-0000-000000000001").unwrap();
        let member = Uuid::parse_str("00000000-0000-0000-0000-000000000002").unwrap();

        repo.set_roles(user.id, &[admin, member]).await.unwrap();

        let roles = repo.get_roles(user.id).await.unwrap();
        assert_eq!(roles.len(), 2);
        // Highest level first
        assert_eq!(roles[0].name, "admin");

        // Replacing assignments removes the old ones
        repo.set_roles(user.id, &[member]).await.unwrap();
        let roles = repo.get_roles(user.id).await.unwrap();
        assert_eq!(roles.len(), 1);
        assert_eq!(roles[0].name, "member");
    }

    #[tokio::test]
    async fn test_delete_user_cascades_roles() {
        let repo = setup_test_repo().await;
        let user = test_user("grace");
        repo.create(&user).await.unwrap();

        let member = Uuid::parse_str("00000000-0000-0000-0000-000000000002").unwrap();
        repo.set_roles(user.id, &[member]).await.unwrap();

        assert!(repo.delete(user.id).await.unwrap());
        let roles = repo.get_roles(user.id).await.unwrap();
        assert!(roles.is_empty());
    }

    #[tokio::test]
    async fn test_list_paginated() {
        let repo = setup_test_repo().await;

        for i in 0..4 {
            repo.create(&test_user(&format!("user{}", i))).await.unwrap();
        }

        let page = repo.list(&ListParams::new(1, 3)).await.unwrap();
        assert_eq!(page.items.len(), 3);
        assert_eq!(page.total, 4);
        assert_eq!(page.total_pages(), 2);
    }
}
