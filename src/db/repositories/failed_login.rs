//! Failed login repository
//!
//! Database operations for recorded failed login attempts. The rate
//! limiter counts recent rows; the admin screens list and prune them.

use crate::models::{FailedLogin, ListParams, Paginated};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use std::sync::Arc;
use uuid::Uuid;

/// Failed login repository trait
#[async_trait]
pub trait FailedLoginRepository: Send + Sync {
    /// Record a failed login attempt
    async fn create(&self, attempt: &FailedLogin) -> Result<FailedLogin>;

    /// Get a recorded attempt by ID
    async fn get_by_id(&self, id: Uuid) -> Result<Option<FailedLogin>>;

    /// List attempts, newest first, paginated
    async fn list(&self, params: &ListParams) -> Result<Paginated<FailedLogin>>;

    /// Distinct IP addresses seen in failed attempts
    async fn list_ips(&self) -> Result<Vec<String>>;

    /// Distinct usernames seen in failed attempts
    async fn list_usernames(&self) -> Result<Vec<String>>;

    /// Count attempts for a username since the given time
    async fn count_for_username_since(
        &self,
        username: &str,
        since: DateTime<Utc>,
    ) -> Result<i64>;

    /// Count attempts from an IP since the given time
    async fn count_for_ip_since(&self, ip_address: &str, since: DateTime<Utc>) -> Result<i64>;

    /// Delete a recorded attempt
    async fn delete(&self, id: Uuid) -> Result<bool>;

    /// Delete all attempts for a username
    async fn delete_for_username(&self, username: &str) -> Result<u64>;
}

/// SQLx-based failed login repository implementation
pub struct SqlxFailedLoginRepository {
    pool: SqlitePool,
}

impl SqlxFailedLoginRepository {
    /// Create a new SQLx failed login repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: SqlitePool) -> Arc<dyn FailedLoginRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl FailedLoginRepository for SqlxFailedLoginRepository {
    async fn create(&self, attempt: &FailedLogin) -> Result<FailedLogin> {
        sqlx::query(
            r#"
            INSERT INTO failed_logins (id, username, ip_address, user_agent, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(attempt.id.to_string())
        .bind(&attempt.username)
        .bind(&attempt.ip_address)
        .bind(&attempt.user_agent)
        .bind(attempt.created_at)
        .execute(&self.pool)
        .await
        .context("Failed to record failed login")?;

        Ok(attempt.clone())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<FailedLogin>> {
        let row = sqlx::query(
            r#"
            SELECT id, username, ip_address, user_agent, created_at
            FROM failed_logins
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get failed login by ID")?;

        match row {
            Some(row) => Ok(Some(row_to_failed_login(&row)?)),
            None => Ok(None),
        }
    }

    async fn list(&self, params: &ListParams) -> Result<Paginated<FailedLogin>> {
        let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM failed_logins")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count failed logins")?;

        let rows = sqlx::query(
            r#"
            SELECT id, username, ip_address, user_agent, created_at
            FROM failed_logins
            ORDER BY created_at DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list failed logins")?;

        let mut attempts = Vec::new();
        for row in rows {
            attempts.push(row_to_failed_login(&row)?);
        }

        Ok(Paginated::new(attempts, total.0, params))
    }

    async fn list_ips(&self) -> Result<Vec<String>> {
        let rows = sqlx::query(
            "SELECT DISTINCT ip_address FROM failed_logins ORDER BY ip_address",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list failed login IPs")?;

        Ok(rows.iter().map(|row| row.get("ip_address")).collect())
    }

    async fn list_usernames(&self) -> Result<Vec<String>> {
        let rows =
            sqlx::query("SELECT DISTINCT username FROM failed_logins ORDER BY username")
                .fetch_all(&self.pool)
                .await
                .context("Failed to list failed login usernames")?;

        Ok(rows.iter().map(|row| row.get("username")).collect())
    }

    async fn count_for_username_since(
        &self,
        username: &str,
        since: DateTime<Utc>,
    ) -> Result<i64> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM failed_logins WHERE username = ? AND created_at >= ?",
        )
        .bind(username)
        .bind(since)
        .fetch_one(&self.pool)
        .await
        .context("Failed to count failed logins for username")?;

        Ok(row.0)
    }

    async fn count_for_ip_since(&self, ip_address: &str, since: DateTime<Utc>) -> Result<i64> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM failed_logins WHERE ip_address = ? AND created_at >= ?",
        )
        .bind(ip_address)
        .bind(since)
        .fetch_one(&self.pool)
        .await
        .context("Failed to count failed logins for IP")?;

        Ok(row.0)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM failed_logins WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to delete failed login")?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_for_username(&self, username: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM failed_logins WHERE username = ?")
            .bind(username)
            .execute(&self.pool)
            .await
            .context("Failed to delete failed logins for username")?;

        Ok(result.rows_affected())
    }
}

fn row_to_failed_login(row: &sqlx::sqlite::SqliteRow) -> Result<FailedLogin> {
    let id: String = row.get("id");
    Ok(FailedLogin {
        id: Uuid::parse_str(&id).context("Invalid failed login id in database")?,
        username: row.get("username"),
        ip_address: row.get("ip_address"),
        user_agent: row.get("user_agent"),
        created_at: row.get("created_at"),
    })
}
