//! Session and password reset repository
//!
//! Database operations for authenticated sessions and pending password
//! reset codes.

use crate::models::{PasswordReset, Session};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;
use uuid::Uuid;

/// Session repository trait
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Persist a new session
    async fn create(&self, session: &Session) -> Result<Session>;

    /// Look up a session by its token
    async fn get_by_token(&self, token: Uuid) -> Result<Option<Session>>;

    /// Update a session's expiry
    async fn update_expiry(&self, session: &Session) -> Result<()>;

    /// Delete a session (logout)
    async fn delete(&self, token: Uuid) -> Result<bool>;

    /// Delete all sessions for a user
    async fn delete_for_user(&self, user_id: Uuid) -> Result<u64>;

    /// Delete expired sessions, returning how many were removed
    async fn delete_expired(&self) -> Result<u64>;

    /// Persist a new password reset code
    async fn create_reset(&self, reset: &PasswordReset) -> Result<PasswordReset>;

    /// Look up a password reset by its code
    async fn get_reset_by_code(&self, code: Uuid) -> Result<Option<PasswordReset>>;

    /// Mark a reset code as used
    async fn mark_reset_used(&self, id: Uuid) -> Result<()>;
}

/// SQLx-based session repository implementation
pub struct SqlxSessionRepository {
    pool: SqlitePool,
}

impl SqlxSessionRepository {
    /// Create a new SQLx session repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: SqlitePool) -> Arc<dyn SessionRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl SessionRepository for SqlxSessionRepository {
    async fn create(&self, session: &Session) -> Result<Session> {
        sqlx::query(
            r#"
            INSERT INTO sessions (token, user_id, created_at, expires_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(session.token.to_string())
        .bind(session.user_id.to_string())
        .bind(session.created_at)
        .bind(session.expires_at)
        .execute(&self.pool)
        .await
        .context("Failed to create session")?;

        Ok(session.clone())
    }

    async fn get_by_token(&self, token: Uuid) -> Result<Option<Session>> {
        let row = sqlx::query(
            r#"
            SELECT token, user_id, created_at, expires_at
            FROM sessions
            WHERE token = ?
            "#,
        )
        .bind(token.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get session by token")?;

        match row {
            Some(row) => Ok(Some(row_to_session(&row)?)),
            None => Ok(None),
        }
    }

    async fn update_expiry(&self, session: &Session) -> Result<()> {
        sqlx::query("UPDATE sessions SET expires_at = ? WHERE token = ?")
            .bind(session.expires_at)
            .bind(session.token.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to update session expiry")?;

        Ok(())
    }

    async fn delete(&self, token: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(token.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to delete session")?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_for_user(&self, user_id: Uuid) -> Result<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE user_id = ?")
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to delete user sessions")?;

        Ok(result.rows_affected())
    }

    async fn delete_expired(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at < ?")
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .context("Failed to delete expired sessions")?;

        Ok(result.rows_affected())
    }

    async fn create_reset(&self, reset: &PasswordReset) -> Result<PasswordReset> {
        sqlx::query(
            r#"
            INSERT INTO password_resets (id, code, user_id, used, created_at, expires_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(reset.id.to_string())
        .bind(reset.code.to_string())
        .bind(reset.user_id.to_string())
        .bind(reset.used)
        .bind(reset.created_at)
        .bind(reset.expires_at)
        .execute(&self.pool)
        .await
        .context("Failed to create password reset")?;

        Ok(reset.clone())
    }

    async fn get_reset_by_code(&self, code: Uuid) -> Result<Option<PasswordReset>> {
        let row = sqlx::query(
            r#"
            SELECT id, code, user_id, used, created_at, expires_at
            FROM password_resets
            WHERE code = ?
            "#,
        )
        .bind(code.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get password reset by code")?;

        match row {
            Some(row) => Ok(Some(row_to_reset(&row)?)),
            None => Ok(None),
        }
    }

    async fn mark_reset_used(&self, id: Uuid) -> Result<()> {
        sqlx::query("UPDATE password_resets SET used = 1 WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to mark password reset used")?;

        Ok(())
    }
}

fn row_to_session(row: &sqlx::sqlite::SqliteRow) -> Result<Session> {
    let token: String = row.get("token");
    let user_id: String = row.get("user_id");
    Ok(Session {
        token: Uuid::parse_str(&token).context("Invalid session token in database")?,
        user_id: Uuid::parse_str(&user_id).context("Invalid user id in database")?,
        created_at: row.get("created_at"),
        expires_at: row.get("expires_at"),
    })
}

fn row_to_reset(row: &sqlx::sqlite::SqliteRow) -> Result<PasswordReset> {
    let id: String = row.get("id");
    let code: String = row.get("code");
    let user_id: String = row.get("user_id");
    Ok(PasswordReset {
        id: Uuid::parse_str(&id).context("Invalid reset id in database")?,
        code: Uuid::parse_str(&code).context("Invalid reset code in database")?,
        user_id: Uuid::parse_str(&user_id).context("Invalid user id in database")?,
        used: row.get("used"),
        created_at: row.get("created_at"),
        expires_at: row.get("expires_at"),
    })
}
