//! Authentication service
//!
//! Session-token authentication: login hands out an opaque token stored
//! server-side, refresh rotates the expiry, logout deletes the session.
//! Rejected logins are counted by the rate limiter and recorded in the
//! failed-logins table with the caller's IP and user agent.
//!
//! Password resets persist a code and log it; there is no mail
//! transport.

use crate::db::repositories::{FailedLoginRepository, SessionRepository, UserRepository};
use crate::models::{FailedLogin, PasswordReset, Role, Session, User};
use crate::services::password::{hash_password, verify_password};
use crate::services::rate_limiter::LoginRateLimiter;
use crate::validation::{filters, Method};
use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use sqlx::SqlitePool;
use std::net::IpAddr;
use std::sync::Arc;
use uuid::Uuid;

/// Error types for authentication operations
#[derive(Debug, thiserror::Error)]
pub enum AuthServiceError {
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Too many attempts, try again later")]
    RateLimited,

    #[error("Invalid or expired session")]
    InvalidSession,

    #[error("Invalid or expired reset code")]
    InvalidResetCode,

    #[error("Validation failed")]
    Validation(Value),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

#[derive(Deserialize)]
struct Credentials {
    username: String,
    password: String,
}

#[derive(Deserialize)]
struct ResetRequest {
    email: String,
}

#[derive(Deserialize)]
struct ChangePassword {
    reset_code: String,
    new_password: String,
}

/// Authentication service
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    sessions: Arc<dyn SessionRepository>,
    failed_logins: Arc<dyn FailedLoginRepository>,
    rate_limiter: Arc<LoginRateLimiter>,
    pool: SqlitePool,
    session_ttl_seconds: i64,
    reset_code_ttl_seconds: i64,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        sessions: Arc<dyn SessionRepository>,
        failed_logins: Arc<dyn FailedLoginRepository>,
        rate_limiter: Arc<LoginRateLimiter>,
        pool: SqlitePool,
        session_ttl_seconds: i64,
        reset_code_ttl_seconds: i64,
    ) -> Self {
        Self {
            users,
            sessions,
            failed_logins,
            rate_limiter,
            pool,
            session_ttl_seconds,
            reset_code_ttl_seconds,
        }
    }

    /// Validate credentials and issue a session.
    pub async fn login(
        &self,
        payload: &Value,
        ip: IpAddr,
        user_agent: Option<String>,
    ) -> Result<(Session, User), AuthServiceError> {
        let result = filters::auth::token_filter()
            .validate(payload, &self.pool, Method::Create)
            .await?;
        if !result.is_valid() {
            return Err(AuthServiceError::Validation(result.into_value()));
        }

        let credentials: Credentials = serde_json::from_value(payload.clone())
            .context("Failed to deserialize credentials")?;

        self.rate_limiter.record_ip_request(ip).await;
        if self.rate_limiter.is_ip_limited(ip).await
            || self
                .rate_limiter
                .is_username_limited(&credentials.username)
                .await
        {
            return Err(AuthServiceError::RateLimited);
        }

        let user = self
            .users
            .get_by_username(&credentials.username)
            .await
            .context("Failed to look up user")?;

        let authenticated = match &user {
            Some(user) if user.active => {
                verify_password(&credentials.password, &user.password_hash)?
            }
            _ => false,
        };

        if !authenticated {
            self.record_failure(&credentials.username, ip, user_agent)
                .await?;
            return Err(AuthServiceError::InvalidCredentials);
        }

        // The match above guarantees the user exists here
        let user = user.ok_or(AuthServiceError::InvalidCredentials)?;

        self.rate_limiter
            .clear_username_attempts(&credentials.username)
            .await;

        let session = Session::new(user.id, self.session_ttl_seconds);
        self.sessions
            .create(&session)
            .await
            .context("Failed to create session")?;

        tracing::info!(user_id = %user.id, "user logged in");
        Ok((session, user))
    }

    async fn record_failure(
        &self,
        username: &str,
        ip: IpAddr,
        user_agent: Option<String>,
    ) -> Result<()> {
        self.rate_limiter.record_failed_attempt(username).await;

        let attempt = FailedLogin::new(username.to_string(), ip.to_string(), user_agent);
        self.failed_logins
            .create(&attempt)
            .await
            .context("Failed to record failed login")?;

        tracing::warn!(username, ip = %ip, "failed login attempt");
        Ok(())
    }

    /// Extend a valid session's expiry.
    pub async fn refresh(&self, token: Uuid) -> Result<Session, AuthServiceError> {
        let mut session = self.valid_session(token).await?;

        session.refresh(self.session_ttl_seconds);
        self.sessions
            .update_expiry(&session)
            .await
            .context("Failed to refresh session")?;

        Ok(session)
    }

    /// Delete a session. Deleting an unknown token is not an error.
    pub async fn logout(&self, token: Uuid) -> Result<(), AuthServiceError> {
        self.sessions
            .delete(token)
            .await
            .context("Failed to delete session")?;
        Ok(())
    }

    /// Resolve a session token to its user and roles.
    pub async fn me(&self, token: Uuid) -> Result<(User, Vec<Role>), AuthServiceError> {
        let session = self.valid_session(token).await?;

        let user = self
            .users
            .get_by_id(session.user_id)
            .await
            .context("Failed to get session user")?
            .ok_or(AuthServiceError::InvalidSession)?;

        let roles = self
            .users
            .get_roles(user.id)
            .await
            .context("Failed to get user roles")?;

        Ok((user, roles))
    }

    async fn valid_session(&self, token: Uuid) -> Result<Session, AuthServiceError> {
        let session = self
            .sessions
            .get_by_token(token)
            .await
            .context("Failed to get session")?
            .ok_or(AuthServiceError::InvalidSession)?;

        if session.is_expired() {
            self.sessions
                .delete(token)
                .await
                .context("Failed to delete expired session")?;
            return Err(AuthServiceError::InvalidSession);
        }

        Ok(session)
    }

    /// Request a password reset.
    ///
    /// Always succeeds so the endpoint does not reveal whether the
    /// address is registered. The code is persisted and logged.
    pub async fn request_reset(&self, payload: &Value) -> Result<(), AuthServiceError> {
        let result = filters::auth::reset_password_filter()
            .validate(payload, &self.pool, Method::Create)
            .await?;
        if !result.is_valid() {
            return Err(AuthServiceError::Validation(result.into_value()));
        }

        let request: ResetRequest = serde_json::from_value(payload.clone())
            .context("Failed to deserialize reset request")?;

        if let Some(user) = self
            .users
            .get_by_email(&request.email)
            .await
            .context("Failed to look up user by email")?
        {
            let reset = PasswordReset::new(user.id, self.reset_code_ttl_seconds);
            self.sessions
                .create_reset(&reset)
                .await
                .context("Failed to create password reset")?;

            tracing::info!(user_id = %user.id, code = %reset.code, "password reset requested");
        }

        Ok(())
    }

    /// Whether a reset code exists and can still be redeemed.
    pub async fn check_reset(&self, code: &str) -> Result<bool, AuthServiceError> {
        let code = match Uuid::parse_str(code) {
            Ok(code) => code,
            Err(_) => return Ok(false),
        };

        let reset = self
            .sessions
            .get_reset_by_code(code)
            .await
            .context("Failed to look up reset code")?;

        Ok(reset.map(|r| r.is_valid()).unwrap_or(false))
    }

    /// Redeem a reset code and set the new password.
    ///
    /// All existing sessions of the user are dropped.
    pub async fn change_password(&self, payload: &Value) -> Result<(), AuthServiceError> {
        let result = filters::auth::change_password_filter()
            .validate(payload, &self.pool, Method::Update)
            .await?;
        if !result.is_valid() {
            return Err(AuthServiceError::Validation(result.into_value()));
        }

        let input: ChangePassword = serde_json::from_value(payload.clone())
            .context("Failed to deserialize change password payload")?;

        let code = Uuid::parse_str(&input.reset_code)
            .map_err(|_| AuthServiceError::InvalidResetCode)?;

        let reset = self
            .sessions
            .get_reset_by_code(code)
            .await
            .context("Failed to look up reset code")?
            .ok_or(AuthServiceError::InvalidResetCode)?;

        if !reset.is_valid() {
            return Err(AuthServiceError::InvalidResetCode);
        }

        let hash = hash_password(&input.new_password)?;
        self.users
            .update_password(reset.user_id, &hash)
            .await
            .context("Failed to update password")?;

        self.sessions
            .mark_reset_used(reset.id)
            .await
            .context("Failed to mark reset code used")?;

        self.sessions
            .delete_for_user(reset.user_id)
            .await
            .context("Failed to drop user sessions")?;

        tracing::info!(user_id = %reset.user_id, "password changed via reset code");
        Ok(())
    }

    /// Drop expired sessions; called from the periodic cleanup task.
    pub async fn purge_expired_sessions(&self) -> Result<u64, AuthServiceError> {
        self.sessions
            .delete_expired()
            .await
            .context("Failed to purge expired sessions")
            .map_err(Into::into)
    }
}
