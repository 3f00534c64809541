//! Failed login service
//!
//! Read and prune the failed-login audit trail. Rows are written by the
//! auth service on every rejected login.

use crate::db::repositories::FailedLoginRepository;
use crate::models::{FailedLogin, ListParams, Paginated};
use crate::validation::{filters, Method};
use anyhow::{Context, Result};
use serde_json::Value;
use sqlx::SqlitePool;
use std::sync::Arc;
use uuid::Uuid;

/// Error types for failed login service operations
#[derive(Debug, thiserror::Error)]
pub enum FailedLoginServiceError {
    #[error("Failed login not found: {0}")]
    NotFound(Uuid),

    #[error("Validation failed")]
    Validation(Value),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Failed login service
pub struct FailedLoginService {
    repo: Arc<dyn FailedLoginRepository>,
    pool: SqlitePool,
}

impl FailedLoginService {
    pub fn new(repo: Arc<dyn FailedLoginRepository>, pool: SqlitePool) -> Self {
        Self { repo, pool }
    }

    /// Record a rejected login attempt.
    pub async fn record(
        &self,
        username: &str,
        ip_address: &str,
        user_agent: Option<String>,
    ) -> Result<FailedLogin, FailedLoginServiceError> {
        let attempt = FailedLogin::new(username.to_string(), ip_address.to_string(), user_agent);
        self.repo
            .create(&attempt)
            .await
            .context("Failed to record failed login")
            .map_err(Into::into)
    }

    pub async fn list(
        &self,
        params: &ListParams,
    ) -> Result<Paginated<FailedLogin>, FailedLoginServiceError> {
        self.repo
            .list(params)
            .await
            .context("Failed to list failed logins")
            .map_err(Into::into)
    }

    /// Distinct IP addresses seen in failed attempts.
    pub async fn list_ips(&self) -> Result<Vec<String>, FailedLoginServiceError> {
        self.repo
            .list_ips()
            .await
            .context("Failed to list failed login IPs")
            .map_err(Into::into)
    }

    /// Distinct usernames seen in failed attempts.
    pub async fn list_usernames(&self) -> Result<Vec<String>, FailedLoginServiceError> {
        self.repo
            .list_usernames()
            .await
            .context("Failed to list failed login usernames")
            .map_err(Into::into)
    }

    /// Validate a delete payload and remove the recorded attempt.
    pub async fn delete(&self, payload: &Value) -> Result<(), FailedLoginServiceError> {
        let result = filters::failed_logins::delete_filter()
            .validate(payload, &self.pool, Method::Update)
            .await?;
        if !result.is_valid() {
            return Err(FailedLoginServiceError::Validation(result.into_value()));
        }

        let id = super::tag::payload_id(payload)?;
        if !self
            .repo
            .delete(id)
            .await
            .context("Failed to delete failed login")?
        {
            return Err(FailedLoginServiceError::NotFound(id));
        }

        Ok(())
    }
}
