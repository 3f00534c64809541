//! Role service
//!
//! Roles are read on every permission check, so lookups are memoized
//! and invalidated on writes.

use crate::cache::{CacheLayer, MemoryCache};
use crate::db::repositories::RoleRepository;
use crate::models::{ListParams, Paginated, Permission, Role};
use crate::validation::{filters, Method};
use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

const CACHE_TTL: Duration = Duration::from_secs(300);

/// Error types for role service operations
#[derive(Debug, thiserror::Error)]
pub enum RoleServiceError {
    #[error("Role not found: {0}")]
    NotFound(Uuid),

    #[error("Validation failed")]
    Validation(Value),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

#[derive(Deserialize)]
struct IdRef {
    id: Uuid,
}

#[derive(Deserialize)]
struct SaveRole {
    id: Uuid,
    name: String,
    level: Option<i32>,
    permissions: Option<Vec<IdRef>>,
}

/// Role service
pub struct RoleService {
    repo: Arc<dyn RoleRepository>,
    pool: SqlitePool,
    cache: Arc<MemoryCache>,
}

impl RoleService {
    pub fn new(repo: Arc<dyn RoleRepository>, pool: SqlitePool, cache: Arc<MemoryCache>) -> Self {
        Self { repo, pool, cache }
    }

    /// Validate and persist a role payload, replacing its permission
    /// assignments when the payload carries them.
    pub async fn save(&self, payload: &Value, method: Method) -> Result<Role, RoleServiceError> {
        let result = filters::roles::save_filter()
            .validate(payload, &self.pool, method)
            .await?;
        if !result.is_valid() {
            return Err(RoleServiceError::Validation(result.into_value()));
        }

        let input: SaveRole = serde_json::from_value(payload.clone())
            .context("Failed to deserialize role payload")?;

        let role = match method {
            Method::Create => {
                let role = Role::new(input.id, input.name, input.level.unwrap_or(1));
                self.repo
                    .create(&role)
                    .await
                    .context("Failed to create role")?
            }
            Method::Update => {
                let mut role = self
                    .repo
                    .get_by_id(input.id)
                    .await
                    .context("Failed to get role")?
                    .ok_or(RoleServiceError::NotFound(input.id))?;
                role.name = input.name;
                if let Some(level) = input.level {
                    role.level = level;
                }
                self.repo
                    .update(&role)
                    .await
                    .context("Failed to update role")?
            }
        };

        if let Some(permissions) = input.permissions {
            let permission_ids: Vec<Uuid> = permissions.into_iter().map(|p| p.id).collect();
            self.repo
                .set_permissions(role.id, &permission_ids)
                .await
                .context("Failed to set role permissions")?;
        }

        self.invalidate().await?;
        Ok(role)
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<Role>, RoleServiceError> {
        let key = format!("roles:id:{}", id);
        if let Some(cached) = self.cache.get::<Role>(&key).await? {
            return Ok(Some(cached));
        }

        let role = self
            .repo
            .get_by_id(id)
            .await
            .context("Failed to get role by ID")?;

        if let Some(ref role) = role {
            self.cache.set(&key, role, CACHE_TTL).await?;
        }

        Ok(role)
    }

    /// Get the permissions assigned to a role.
    pub async fn get_permissions(&self, id: Uuid) -> Result<Vec<Permission>, RoleServiceError> {
        let key = format!("roles:permissions:{}", id);
        if let Some(cached) = self.cache.get::<Vec<Permission>>(&key).await? {
            return Ok(cached);
        }

        let permissions = self
            .repo
            .get_permissions(id)
            .await
            .context("Failed to get role permissions")?;

        self.cache.set(&key, &permissions, CACHE_TTL).await?;
        Ok(permissions)
    }

    pub async fn list(&self, params: &ListParams) -> Result<Paginated<Role>, RoleServiceError> {
        self.repo
            .list(params)
            .await
            .context("Failed to list roles")
            .map_err(Into::into)
    }

    /// All roles, cached alongside the per-id lookups.
    pub async fn list_all(&self) -> Result<Vec<Role>, RoleServiceError> {
        if let Some(cached) = self.cache.get::<Vec<Role>>("roles:all").await? {
            return Ok(cached);
        }

        let roles = self
            .repo
            .list_all()
            .await
            .context("Failed to list roles")?;

        self.cache.set("roles:all", &roles, CACHE_TTL).await?;
        Ok(roles)
    }

    /// Validate a delete payload and remove the role.
    pub async fn delete(&self, payload: &Value) -> Result<(), RoleServiceError> {
        let result = filters::roles::delete_filter()
            .validate(payload, &self.pool, Method::Update)
            .await?;
        if !result.is_valid() {
            return Err(RoleServiceError::Validation(result.into_value()));
        }

        let id = super::tag::payload_id(payload)?;
        if !self.repo.delete(id).await.context("Failed to delete role")? {
            return Err(RoleServiceError::NotFound(id));
        }

        self.invalidate().await?;
        Ok(())
    }

    async fn invalidate(&self) -> Result<()> {
        self.cache.delete_pattern("roles:*").await
    }
}
