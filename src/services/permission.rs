//! Permission service
//!
//! Besides CRUD, supports copying a permission: the copy gets a fresh
//! id and a " - copy" name suffix.

use crate::cache::{CacheLayer, MemoryCache};
use crate::db::repositories::PermissionRepository;
use crate::models::{ListParams, Paginated, Permission};
use crate::validation::{filters, Method};
use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

const CACHE_TTL: Duration = Duration::from_secs(300);

/// Error types for permission service operations
#[derive(Debug, thiserror::Error)]
pub enum PermissionServiceError {
    #[error("Permission not found: {0}")]
    NotFound(Uuid),

    #[error("Validation failed")]
    Validation(Value),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

#[derive(Deserialize)]
struct SavePermission {
    id: Uuid,
    module: String,
    name: String,
    action: String,
    route: Option<String>,
    method: String,
}

/// Permission service
pub struct PermissionService {
    repo: Arc<dyn PermissionRepository>,
    pool: SqlitePool,
    cache: Arc<MemoryCache>,
}

impl PermissionService {
    pub fn new(
        repo: Arc<dyn PermissionRepository>,
        pool: SqlitePool,
        cache: Arc<MemoryCache>,
    ) -> Self {
        Self { repo, pool, cache }
    }

    /// Validate and persist a permission payload.
    pub async fn save(
        &self,
        payload: &Value,
        method: Method,
    ) -> Result<Permission, PermissionServiceError> {
        let result = filters::permissions::save_filter()
            .validate(payload, &self.pool, method)
            .await?;
        if !result.is_valid() {
            return Err(PermissionServiceError::Validation(result.into_value()));
        }

        let input: SavePermission = serde_json::from_value(payload.clone())
            .context("Failed to deserialize permission payload")?;

        let permission = match method {
            Method::Create => {
                let mut permission = Permission::new(
                    input.id,
                    input.module,
                    input.name,
                    input.action,
                    input.method,
                );
                permission.route = input.route;
                self.repo
                    .create(&permission)
                    .await
                    .context("Failed to create permission")?
            }
            Method::Update => {
                let mut permission = self
                    .repo
                    .get_by_id(input.id)
                    .await
                    .context("Failed to get permission")?
                    .ok_or(PermissionServiceError::NotFound(input.id))?;
                permission.module = input.module;
                permission.name = input.name;
                permission.action = input.action;
                permission.route = input.route;
                permission.method = input.method;
                self.repo
                    .update(&permission)
                    .await
                    .context("Failed to update permission")?
            }
        };

        self.invalidate().await?;
        Ok(permission)
    }

    /// Duplicate an existing permission under a fresh id.
    pub async fn copy(&self, id: Uuid) -> Result<Permission, PermissionServiceError> {
        let original = self
            .repo
            .get_by_id(id)
            .await
            .context("Failed to get permission")?
            .ok_or(PermissionServiceError::NotFound(id))?;

        let copy = self
            .repo
            .create(&original.duplicate())
            .await
            .context("Failed to create permission copy")?;

        self.invalidate().await?;
        Ok(copy)
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<Permission>, PermissionServiceError> {
        let key = format!("permissions:id:{}", id);
        if let Some(cached) = self.cache.get::<Permission>(&key).await? {
            return Ok(Some(cached));
        }

        let permission = self
            .repo
            .get_by_id(id)
            .await
            .context("Failed to get permission by ID")?;

        if let Some(ref permission) = permission {
            self.cache.set(&key, permission, CACHE_TTL).await?;
        }

        Ok(permission)
    }

    pub async fn list(
        &self,
        params: &ListParams,
    ) -> Result<Paginated<Permission>, PermissionServiceError> {
        self.repo
            .list(params)
            .await
            .context("Failed to list permissions")
            .map_err(Into::into)
    }

    /// All permissions, cached alongside the per-id lookups.
    pub async fn list_all(&self) -> Result<Vec<Permission>, PermissionServiceError> {
        if let Some(cached) = self.cache.get::<Vec<Permission>>("permissions:all").await? {
            return Ok(cached);
        }

        let permissions = self
            .repo
            .list_all()
            .await
            .context("Failed to list permissions")?;

        self.cache
            .set("permissions:all", &permissions, CACHE_TTL)
            .await?;

        Ok(permissions)
    }

    /// Distinct module names across all permissions.
    pub async fn list_modules(&self) -> Result<Vec<String>, PermissionServiceError> {
        if let Some(cached) = self.cache.get::<Vec<String>>("permissions:modules").await? {
            return Ok(cached);
        }

        let modules = self
            .repo
            .list_modules()
            .await
            .context("Failed to list permission modules")?;

        self.cache
            .set("permissions:modules", &modules, CACHE_TTL)
            .await?;

        Ok(modules)
    }

    /// Validate a delete payload and remove the permission.
    pub async fn delete(&self, payload: &Value) -> Result<(), PermissionServiceError> {
        let result = filters::permissions::delete_filter()
            .validate(payload, &self.pool, Method::Update)
            .await?;
        if !result.is_valid() {
            return Err(PermissionServiceError::Validation(result.into_value()));
        }

        let id = super::tag::payload_id(payload)?;
        if !self
            .repo
            .delete(id)
            .await
            .context("Failed to delete permission")?
        {
            return Err(PermissionServiceError::NotFound(id));
        }

        self.invalidate().await?;
        Ok(())
    }

    async fn invalidate(&self) -> Result<()> {
        self.cache.delete_pattern("permissions:*").await
    }
}
