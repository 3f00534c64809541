//! User service
//!
//! Accounts are created without a usable password; an admin sets one
//! through the password-save endpoint afterwards.

use crate::db::repositories::UserRepository;
use crate::models::{ListParams, Paginated, Role, User};
use crate::services::password::hash_password;
use crate::validation::{filters, Method};
use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use sqlx::SqlitePool;
use std::sync::Arc;
use uuid::Uuid;

/// Error types for user service operations
#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    #[error("User not found: {0}")]
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
struct SaveUser {
    id: Uuid,
    username: String,
    email: String,
    first_name: Option<String>,
    last_name: Option<String>,
    active: Option<bool>,
    roles: Option<Vec<IdRef>>,
}

#[derive(Deserialize)]
struct SavePassword {
    id: Uuid,
    password: String,
}

/// User service
pub struct UserService {
    repo: Arc<dyn UserRepository>,
    pool: SqlitePool,
}

impl UserService {
    pub fn new(repo: Arc<dyn UserRepository>, pool: SqlitePool) -> Self {
        Self { repo, pool }
    }

    /// Validate and persist a user payload, replacing role assignments
    /// when the payload carries them.
    pub async fn save(&self, payload: &Value, method: Method) -> Result<User, UserServiceError> {
        let result = filters::users::save_filter()
            .validate(payload, &self.pool, method)
            .await?;
        if !result.is_valid() {
            return Err(UserServiceError::Validation(result.into_value()));
        }

        let input: SaveUser = serde_json::from_value(payload.clone())
            .context("Failed to deserialize user payload")?;

        let user = match method {
            Method::Create => {
                // Locks the account until a password is set
                let placeholder = hash_password(&Uuid::new_v4().to_string())?;
                let mut user = User::new(input.id, input.username, input.email, placeholder);
                user.first_name = input.first_name;
                user.last_name = input.last_name;
                user.active = input.active.unwrap_or(true);
                self.repo
                    .create(&user)
                    .await
                    .context("Failed to create user")?
            }
            Method::Update => {
                let mut user = self
                    .repo
                    .get_by_id(input.id)
                    .await
                    .context("Failed to get user")?
                    .ok_or(UserServiceError::NotFound(input.id))?;
                user.username = input.username;
                user.email = input.email;
                user.first_name = input.first_name;
                user.last_name = input.last_name;
                if let Some(active) = input.active {
                    user.active = active;
                }
                self.repo
                    .update(&user)
                    .await
                    .context("Failed to update user")?
            }
        };

        if let Some(roles) = input.roles {
            let role_ids: Vec<Uuid> = roles.into_iter().map(|r| r.id).collect();
            self.repo
                .set_roles(user.id, &role_ids)
                .await
                .context("Failed to set user roles")?;
        }

        Ok(user)
    }

    /// Validate a password payload and store the new hash.
    pub async fn save_password(&self, payload: &Value) -> Result<(), UserServiceError> {
        let result = filters::users::password_filter()
            .validate(payload, &self.pool, Method::Update)
            .await?;
        if !result.is_valid() {
            return Err(UserServiceError::Validation(result.into_value()));
        }

        let input: SavePassword = serde_json::from_value(payload.clone())
            .context("Failed to deserialize password payload")?;

        let hash = hash_password(&input.password)?;
        self.repo
            .update_password(input.id, &hash)
            .await
            .context("Failed to update password")?;

        Ok(())
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<User>, UserServiceError> {
        self.repo
            .get_by_id(id)
            .await
            .context("Failed to get user by ID")
            .map_err(Into::into)
    }

    /// Fetch a user together with their roles.
    pub async fn get_with_roles(
        &self,
        id: Uuid,
    ) -> Result<Option<(User, Vec<Role>)>, UserServiceError> {
        let user = match self
            .repo
            .get_by_id(id)
            .await
            .context("Failed to get user by ID")?
        {
            Some(user) => user,
            None => return Ok(None),
        };

        let roles = self
            .repo
            .get_roles(id)
            .await
            .context("Failed to get user roles")?;

        Ok(Some((user, roles)))
    }

    pub async fn list(&self, params: &ListParams) -> Result<Paginated<User>, UserServiceError> {
        self.repo
            .list(params)
            .await
            .context("Failed to list users")
            .map_err(Into::into)
    }

    pub async fn list_all(&self) -> Result<Vec<User>, UserServiceError> {
        self.repo
            .list_all()
            .await
            .context("Failed to list users")
            .map_err(Into::into)
    }

    /// Validate a delete payload and remove the user.
    pub async fn delete(&self, payload: &Value) -> Result<(), UserServiceError> {
        let result = filters::users::delete_filter()
            .validate(payload, &self.pool, Method::Update)
            .await?;
        if !result.is_valid() {
            return Err(UserServiceError::Validation(result.into_value()));
        }

        let id = super::tag::payload_id(payload)?;
        if !self.repo.delete(id).await.context("Failed to delete user")? {
            return Err(UserServiceError::NotFound(id));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::SqlxUserRepository;
    use crate::db::{create_test_pool, migrations};
    use serde_json::json;

    const ADMIN_ROLE_ID: &str = "00000000-0000-0000-0000-000000000001";

    async fn setup_test_service() -> UserService {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        UserService::new(SqlxUserRepository::boxed(pool.clone()), pool)
    }

    #[tokio::test]
    async fn test_create_user_with_roles() {
        let service = setup_test_service().await;
        let id = Uuid::new_v4();

        let payload = json!({
            "id": id.to_string(),
            "username": "alice",
            "email": "alice@example.com",
            "roles": [{ "id": ADMIN_ROLE_ID }],
        });

        let user = service
            .save(&payload, Method::Create)
            .await
            .expect("Failed to create user");
        assert_eq!(user.username, "alice");
        assert!(user.active);

        let (_, roles) = service.get_with_roles(id).await.unwrap().unwrap();
        assert_eq!(roles.len(), 1);
        assert_eq!(roles[0].name, "admin");
    }

    #[tokio::test]
    async fn test_update_preserves_password_hash() {
        let service = setup_test_service().await;
        let id = Uuid::new_v4();

        service
            .save(
                &json!({
                    "id": id.to_string(),
                    "username": "bob",
                    "email": "bob@example.com",
                }),
                Method::Create,
            )
            .await
            .unwrap();

        let before = service.get_by_id(id).await.unwrap().unwrap();

        service
            .save(
                &json!({
                    "id": id.to_string(),
                    "username": "bob",
                    "email": "bob@new.example.com",
                    "active": false,
                }),
                Method::Update,
            )
            .await
            .unwrap();

        let after = service.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(after.password_hash, before.password_hash);
        assert_eq!(after.email, "bob@new.example.com");
        assert!(!after.active);
    }

    #[tokio::test]
    async fn test_save_password_changes_hash() {
        let service = setup_test_service().await;
        let id = Uuid::new_v4();

        service
            .save(
                &json!({
                    "id": id.to_string(),
                    "username": "carol",
                    "email": "carol@example.com",
                }),
                Method::Create,
            )
            .await
            .unwrap();

        let before = service.get_by_id(id).await.unwrap().unwrap();

        service
            .save_password(&json!({ "id": id.to_string(), "password": "new password" }))
            .await
            .expect("Failed to save password");

        let after = service.get_by_id(id).await.unwrap().unwrap();
        assert_ne!(after.password_hash, before.password_hash);
        assert!(
            crate::services::password::verify_password("new password", &after.password_hash)
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_save_password_rejects_short_password() {
        let service = setup_test_service().await;
        let id = Uuid::new_v4();

        service
            .save(
                &json!({
                    "id": id.to_string(),
                    "username": "dave",
                    "email": "dave@example.com",
                }),
                Method::Create,
            )
            .await
            .unwrap();

        let result = service
            .save_password(&json!({ "id": id.to_string(), "password": "short" }))
            .await;
        assert!(matches!(result, Err(UserServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_with_unknown_role_fails_validation() {
        let service = setup_test_service().await;

        let payload = json!({
            "id": Uuid::new_v4().to_string(),
            "username": "erin",
            "email": "erin@example.com",
            "roles": [{ "id": Uuid::new_v4().to_string() }],
        });

        let result = service.save(&payload, Method::Create).await;
        assert!(matches!(result, Err(UserServiceError::Validation(_))));
    }
}
