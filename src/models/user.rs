//! User model
//!
//! Defines the User entity. Users are linked to roles through the
//! `user_roles` table; the roles themselves live in [`crate::models::Role`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User entity representing an account in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier
    pub id: Uuid,
    /// Username (unique)
    pub username: String,
    /// Email address (unique)
    pub email: String,
    /// Password hash (argon2)
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// First name
    pub first_name: Option<String>,
    /// Last name
    pub last_name: Option<String>,
    /// Whether the account may log in
    pub active: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new User.
    ///
    /// The password must already be hashed; use
    /// `services::password::hash_password()`.
    pub fn new(id: Uuid, username: String, email: String, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            username,
            email,
            password_hash,
            first_name: None,
            last_name: None,
            active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_new_defaults() {
        let id = Uuid::new_v4();
        let user = User::new(
            id,
            "demo".to_string(),
            "demo@example.com".to_string(),
            "hash".to_string(),
        );

        assert_eq!(user.id, id);
        assert!(user.active);
        assert!(user.first_name.is_none());
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let user = User::new(
            Uuid::new_v4(),
            "demo".to_string(),
            "demo@example.com".to_string(),
            "secret-hash".to_string(),
        );

        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("secret-hash"));
    }
}
