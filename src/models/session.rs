//! Session and password reset models

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An authenticated session.
///
/// The token is an opaque UUID handed to the client on login; clients
/// present it as a Bearer header or a `session=` cookie.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Session token
    pub token: Uuid,
    /// Owning user (references users.id)
    pub user_id: Uuid,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Expiry timestamp
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Create a new session for a user with the given lifetime.
    pub fn new(user_id: Uuid, ttl_seconds: i64) -> Self {
        let now = Utc::now();
        Self {
            token: Uuid::new_v4(),
            user_id,
            created_at: now,
            expires_at: now + Duration::seconds(ttl_seconds),
        }
    }

    /// Whether the session is past its expiry.
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    /// Extend the session by the given lifetime from now.
    pub fn refresh(&mut self, ttl_seconds: i64) {
        self.expires_at = Utc::now() + Duration::seconds(ttl_seconds);
    }
}

/// A pending password reset code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordReset {
    /// Unique identifier
    pub id: Uuid,
    /// Reset code handed to the user
    pub code: Uuid,
    /// User the reset belongs to (references users.id)
    pub user_id: Uuid,
    /// Whether the code has already been consumed
    pub used: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Expiry timestamp
    pub expires_at: DateTime<Utc>,
}

impl PasswordReset {
    /// Create a new reset code for a user with the given lifetime.
    pub fn new(user_id: Uuid, ttl_seconds: i64) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            code: Uuid::new_v4(),
            user_id,
            used: false,
            created_at: now,
            expires_at: now + Duration::seconds(ttl_seconds),
        }
    }

    /// Whether the code can still be redeemed.
    pub fn is_valid(&self) -> bool {
        !self.used && Utc::now() < self.expires_at
    }
}
