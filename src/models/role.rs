//! Role model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role entity. Roles are linked to permissions through the
/// `role_permissions` table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Role {
    /// Unique identifier
    pub id: Uuid,
    /// Role name (unique)
    pub name: String,
    /// Authorization level, higher levels outrank lower ones
    pub level: i32,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Role {
    /// Create a new Role
    pub fn new(id: Uuid, name: String, level: i32) -> Self {
        Self {
            id,
            name,
            level,
            created_at: Utc::now(),
        }
    }
}
