//! Category model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Category entity. Posts reference categories through the
/// `post_categories` table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    /// Unique identifier
    pub id: Uuid,
    /// Category name (unique)
    pub name: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Category {
    /// Create a new Category
    pub fn new(id: Uuid, name: String) -> Self {
        Self {
            id,
            name,
            created_at: Utc::now(),
        }
    }
}
