//! Tag model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Tag entity. Posts reference tags through the `post_tags` table.
///
/// New tags arriving inside a post payload have no id yet; the post save
/// filter assigns them one before validation (see
/// `validation::filters::posts`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tag {
    /// Unique identifier
    pub id: Uuid,
    /// Tag name (unique)
    pub name: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Tag {
    /// Create a new Tag
    pub fn new(id: Uuid, name: String) -> Self {
        Self {
            id,
            name,
            created_at: Utc::now(),
        }
    }
}
