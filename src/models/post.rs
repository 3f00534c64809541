//! Post model
//!
//! Posts carry the richest payload in the system: a status lifecycle,
//! an optional featured image and many-to-many links to categories and
//! tags.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Post publication status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PublishStatus {
    Published,
    Pending,
    Draft,
}

impl fmt::Display for PublishStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublishStatus::Published => write!(f, "published"),
            PublishStatus::Pending => write!(f, "pending"),
            PublishStatus::Draft => write!(f, "draft"),
        }
    }
}

impl FromStr for PublishStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "published" => Ok(PublishStatus::Published),
            "pending" => Ok(PublishStatus::Pending),
            "draft" => Ok(PublishStatus::Draft),
            _ => Err(format!("Invalid publish status: {}", s)),
        }
    }
}

/// Post entity.
///
/// Content is stored twice: the editor's JSON document and the rendered
/// HTML, both supplied by the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    /// Unique identifier
    pub id: Uuid,
    /// Author (references users.id)
    pub author_id: Uuid,
    /// Post title
    pub title: String,
    /// URL permalink (unique)
    pub permalink: String,
    /// Short summary shown in listings
    pub description: Option<String>,
    /// Editor document as JSON text
    pub content_json: String,
    /// Rendered HTML
    pub content_html: String,
    /// Publication status
    pub publish_status: PublishStatus,
    /// Featured image (references files.id)
    pub featured_image_id: Option<Uuid>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
    /// Publication timestamp
    pub published_at: Option<DateTime<Utc>>,
}

impl Post {
    /// Create a new draft Post
    pub fn new(
        id: Uuid,
        author_id: Uuid,
        title: String,
        permalink: String,
        content_json: String,
        content_html: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            author_id,
            title,
            permalink,
            description: None,
            content_json,
            content_html,
            publish_status: PublishStatus::Draft,
            featured_image_id: None,
            created_at: now,
            updated_at: now,
            published_at: None,
        }
    }
}
