//! Stored file model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A file stored in the database.
///
/// The raw bytes live in the `data` column; API responses carry only
/// the metadata, the read endpoint streams the bytes with the stored
/// MIME type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredFile {
    /// Unique identifier
    pub id: Uuid,
    /// Original file name
    pub name: String,
    /// MIME type
    pub mime_type: String,
    /// Size in bytes
    pub size: i64,
    /// Raw file content
    #[serde(skip_serializing)]
    pub data: Vec<u8>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl StoredFile {
    /// Create a new StoredFile record
    pub fn new(id: Uuid, name: String, mime_type: String, data: Vec<u8>) -> Self {
        Self {
            id,
            name,
            mime_type,
            size: data.len() as i64,
            data,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_tracks_data_length() {
        let file = StoredFile::new(
            Uuid::new_v4(),
            "logo.png".to_string(),
            "image/png".to_string(),
            vec![0u8; 512],
        );
        assert_eq!(file.size, 512);
    }

    #[test]
    fn test_data_not_serialized() {
        let file = StoredFile::new(
            Uuid::new_v4(),
            "logo.png".to_string(),
            "image/png".to_string(),
            vec![1, 2, 3],
        );
        let json = serde_json::to_value(&file).unwrap();
        assert!(json.get("data").is_none());
        assert_eq!(json.get("size").unwrap(), 3);
    }
}
