//! Failed login model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A recorded failed login attempt.
///
/// Rows accumulate per attempt; the rate limiter and the admin screens
/// both read from this table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedLogin {
    /// Unique identifier
    pub id: Uuid,
    /// Username that was attempted
    pub username: String,
    /// Source IP address of the attempt
    pub ip_address: String,
    /// User agent string of the attempt, if sent
    pub user_agent: Option<String>,
    /// Attempt timestamp
    pub created_at: DateTime<Utc>,
}

impl FailedLogin {
    /// Record a new failed login attempt
    pub fn new(username: String, ip_address: String, user_agent: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            username,
            ip_address,
            user_agent,
            created_at: Utc::now(),
        }
    }
}
