//! Rate limiter for login attempts
//!
//! Short-circuits repeated failed logins before they hit the database:
//! - per username: 5 attempts per 15 minutes
//! - per IP address: 10 requests per minute

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Login rate limiter
pub struct LoginRateLimiter {
    username_attempts: Arc<RwLock<HashMap<String, Vec<DateTime<Utc>>>>>,
    ip_attempts: Arc<RwLock<HashMap<IpAddr, Vec<DateTime<Utc>>>>>,
}

impl LoginRateLimiter {
    pub fn new() -> Self {
        Self {
            username_attempts: Arc::new(RwLock::new(HashMap::new())),
            ip_attempts: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Check if a username is rate limited (5 attempts per 15 minutes)
    pub async fn is_username_limited(&self, username: &str) -> bool {
        let mut attempts = self.username_attempts.write().await;
        let cutoff = Utc::now() - Duration::minutes(15);

        let entries = attempts
            .entry(username.to_lowercase())
            .or_insert_with(Vec::new);
        entries.retain(|time| *time > cutoff);

        entries.len() >= 5
    }

    /// Record a failed login attempt for a username
    pub async fn record_failed_attempt(&self, username: &str) {
        let mut attempts = self.username_attempts.write().await;
        attempts
            .entry(username.to_lowercase())
            .or_insert_with(Vec::new)
            .push(Utc::now());
    }

    /// Clear attempts for a username (on successful login)
    pub async fn clear_username_attempts(&self, username: &str) {
        let mut attempts = self.username_attempts.write().await;
        attempts.remove(&username.to_lowercase());
    }

    /// Check if an IP is rate limited (10 requests per minute)
    pub async fn is_ip_limited(&self, ip: IpAddr) -> bool {
        let mut attempts = self.ip_attempts.write().await;
        let cutoff = Utc::now() - Duration::minutes(1);

        let entries = attempts.entry(ip).or_insert_with(Vec::new);
        entries.retain(|time| *time > cutoff);

        entries.len() >= 10
    }

    /// Record a login request from an IP
    pub async fn record_ip_request(&self, ip: IpAddr) {
        let mut attempts = self.ip_attempts.write().await;
        attempts.entry(ip).or_insert_with(Vec::new).push(Utc::now());
    }

    /// Drop expired entries; called from the periodic cleanup task
    pub async fn cleanup(&self) {
        let now = Utc::now();
        let username_cutoff = now - Duration::minutes(15);
        let ip_cutoff = now - Duration::minutes(1);

        {
            let mut attempts = self.username_attempts.write().await;
            attempts.retain(|_, times| {
                times.retain(|time| *time > username_cutoff);
                !times.is_empty()
            });
        }

        {
            let mut attempts = self.ip_attempts.write().await;
            attempts.retain(|_, times| {
                times.retain(|time| *time > ip_cutoff);
                !times.is_empty()
            });
        }
    }
}

impl Default for LoginRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}
