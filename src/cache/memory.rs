//! In-memory cache implementation using moka
//!
//! Provides a fast, thread-safe in-memory cache with TTL support.
//!
//! # Features
//! - Per-entry TTL, capped by the cache-wide maximum
//! - Glob-style pattern matching for bulk deletion
//! - Thread-safe concurrent access

use super::CacheLayer;
use anyhow::{Context, Result};
use async_trait::async_trait;
use moka::future::Cache;
use moka::Expiry;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default maximum cache capacity (number of entries)
const DEFAULT_MAX_CAPACITY: u64 = 10_000;

/// Default TTL cap for cache entries (1 hour)
const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// Cache entry wrapper that stores serialized JSON data.
/// This allows us to store any serializable type in the cache.
#[derive(Clone)]
struct CacheEntry {
    /// JSON-serialized value
    data: Arc<String>,
    /// Lifetime requested for this entry
    ttl: Duration,
}

impl CacheEntry {
    fn new<T: Serialize>(value: &T, ttl: Duration) -> Result<Self> {
        let json = serde_json::to_string(value).context("Failed to serialize cache value")?;
        Ok(Self {
            data: Arc::new(json),
            ttl,
        })
    }

    fn deserialize<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.data).context("Failed to deserialize cache value")
    }
}

/// Expiry policy reading each entry's own TTL, capped at the cache-wide
/// maximum. Overwrites restart the clock with the new entry's TTL.
struct EntryTtl {
    max_ttl: Duration,
}

impl Expiry<String, CacheEntry> for EntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        entry: &CacheEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(entry.ttl.min(self.max_ttl))
    }

    fn expire_after_update(
        &self,
        _key: &String,
        entry: &CacheEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(entry.ttl.min(self.max_ttl))
    }
}

/// In-memory cache using moka.
///
/// Values are stored as JSON strings to support generic types.
pub struct MemoryCache {
    /// The underlying moka cache instance
    cache: Cache<String, CacheEntry>,
    /// Upper bound on any entry's TTL
    max_ttl: Duration,
}

impl std::fmt::Debug for MemoryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCache")
            .field("entry_count", &self.cache.entry_count())
            .field("max_ttl", &self.max_ttl)
            .finish()
    }
}

impl MemoryCache {
    /// Create a new memory cache with default settings
    pub fn new() -> Self {
        Self::with_capacity_and_ttl(DEFAULT_MAX_CAPACITY, DEFAULT_TTL)
    }

    /// Create a new memory cache with custom capacity and TTL cap
    pub fn with_capacity_and_ttl(max_capacity: u64, max_ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(EntryTtl { max_ttl })
            .support_invalidation_closures()
            .build();

        Self { cache, max_ttl }
    }

    /// Get the TTL cap for this cache
    pub fn max_ttl(&self) -> Duration {
        self.max_ttl
    }

    /// Get the current number of entries in the cache
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    /// Check if a pattern matches a key using glob-style matching.
    ///
    /// Supports:
    /// - `*` matches any sequence of characters
    /// - `?` matches any single character
    fn pattern_matches(pattern: &str, key: &str) -> bool {
        let pattern_chars: Vec<char> = pattern.chars().collect();
        let key_chars: Vec<char> = key.chars().collect();
        Self::glob_match(&pattern_chars, &key_chars, 0, 0)
    }

    fn glob_match(pattern: &[char], key: &[char], pi: usize, ki: usize) -> bool {
        if pi == pattern.len() {
            return ki == key.len();
        }

        match pattern[pi] {
            '*' => {
                // Zero characters, then one or more
                if Self::glob_match(pattern, key, pi + 1, ki) {
                    return true;
                }
                if ki < key.len() && Self::glob_match(pattern, key, pi, ki + 1) {
                    return true;
                }
                false
            }
            '?' => {
                if ki < key.len() {
                    Self::glob_match(pattern, key, pi + 1, ki + 1)
                } else {
                    false
                }
            }
            p => {
                if ki < key.len() && key[ki] == p {
                    Self::glob_match(pattern, key, pi + 1, ki + 1)
                } else {
                    false
                }
            }
        }
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheLayer for MemoryCache {
    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>> {
        match self.cache.get(key).await {
            Some(entry) => {
                let value = entry.deserialize()?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    async fn set<T: Serialize + Send + Sync>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> Result<()> {
        let entry = CacheEntry::new(value, ttl)?;
        self.cache.insert(key.to_string(), entry).await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.cache.invalidate(key).await;
        Ok(())
    }

    async fn delete_pattern(&self, pattern: &str) -> Result<()> {
        // Iterates all keys; fine at this cache's scale
        let keys_to_delete: Vec<String> = self
            .cache
            .iter()
            .filter(|(key, _)| Self::pattern_matches(pattern, key.as_ref()))
            .map(|(key, _)| (*key).clone())
            .collect();

        for key in keys_to_delete {
            self.cache.invalidate(&key).await;
        }

        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
        Ok(())
    }
}
