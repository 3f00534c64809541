//! Cache layer
//!
//! In-memory caching for hot read paths (entity lists and single
//! records). Services invalidate by key pattern after writes.
//!
//! # Usage
//!
//! ```rust,ignore
//! use atrium::cache::{create_cache, CacheLayer};
//! use atrium::config::CacheConfig;
//!
//! let cache = create_cache(&CacheConfig::default());
//! cache.set("key", &"value", Duration::from_secs(60)).await?;
//! ```

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::config::CacheConfig;

pub use memory::MemoryCache;

/// Cache layer trait
///
/// Note: the generic methods make this trait non-object-safe; share the
/// concrete `MemoryCache` behind an `Arc` instead of `dyn CacheLayer`.
#[async_trait]
pub trait CacheLayer: Send + Sync {
    /// Get a value from cache
    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>>;

    /// Set a value in cache with TTL
    async fn set<T: Serialize + Send + Sync>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> Result<()>;

    /// Delete a value from cache
    async fn delete(&self, key: &str) -> Result<()>;

    /// Delete all values matching a pattern
    async fn delete_pattern(&self, pattern: &str) -> Result<()>;

    /// Clear all cache entries
    async fn clear(&self) -> Result<()>;
}

/// Create a cache instance based on configuration.
pub fn create_cache(config: &CacheConfig) -> Arc<MemoryCache> {
    let ttl = Duration::from_secs(config.ttl_seconds);
    Arc::new(MemoryCache::with_capacity_and_ttl(config.max_capacity, ttl))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_cache_from_config() {
        let config = CacheConfig::default();
        let cache = create_cache(&config);

        cache
            .set("test_key", &"test_value".to_string(), Duration::from_secs(60))
            .await
            .unwrap();
        let result: Option<String> = cache.get("test_key").await.unwrap();
        assert_eq!(result, Some("test_value".to_string()));
    }
}
