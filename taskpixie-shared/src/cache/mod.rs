/// Key/value cache
///
/// Holds refresh sessions, access-token revocations and cache-aside copies of
/// user profiles. [`redis::RedisCache`] is the production adapter; anything
/// implementing [`Cache`] can stand in for it.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use taskpixie_shared::cache::{redis::{RedisCache, RedisConfig}, Cache};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let cache = RedisCache::new(RedisConfig::new("redis://localhost:6379")).await?;
/// cache.set_ex("greeting", "hello", Duration::from_secs(60)).await?;
/// assert_eq!(cache.get("greeting").await?, Some("hello".to_string()));
/// # Ok(())
/// # }
/// ```

use std::time::Duration;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use tracing::warn;

use crate::error::{DomainError, DomainResult};

pub mod redis;

#[async_trait]
pub trait Cache: Send + Sync {
    async fn get(&self, key: &str) -> DomainResult<Option<String>>;

    /// Stores `value` under `key`, expiring after `ttl`
    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> DomainResult<()>;

    /// Removes `key`; returns whether it existed
    async fn delete(&self, key: &str) -> DomainResult<bool>;

    /// Round trip to the backend
    async fn ping(&self) -> DomainResult<bool>;
}

/// Reads a JSON value; entries that no longer deserialize count as a miss
pub async fn get_json<T: DeserializeOwned>(cache: &dyn Cache, key: &str) -> DomainResult<Option<T>> {
    let Some(raw) = cache.get(key).await? else {
        return Ok(None);
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            warn!(key, error = %e, "Discarding undecodable cache entry");
            Ok(None)
        }
    }
}

pub async fn set_json<T: Serialize + Sync>(
    cache: &dyn Cache,
    key: &str,
    value: &T,
    ttl: Duration,
) -> DomainResult<()> {
    let raw = serde_json::to_string(value)
        .map_err(|e| DomainError::Storage(format!("Failed to encode cache entry: {}", e)))?;
    cache.set_ex(key, &raw, ttl).await
}
