/// Redis adapter for [`Cache`]
///
/// Uses a `ConnectionManager`, which multiplexes one connection and reconnects
/// on its own; clones share the same connection. Every command is bounded by
/// `command_timeout_secs`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, RedisError};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::Cache;
use crate::error::{DomainError, DomainResult};

#[derive(Error, Debug)]
pub enum RedisCacheError {
    #[error("Redis connection error: {0}")]
    ConnectionError(String),

    #[error("Redis command error: {0}")]
    CommandError(String),

    #[error("Redis configuration error: {0}")]
    ConfigError(String),

    #[error("Redis command timed out after {0:?}")]
    Timeout(Duration),
}

impl From<RedisError> for RedisCacheError {
    fn from(err: RedisError) -> Self {
        if err.is_io_error() || err.is_connection_dropped() {
            RedisCacheError::ConnectionError(err.to_string())
        } else {
            RedisCacheError::CommandError(err.to_string())
        }
    }
}

impl From<RedisCacheError> for DomainError {
    fn from(err: RedisCacheError) -> Self {
        DomainError::Storage(err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// `redis://[user:pass@]host:port[/db]`
    pub url: String,

    /// Default: 5
    pub command_timeout_secs: u64,
}

impl RedisConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            command_timeout_secs: 5,
        }
    }
}

#[derive(Clone)]
pub struct RedisCache {
    manager: ConnectionManager,
    config: Arc<RedisConfig>,
}

impl RedisCache {
    pub async fn new(config: RedisConfig) -> Result<Self, RedisCacheError> {
        let client = Client::open(config.url.as_str())
            .map_err(|e| RedisCacheError::ConfigError(format!("Invalid Redis URL: {}", e)))?;

        let manager = ConnectionManager::new(client)
            .await
            .map_err(|e| RedisCacheError::ConnectionError(format!("Failed to connect to Redis: {}", e)))?;

        info!(url = %sanitize_url(&config.url), "Redis cache connected");

        Ok(Self {
            manager,
            config: Arc::new(config),
        })
    }

    /// Runs one command against a cloned manager, bounded by the command timeout
    async fn run<T, F, Fut>(&self, command: F) -> Result<T, RedisCacheError>
    where
        F: FnOnce(ConnectionManager) -> Fut,
        Fut: std::future::Future<Output = Result<T, RedisError>>,
    {
        let timeout = Duration::from_secs(self.config.command_timeout_secs);

        tokio::time::timeout(timeout, command(self.manager.clone()))
            .await
            .map_err(|_| RedisCacheError::Timeout(timeout))?
            .map_err(RedisCacheError::from)
    }
}

#[async_trait]
impl Cache for RedisCache {
    async fn get(&self, key: &str) -> DomainResult<Option<String>> {
        let value = self
            .run(|mut conn| async move { conn.get::<_, Option<String>>(key).await })
            .await?;
        Ok(value)
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> DomainResult<()> {
        // SETEX rejects a zero expiry
        let seconds = ttl.as_secs().max(1);

        self.run(|mut conn| async move { conn.set_ex::<_, _, ()>(key, value, seconds).await })
            .await?;

        debug!(key, ttl_secs = seconds, "Cache entry stored");
        Ok(())
    }

    async fn delete(&self, key: &str) -> DomainResult<bool> {
        let removed = self
            .run(|mut conn| async move { conn.del::<_, u64>(key).await })
            .await?;
        Ok(removed > 0)
    }

    async fn ping(&self) -> DomainResult<bool> {
        let reply = self
            .run(|mut conn| async move { redis::cmd("PING").query_async::<_, String>(&mut conn).await })
            .await;

        match reply {
            Ok(pong) if pong == "PONG" => Ok(true),
            Ok(other) => {
                warn!(reply = %other, "Unexpected PING reply");
                Ok(false)
            }
            Err(e) => {
                error!(error = %e, "Redis health check failed");
                Err(e.into())
            }
        }
    }
}

/// Masks credentials before a URL is logged
pub fn sanitize_url(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            format!("{}***@{}", &url[..scheme_end + 3], &url[at + 1..])
        }
        _ => url.to_string(),
    }
}
