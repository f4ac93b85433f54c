//! # Redis cache adapter
//!
//! Stores the serialized comment forest in Redis with a TTL. Keys are
//! namespaced by a configurable prefix so several deployments can share one
//! server.

use async_trait::async_trait;
use deadpool_redis::redis::{self, AsyncCommands};
use deadpool_redis::{Config, Pool, Runtime};
use domains::{CommentCache, DomainError, Result};
use std::time::Duration;

pub struct RedisCommentCache {
    pool: Pool,
    prefix: String,
}

impl RedisCommentCache {
    pub fn connect(url: &str, prefix: impl Into<String>) -> anyhow::Result<Self> {
        let pool = Config::from_url(url).create_pool(Some(Runtime::Tokio1))?;
        Ok(Self {
            pool,
            prefix: prefix.into(),
        })
    }

    fn key(&self, key: &str) -> String {
        if self.prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}:{key}", self.prefix)
        }
    }

    async fn conn(&self) -> Result<deadpool_redis::Connection> {
        self.pool.get().await.map_err(DomainError::internal)
    }
}

#[async_trait]
impl CommentCache for RedisCommentCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn().await?;
        let value: Option<String> = conn.get(self.key(key)).await.map_err(DomainError::internal)?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
        let mut conn = self.conn().await?;
        let _: () = redis::cmd("SET")
            .arg(self.key(key))
            .arg(value)
            .arg("EX")
            .arg(ttl.as_secs().max(1))
            .query_async(&mut conn)
            .await
            .map_err(DomainError::internal)?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.conn().await?;
        let _: i64 = conn.del(self.key(key)).await.map_err(DomainError::internal)?;
        Ok(())
    }
}
