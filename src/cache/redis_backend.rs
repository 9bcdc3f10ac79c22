use super::{CacheBackend, Result};
use crate::config;
use crate::redis::{RedisCmd, RedisConn, RedisConnErr, RedisReply};

use async_trait::async_trait;
use tokio::sync::Mutex;

/// The caches, stored in Redis lists and sets.
///
/// Commands share one connection.  A connection that fails (or whose command was
/// interrupted) is dropped and replaced on the next command.
#[derive(Debug)]
pub struct RedisCache {
    redis_cfg: config::Redis,
    conn: Mutex<Option<RedisConn>>,
}

impl RedisCache {
    /// Connect right away, so that a misconfigured Redis is reported at startup
    pub async fn new(redis_cfg: &config::Redis) -> std::result::Result<Self, RedisConnErr> {
        let conn = RedisConn::new(redis_cfg).await?;
        Ok(Self {
            redis_cfg: redis_cfg.clone(),
            conn: Mutex::new(Some(conn)),
        })
    }

    fn key(&self, key: &str) -> String {
        self.redis_cfg.namespaced(key)
    }

    async fn pipeline(&self, cmds: Vec<RedisCmd>) -> Result<Vec<RedisReply>> {
        let mut slot = self.conn.lock().await;
        let mut conn = match slot.take() {
            Some(conn) if !conn.is_dirty() => conn,
            _stale_or_missing => RedisConn::new(&self.redis_cfg).await?,
        };
        let replies = conn.pipeline(cmds).await;
        if !conn.is_dirty() {
            *slot = Some(conn);
        }
        Ok(replies?)
    }

    async fn send(&self, cmd: RedisCmd) -> Result<RedisReply> {
        let mut replies = self.pipeline(vec![cmd]).await?;
        Ok(replies.pop().unwrap_or(RedisReply::Array(None)))
    }

    /// Run `cmds` inside `MULTI`/`EXEC` and check every queued command succeeded
    async fn transaction(&self, cmds: Vec<RedisCmd>) -> Result<()> {
        let mut all = Vec::with_capacity(cmds.len() + 2);
        all.push(RedisCmd::multi());
        all.extend(cmds);
        all.push(RedisCmd::exec());

        match self.pipeline(all).await?.pop() {
            Some(RedisReply::Array(Some(results))) => match results
                .into_iter()
                .find(|r| matches!(r, RedisReply::Error(_)))
            {
                Some(RedisReply::Error(msg)) => Err(RedisConnErr::ServerErr(msg).into()),
                _ => Ok(()),
            },
            other => Err(RedisConnErr::InvalidRedisReply(format!("EXEC returned {:?}", other)).into()),
        }
    }
}

/// `LTRIM`/`LRANGE` take an inclusive stop index
fn last_index(max_len: usize) -> i64 {
    max_len as i64 - 1
}

#[async_trait]
impl CacheBackend for RedisCache {
    async fn push(&self, key: &str, value: &str) -> Result<()> {
        self.send(RedisCmd::lpush(&self.key(key), value)).await?;
        Ok(())
    }

    async fn trim(&self, key: &str, max_len: usize) -> Result<()> {
        self.send(RedisCmd::ltrim(&self.key(key), 0, last_index(max_len)))
            .await?;
        Ok(())
    }

    async fn push_bounded(&self, key: &str, value: &str, max_len: usize) -> Result<()> {
        let key = self.key(key);
        self.transaction(vec![
            RedisCmd::lpush(&key, value),
            RedisCmd::ltrim(&key, 0, last_index(max_len)),
        ])
        .await
    }

    async fn range(&self, key: &str, max_len: usize) -> Result<Vec<String>> {
        let reply = self
            .send(RedisCmd::lrange(&self.key(key), 0, last_index(max_len)))
            .await?;
        Ok(reply.into_strings()?)
    }

    async fn remove(&self, key: &str, value: &str) -> Result<u64> {
        let removed = self
            .send(RedisCmd::lrem(&self.key(key), 0, value))
            .await?
            .into_integer()?;
        Ok(removed.max(0) as u64)
    }

    async fn set_add(&self, key: &str, member: &str) -> Result<()> {
        self.send(RedisCmd::sadd(&self.key(key), member)).await?;
        Ok(())
    }

    async fn set_remove(&self, key: &str, member: &str) -> Result<()> {
        self.send(RedisCmd::srem(&self.key(key), member)).await?;
        Ok(())
    }

    async fn set_members(&self, key: &str) -> Result<Vec<String>> {
        let reply = self.send(RedisCmd::smembers(&self.key(key))).await?;
        Ok(reply.into_strings()?)
    }
}
