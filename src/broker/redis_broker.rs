use super::{BrokerChannel, BrokerErr, Connector, LiveSource, LiveSubscription, Result};
use crate::config;
use crate::redis::{RedisCmd, RedisConn, RedisConnErr, RedisSubscriber};

use async_trait::async_trait;
use std::{sync::Arc, time::Duration};
use tokio::sync::{watch, Mutex};

/// Opens Redis-backed broker channels.
///
/// The queue is a Redis list (pushed on the left, popped from the right) and the
/// exchange is a family of pub/sub channels, one per routing key.
#[derive(Debug, Clone)]
pub struct RedisConnector {
    redis_cfg: config::Redis,
    feed_cfg: config::Feed,
}

impl RedisConnector {
    pub fn new(redis_cfg: &config::Redis, feed_cfg: &config::Feed) -> Self {
        Self {
            redis_cfg: redis_cfg.clone(),
            feed_cfg: feed_cfg.clone(),
        }
    }
}

#[async_trait]
impl Connector for RedisConnector {
    async fn open(&self) -> Result<Arc<dyn BrokerChannel>> {
        let channel = RedisBroker {
            redis_cfg: self.redis_cfg.clone(),
            queue: self.redis_cfg.namespaced(&self.feed_cfg.queue),
            exchange: self.redis_cfg.namespaced(&self.feed_cfg.exchange),
            commands: Mutex::new(RedisConn::new(&self.redis_cfg).await?),
            consumer: Mutex::new(RedisConn::new(&self.redis_cfg).await?),
            closed: watch::channel(false).0,
        };
        channel.declare_topology().await?;
        log::info!("Opened a broker channel for queue `{}`", channel.queue);
        Ok(Arc::new(channel))
    }
}

/// A broker channel made of two Redis connections: one for commands that answer right
/// away, and one that may sit in a blocking pop.
#[derive(Debug)]
struct RedisBroker {
    redis_cfg: config::Redis,
    queue: String,
    exchange: String,
    commands: Mutex<RedisConn>,
    consumer: Mutex<RedisConn>,
    closed: watch::Sender<bool>,
}

impl RedisBroker {
    fn exchange_channel(&self, routing_key: &str) -> String {
        [&self.exchange, ":", routing_key].concat()
    }

    fn ensure_open(&self) -> Result<()> {
        match *self.closed.borrow() {
            true => Err(BrokerErr::Closed),
            false => Ok(()),
        }
    }

    /// Send `cmd` on `conn`, closing the whole channel if the connection is lost or was
    /// left mid-command by an earlier caller.
    async fn send(&self, conn: &Mutex<RedisConn>, cmd: RedisCmd) -> Result<crate::redis::RedisReply> {
        self.ensure_open()?;
        let mut conn = conn.lock().await;
        if conn.is_dirty() {
            self.close_because("a command was interrupted");
            return Err(BrokerErr::Closed);
        }
        match conn.send(cmd).await {
            Err(e) if e.is_connection_lost() => {
                self.close_because(&e.to_string());
                Err(e.into())
            }
            reply => Ok(reply?),
        }
    }

    fn close_because(&self, reason: &str) {
        if !self.closed.send_replace(true) {
            log::warn!("Broker channel for `{}` closed: {}", self.queue, reason);
        }
    }
}

#[async_trait]
impl BrokerChannel for RedisBroker {
    async fn declare_topology(&self) -> Result<()> {
        let kind = self.send(&self.commands, RedisCmd::type_of(&self.queue)).await?;
        match String::try_from(kind).map_err(RedisConnErr::from)?.as_str() {
            "list" | "none" => Ok(()),
            other => Err(BrokerErr::Topology(format!(
                "`{}` already holds a {}, not a queue",
                self.queue, other
            ))),
        }
    }

    async fn enqueue(&self, body: &str) -> Result<()> {
        self.send(&self.commands, RedisCmd::lpush(&self.queue, body))
            .await?;
        Ok(())
    }

    async fn dequeue(&self, timeout: Duration) -> Result<Option<String>> {
        // a zero timeout would block forever
        let timeout_secs = timeout.as_secs().max(1);
        let reply = self
            .send(&self.consumer, RedisCmd::brpop(&self.queue, timeout_secs))
            .await?;
        let mut popped = reply.into_strings().map_err(RedisConnErr::from)?;
        // `[queue, body]`, or nil on timeout
        Ok(match popped.len() {
            2 => popped.pop(),
            _ => None,
        })
    }

    async fn publish(&self, routing_key: &str, body: &str) -> Result<()> {
        let channel = self.exchange_channel(routing_key);
        self.send(&self.commands, RedisCmd::publish(&channel, body))
            .await?;
        Ok(())
    }

    async fn subscribe(&self, routing_key: &str) -> Result<LiveSubscription> {
        self.ensure_open()?;
        let channel = self.exchange_channel(routing_key);
        let subscriber = RedisSubscriber::subscribe(&self.redis_cfg, channel).await?;
        Ok(LiveSubscription::new(routing_key, Box::new(subscriber)))
    }

    fn close(&self) {
        self.close_because("replaced");
    }

    fn closed(&self) -> watch::Receiver<bool> {
        self.closed.subscribe()
    }
}

#[async_trait]
impl LiveSource for RedisSubscriber {
    async fn next(&mut self) -> Result<String> {
        Ok(self.next_message().await?)
    }
}
