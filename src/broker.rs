//! The message broker: the fan-out queue between ingestion and the worker, and the live
//! exchange that carries fanned-out snapshots to connected viewers.
//!
//! Consumers never hold a channel for long; they ask the [`Supervisor`] for the current
//! one, and hand it back through [`Supervisor::recover`] when it fails.
mod err;
mod memory;
mod redis_broker;
mod supervisor;

pub use err::BrokerErr;
pub use memory::MemoryConnector;
pub use redis_broker::RedisConnector;
pub use supervisor::Supervisor;

use crate::model::Id;

use async_trait::async_trait;
use std::{fmt, sync::Arc, time::Duration};
use tokio::sync::watch;

pub type Result<T> = std::result::Result<T, BrokerErr>;

/// The routing key a viewer's live connections subscribe to
pub fn routing_key(viewer: Id) -> String {
    format!("user.{}", viewer)
}

/// One open channel to the broker.
#[async_trait]
pub trait BrokerChannel: Send + Sync {
    /// Check (or create) the queue and exchange this channel works with
    async fn declare_topology(&self) -> Result<()>;

    async fn enqueue(&self, body: &str) -> Result<()>;

    /// Take the oldest queued message, waiting at most `timeout` for one to arrive.
    /// Taking a message acknowledges it.
    async fn dequeue(&self, timeout: Duration) -> Result<Option<String>>;

    /// Broadcast `body` to every current subscriber of `routing_key`
    async fn publish(&self, routing_key: &str, body: &str) -> Result<()>;

    async fn subscribe(&self, routing_key: &str) -> Result<LiveSubscription>;

    /// Stop using this channel.  Everyone watching `closed` is notified.
    fn close(&self);

    /// A receiver that turns `true` once this channel can no longer be used
    fn closed(&self) -> watch::Receiver<bool>;

    fn is_open(&self) -> bool {
        let closed = self.closed();
        let is_closed = *closed.borrow();
        !is_closed
    }
}

/// Opens fresh channels, with their topology declared.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn open(&self) -> Result<Arc<dyn BrokerChannel>>;
}

#[async_trait]
pub(crate) trait LiveSource: Send {
    async fn next(&mut self) -> Result<String>;
}

/// An ephemeral subscription owned by one live connection.  Dropping it releases the
/// broker-side subscription.
pub struct LiveSubscription {
    routing_key: String,
    source: Box<dyn LiveSource>,
}

impl LiveSubscription {
    pub(crate) fn new(routing_key: &str, source: Box<dyn LiveSource>) -> Self {
        Self {
            routing_key: routing_key.to_string(),
            source,
        }
    }

    pub fn routing_key(&self) -> &str {
        &self.routing_key
    }

    /// The next message published to this subscription's routing key
    pub async fn next(&mut self) -> Result<String> {
        self.source.next().await
    }
}

impl fmt::Debug for LiveSubscription {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "LiveSubscription({})", self.routing_key)
    }
}

impl Drop for LiveSubscription {
    fn drop(&mut self) {
        log::debug!("Released live subscription to {}", self.routing_key);
    }
}
