use super::{BrokerChannel, BrokerErr, Connector, LiveSource, LiveSubscription, Result};

use async_trait::async_trait;
use hashbrown::HashMap;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::{broadcast, watch, Notify};

/// Messages a live subscriber may fall behind by before it starts missing some
const LIVE_BUFFER: usize = 256;

/// The broker state that outlives any one channel: the queued messages and the
/// exchange's routes.
#[derive(Debug, Default)]
struct Exchange {
    queue: Mutex<VecDeque<String>>,
    queued: Notify,
    routes: Mutex<HashMap<String, broadcast::Sender<String>>>,
}

/// An in-process broker, for tests and local development.
///
/// Channels can be closed on demand and opening can be made to fail, which is what the
/// recovery paths need to be exercised.
#[derive(Debug, Default)]
pub struct MemoryConnector {
    exchange: Arc<Exchange>,
    channels: Mutex<Vec<Arc<MemoryChannel>>>,
    failing_opens: AtomicU32,
    opened: AtomicU32,
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` calls to `open` fail
    pub fn fail_next_opens(&self, count: u32) {
        self.failing_opens.store(count, Ordering::SeqCst);
    }

    /// How many channels have been opened so far
    pub fn opened(&self) -> u32 {
        self.opened.load(Ordering::SeqCst)
    }

    /// Close every channel opened so far, as if the broker had dropped them
    pub fn close_all(&self) {
        for channel in lock(&self.channels).drain(..) {
            channel.close();
        }
    }

    /// Live subscriptions currently bound to `routing_key`
    pub fn subscribers(&self, routing_key: &str) -> usize {
        lock(&self.exchange.routes)
            .get(routing_key)
            .map_or(0, |route| route.receiver_count())
    }

    /// Messages waiting in the queue
    pub fn queued(&self) -> Vec<String> {
        lock(&self.exchange.queue).iter().cloned().collect()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn open(&self) -> Result<Arc<dyn BrokerChannel>> {
        let failing = self
            .failing_opens
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if failing.is_ok() {
            return Err(BrokerErr::Closed);
        }

        let channel = Arc::new(MemoryChannel {
            exchange: self.exchange.clone(),
            closed: watch::channel(false).0,
        });
        channel.declare_topology().await?;
        lock(&self.channels).push(channel.clone());
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(channel)
    }
}

#[derive(Debug)]
struct MemoryChannel {
    exchange: Arc<Exchange>,
    closed: watch::Sender<bool>,
}

impl MemoryChannel {
    fn ensure_open(&self) -> Result<()> {
        match *self.closed.borrow() {
            true => Err(BrokerErr::Closed),
            false => Ok(()),
        }
    }
}

#[async_trait]
impl BrokerChannel for MemoryChannel {
    async fn declare_topology(&self) -> Result<()> {
        self.ensure_open()
    }

    async fn enqueue(&self, body: &str) -> Result<()> {
        self.ensure_open()?;
        lock(&self.exchange.queue).push_back(body.to_string());
        self.exchange.queued.notify_one();
        Ok(())
    }

    async fn dequeue(&self, timeout: Duration) -> Result<Option<String>> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            self.ensure_open()?;
            let notified = self.exchange.queued.notified();
            if let Some(body) = lock(&self.exchange.queue).pop_front() {
                return Ok(Some(body));
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return Ok(None);
            }
        }
    }

    async fn publish(&self, routing_key: &str, body: &str) -> Result<()> {
        self.ensure_open()?;
        let mut routes = lock(&self.exchange.routes);
        let abandoned = match routes.get(routing_key) {
            Some(route) => route.send(body.to_string()).is_err(),
            None => false,
        };
        if abandoned {
            // every subscriber is gone
            routes.remove(routing_key);
        }
        Ok(())
    }

    async fn subscribe(&self, routing_key: &str) -> Result<LiveSubscription> {
        self.ensure_open()?;
        let receiver = lock(&self.exchange.routes)
            .entry(routing_key.to_string())
            .or_insert_with(|| broadcast::channel(LIVE_BUFFER).0)
            .subscribe();
        Ok(LiveSubscription::new(routing_key, Box::new(receiver)))
    }

    fn close(&self) {
        self.closed.send_replace(true);
        // wake a consumer blocked in `dequeue`
        self.exchange.queued.notify_waiters();
    }

    fn closed(&self) -> watch::Receiver<bool> {
        self.closed.subscribe()
    }
}

#[async_trait]
impl LiveSource for broadcast::Receiver<String> {
    async fn next(&mut self) -> Result<String> {
        loop {
            match self.recv().await {
                Ok(body) => return Ok(body),
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    log::warn!("Live subscriber fell behind and missed {} messages", missed)
                }
                Err(broadcast::error::RecvError::Closed) => return Err(BrokerErr::Closed),
            }
        }
    }
}
