use super::{BrokerChannel, BrokerErr, Connector, LiveSubscription, Result};
use crate::config;

use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::{watch, Mutex};

/// Owns the one broker channel the service uses and replaces it when it closes.
///
/// Everyone else only borrows the current channel through [`Supervisor::channel`].
pub struct Supervisor {
    connector: Arc<dyn Connector>,
    feed_cfg: config::Feed,
    current: RwLock<Arc<dyn BrokerChannel>>,
    replacing: Mutex<()>,
}

impl Supervisor {
    /// Open the first channel, retrying with backoff up to the configured limit
    pub async fn open(connector: Arc<dyn Connector>, feed_cfg: &config::Feed) -> Result<Self> {
        let channel = Self::setup(&*connector, feed_cfg).await?;
        Ok(Self {
            connector,
            feed_cfg: feed_cfg.clone(),
            current: RwLock::new(channel),
            replacing: Mutex::new(()),
        })
    }

    async fn setup(connector: &dyn Connector, feed_cfg: &config::Feed) -> Result<Arc<dyn BrokerChannel>> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match connector.open().await {
                Ok(channel) => return Ok(channel),
                Err(e) if attempt >= *feed_cfg.retry_limit => {
                    return Err(BrokerErr::SetupExhausted {
                        attempts: attempt,
                        last: Box::new(e),
                    })
                }
                Err(e) => {
                    let delay = feed_cfg.retry_delay_for(attempt);
                    log::warn!(
                        "Opening a broker channel failed (attempt {} of {}): {}.  Retrying in {:?}",
                        attempt,
                        *feed_cfg.retry_limit,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// The channel currently in use
    pub fn channel(&self) -> Arc<dyn BrokerChannel> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Get a working replacement for `failed`, closing `failed` first.
    ///
    /// Callers that report the same failed channel concurrently share one replacement; a
    /// caller whose channel was already replaced just gets the current one.
    pub async fn recover(&self, failed: &Arc<dyn BrokerChannel>) -> Result<Arc<dyn BrokerChannel>> {
        let _replacing = self.replacing.lock().await;
        let current = self.channel();
        if !same_channel(&current, failed) && current.is_open() {
            return Ok(current);
        }

        // nobody may keep using (or waiting on) the channel being replaced
        failed.close();
        log::warn!("Replacing the broker channel");
        let fresh = Self::setup(&*self.connector, &self.feed_cfg).await?;
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = fresh.clone();
        log::info!("Broker channel replaced; topology re-declared");
        Ok(fresh)
    }

    /// A fresh live subscription to `routing_key` on the current channel, replacing the
    /// channel first if it turns out to be closed
    pub async fn subscribe(&self, routing_key: &str) -> Result<LiveSubscription> {
        let channel = self.channel();
        match channel.subscribe(routing_key).await {
            Err(BrokerErr::Closed) => self.recover(&channel).await?.subscribe(routing_key).await,
            subscribed => subscribed,
        }
    }

    /// Replace the channel whenever it closes, until `shutdown` turns `true`.
    ///
    /// Returns an error only if a replacement could not be opened at all.
    pub async fn watch(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        loop {
            let channel = self.channel();
            tokio::select! {
                _ = shutdown.changed() => {
                    log::info!("Broker supervisor stopping");
                    return Ok(());
                }
                _ = closed(channel.closed()) => {
                    self.recover(&channel).await?;
                }
            }
        }
    }
}

/// Resolves once the channel behind `notifications` is closed
async fn closed(mut notifications: watch::Receiver<bool>) {
    let _ = notifications.wait_for(|closed| *closed).await;
}

fn same_channel(a: &Arc<dyn BrokerChannel>, b: &Arc<dyn BrokerChannel>) -> bool {
    Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
}
