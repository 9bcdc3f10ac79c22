use crate::broker::{LiveSubscription, Supervisor};

use futures::{SinkExt, StreamExt};
use std::{sync::Arc, time::Duration};
use tokio::time::{self, Instant, MissedTickBehavior};
use warp::ws::{Message, WebSocket};

/// How long to wait between attempts to restore a failed subscription
const RESUBSCRIBE_DELAY: Duration = Duration::from_secs(1);

/// One live viewer connection: forwards every message on the viewer's subscription to
/// their WebSocket, verbatim, until the viewer goes away.
///
/// If the subscription fails, the connection stays open (and silent) while a new
/// subscription is attempted.
pub struct Ws {
    subscription: LiveSubscription,
    broker: Arc<Supervisor>,
    ping_freq: Duration,
}

impl Ws {
    pub fn new(subscription: LiveSubscription, broker: Arc<Supervisor>, ping_freq: Duration) -> Self {
        Self {
            subscription,
            broker,
            ping_freq,
        }
    }

    pub async fn send_to(self, ws: WebSocket) {
        let (mut transmit_to_ws, mut receive_from_ws) = ws.split();
        let routing_key = self.subscription.routing_key().to_string();
        let mut subscription = Some(self.subscription);
        let mut ping = time::interval_at(Instant::now() + self.ping_freq, self.ping_freq);
        let mut resubscribe = time::interval(RESUBSCRIBE_DELAY);
        resubscribe.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                next = next_payload(&mut subscription) => match next {
                    Ok(payload) => {
                        if let Err(e) = transmit_to_ws.send(Message::text(payload)).await {
                            log::info!("WebSocket send error: {}", e);
                            break;
                        }
                    }
                    Err(e) => {
                        log::warn!("Live subscription to {} failed: {}", routing_key, e);
                        subscription = None;
                    }
                },
                _ = resubscribe.tick(), if subscription.is_none() => {
                    match self.broker.subscribe(&routing_key).await {
                        Ok(restored) => {
                            log::info!("Live subscription to {} restored", routing_key);
                            subscription = Some(restored);
                        }
                        Err(e) => log::warn!("Could not resubscribe to {}: {}", routing_key, e),
                    }
                }
                incoming = receive_from_ws.next() => match incoming {
                    Some(Ok(msg)) if msg.is_close() => break,
                    Some(Ok(_)) => (),
                    Some(Err(e)) => {
                        log::info!("WebSocket receive error: {}", e);
                        break;
                    }
                    None => break,
                },
                _ = ping.tick() => {
                    if transmit_to_ws.send(Message::ping(Vec::new())).await.is_err() {
                        break;
                    }
                }
            }
        }

        drop(subscription);
        if let Err(e) = transmit_to_ws.close().await {
            log::debug!("WebSocket was already closed: {}", e);
        }
        log::info!("Live connection for {} closed", routing_key);
    }
}

/// The next payload on `subscription`, or never if there is none
async fn next_payload(subscription: &mut Option<LiveSubscription>) -> crate::broker::Result<String> {
    match subscription {
        Some(subscription) => subscription.next().await,
        None => futures::future::pending().await,
    }
}
