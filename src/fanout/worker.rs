use crate::broker::{self, Supervisor};
use crate::cache::{FeedCache, FollowGraph};
use crate::model::Publication;

use std::{sync::Arc, time::Duration};
use tokio::sync::watch;

/// The single consumer of the fan-out queue.
///
/// Messages are handled strictly one after another, so every follower sees publications
/// in the order they were dequeued.
pub struct Worker {
    broker: Arc<Supervisor>,
    feeds: FeedCache,
    graph: FollowGraph,
    dequeue_timeout: Duration,
}

impl Worker {
    pub fn new(
        broker: Arc<Supervisor>,
        feeds: FeedCache,
        graph: FollowGraph,
        dequeue_timeout: Duration,
    ) -> Self {
        Self {
            broker,
            feeds,
            graph,
            dequeue_timeout,
        }
    }

    /// Consume the queue until `shutdown` turns `true`.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        log::info!("Fan-out worker started");
        loop {
            if *shutdown.borrow() {
                break;
            }
            let channel = self.broker.channel();
            let next = tokio::select! {
                _ = shutdown.changed() => break,
                next = channel.dequeue(self.dequeue_timeout) => next,
            };
            match next {
                Ok(Some(body)) => {
                    self.process(&body).await;
                }
                Ok(None) => (),
                Err(e) => {
                    log::warn!("Could not take from the fan-out queue: {}", e);
                    if let Err(e) = self.broker.recover(&channel).await {
                        log::error!("Fan-out is stalled: {}", e);
                    }
                }
            }
        }
        log::info!("Fan-out worker stopped");
    }

    /// Fan one queued publication out to its author's followers, returning how many
    /// feeds were updated.
    ///
    /// A failure for one follower is logged and does not stop the others.
    pub async fn process(&self, body: &str) -> usize {
        let publication = match Publication::from_snapshot(body) {
            Ok(publication) => publication,
            Err(e) => {
                log::warn!("Dropping a queued message that is not a publication: {}", e);
                return 0;
            }
        };
        let followers = match self.graph.followers_of(publication.author).await {
            Ok(followers) => followers,
            Err(e) => {
                log::error!(
                    "Could not look up the followers of {}; publication {} not fanned out: {}",
                    publication.author,
                    publication.id,
                    e
                );
                return 0;
            }
        };

        let channel = self.broker.channel();
        let mut updated = 0;
        for follower in followers.iter().copied() {
            match self.feeds.record(follower, body).await {
                Ok(()) => updated += 1,
                Err(e) => log::warn!(
                    "Could not add publication {} to the feed of {}: {}",
                    publication.id,
                    follower,
                    e
                ),
            }
            if let Err(e) = channel.publish(&broker::routing_key(follower), body).await {
                log::warn!(
                    "Could not push publication {} live to {}: {}",
                    publication.id,
                    follower,
                    e
                );
            }
        }
        log::debug!(
            "Publication {} fanned out to {} of {} followers",
            publication.id,
            updated,
            followers.len()
        );
        updated
    }
}
