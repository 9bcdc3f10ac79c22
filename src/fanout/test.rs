use super::*;
use crate::broker::{self, BrokerErr, MemoryConnector, Supervisor};
use crate::cache::{self, CacheBackend, CacheErr, FeedCache, FollowGraph, MemoryCache};
use crate::config;
use crate::model::{Follower, Id, NewPublication, Publication};
use crate::store::{MemoryStore, StoreErr};

use async_trait::async_trait;
use hashbrown::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

type TestResult = std::result::Result<(), Box<dyn std::error::Error>>;

const SHORT: Duration = Duration::from_millis(20);

/// A cache whose writes to one key always fail
struct FailingKey {
    inner: MemoryCache,
    key: &'static str,
}

impl FailingKey {
    fn check(&self, key: &str) -> cache::Result<()> {
        match key == self.key {
            true => Err(CacheErr::Unavailable),
            false => Ok(()),
        }
    }
}

#[async_trait]
impl CacheBackend for FailingKey {
    async fn push(&self, key: &str, value: &str) -> cache::Result<()> {
        self.check(key)?;
        self.inner.push(key, value).await
    }
    async fn trim(&self, key: &str, max_len: usize) -> cache::Result<()> {
        self.check(key)?;
        self.inner.trim(key, max_len).await
    }
    async fn push_bounded(&self, key: &str, value: &str, max_len: usize) -> cache::Result<()> {
        self.check(key)?;
        self.inner.push_bounded(key, value, max_len).await
    }
    async fn range(&self, key: &str, max_len: usize) -> cache::Result<Vec<String>> {
        self.inner.range(key, max_len).await
    }
    async fn remove(&self, key: &str, value: &str) -> cache::Result<u64> {
        self.check(key)?;
        self.inner.remove(key, value).await
    }
    async fn set_add(&self, key: &str, member: &str) -> cache::Result<()> {
        self.inner.set_add(key, member).await
    }
    async fn set_remove(&self, key: &str, member: &str) -> cache::Result<()> {
        self.inner.set_remove(key, member).await
    }
    async fn set_members(&self, key: &str) -> cache::Result<Vec<String>> {
        self.inner.set_members(key).await
    }
}

struct Harness {
    store: Arc<MemoryStore>,
    connector: Arc<MemoryConnector>,
    broker: Arc<Supervisor>,
    feeds: FeedCache,
    graph: FollowGraph,
}

impl Harness {
    async fn new() -> std::result::Result<Self, BrokerErr> {
        Self::with_cache(Arc::new(MemoryCache::new())).await
    }

    async fn with_cache(backend: Arc<dyn CacheBackend>) -> std::result::Result<Self, BrokerErr> {
        let connector = Arc::new(MemoryConnector::new());
        let broker = Supervisor::open(connector.clone(), &feed_cfg()).await?;
        Ok(Self {
            store: Arc::new(MemoryStore::new()),
            connector,
            broker: Arc::new(broker),
            feeds: FeedCache::new(backend.clone(), 1000),
            graph: FollowGraph::new(backend),
        })
    }

    fn ingest(&self) -> Ingest {
        Ingest::new(self.store.clone(), self.broker.clone())
    }

    fn follows(&self) -> FollowEdges {
        FollowEdges::new(self.store.clone(), self.graph.clone(), self.feeds.clone())
    }

    fn worker(&self) -> Worker {
        Worker::new(self.broker.clone(), self.feeds.clone(), self.graph.clone(), SHORT)
    }

    async fn publish(&self, author: i64, text: &str) -> Result<Publication> {
        self.ingest()
            .add_publication(NewPublication {
                author: Id(author),
                text: text.to_string(),
            })
            .await
    }

    /// Pop and process everything queued so far
    async fn drain(&self) -> std::result::Result<usize, BrokerErr> {
        let worker = self.worker();
        let mut processed = 0;
        while let Some(body) = self.broker.channel().dequeue(SHORT).await? {
            worker.process(&body).await;
            processed += 1;
        }
        Ok(processed)
    }
}

fn feed_cfg() -> config::Feed {
    let mut env = HashMap::new();
    env.insert("BROKER_RETRY_DELAY".to_string(), "1".to_string());
    match config::from_env(env) {
        Ok((_, _, feed_cfg, _)) => feed_cfg,
        Err(e) => panic!("{}", e),
    }
}

fn edge(user_id: i64, follower_id: i64) -> Follower {
    Follower {
        user_id: Id(user_id),
        follower_id: Id(follower_id),
    }
}

#[tokio::test]
async fn ingest_stores_then_queues_the_snapshot() -> TestResult {
    let harness = Harness::new().await?;
    let publication = harness.publish(1, "hi").await?;

    assert!(publication.id > Id(0));
    assert_eq!(harness.store.publications(), vec![publication.clone()]);
    assert_eq!(harness.connector.queued(), vec![publication.to_snapshot()?]);
    Ok(())
}

#[tokio::test]
async fn ingest_timestamp_survives_the_store_round_trip() -> TestResult {
    let harness = Harness::new().await?;
    let publication = harness.publish(1, "hi").await?;
    assert_eq!(publication.at.timestamp_subsec_nanos() % 1000, 0);
    Ok(())
}

#[tokio::test]
async fn failed_store_write_queues_nothing() -> TestResult {
    let harness = Harness::new().await?;
    harness.store.set_unavailable(true);

    let res = harness.publish(1, "hi").await;
    assert!(matches!(res, Err(FanoutErr::Store(StoreErr::Unavailable))));
    assert!(harness.connector.queued().is_empty());
    Ok(())
}

#[tokio::test]
async fn failed_enqueue_leaves_the_publication_stored() -> TestResult {
    let harness = Harness::new().await?;
    harness.connector.close_all();

    let res = harness.publish(1, "orphan").await;
    assert!(matches!(res, Err(FanoutErr::Broker(BrokerErr::Closed))));
    assert_eq!(harness.store.publications().len(), 1);
    assert!(harness.connector.queued().is_empty());
    Ok(())
}

#[tokio::test]
async fn worker_updates_every_follower_and_pushes_live() -> TestResult {
    let harness = Harness::new().await?;
    let follows = harness.follows();
    follows.add(edge(1, 2)).await?;
    follows.add(edge(1, 3)).await?;
    let mut live = harness
        .broker
        .channel()
        .subscribe(&broker::routing_key(Id(2)))
        .await?;

    let publication = harness.publish(1, "hi").await?;
    assert_eq!(harness.drain().await?, 1);

    assert_eq!(harness.feeds.get_feed(Id(2)).await?, vec![publication.clone()]);
    assert_eq!(harness.feeds.get_feed(Id(3)).await?, vec![publication.clone()]);
    assert!(harness.feeds.get_feed(Id(1)).await?.is_empty());
    assert_eq!(Publication::from_snapshot(&live.next().await?)?, publication);
    Ok(())
}

#[tokio::test]
async fn one_failing_follower_does_not_stop_the_rest() -> TestResult {
    let backend = Arc::new(FailingKey {
        inner: MemoryCache::new(),
        key: "2",
    });
    let harness = Harness::with_cache(backend).await?;
    let follows = harness.follows();
    for follower in 2..=4 {
        follows.add(edge(1, follower)).await?;
    }

    let publication = harness.publish(1, "hi").await?;
    let body = publication.to_snapshot()?;
    let worker = harness.worker();
    assert_eq!(worker.process(&body).await, 2);
    assert_eq!(harness.feeds.get_feed(Id(3)).await?.len(), 1);
    assert_eq!(harness.feeds.get_feed(Id(4)).await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn worker_skips_messages_that_are_not_publications() -> TestResult {
    let harness = Harness::new().await?;
    harness.follows().add(edge(1, 2)).await?;
    assert_eq!(harness.worker().process("{\"not\":\"a publication\"}").await, 0);
    assert!(harness.feeds.get_feed(Id(2)).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn feeds_follow_the_processing_order() -> TestResult {
    let harness = Harness::new().await?;
    let follows = harness.follows();
    follows.add(edge(1, 2)).await?;
    follows.add(edge(3, 2)).await?;

    let first = harness.publish(1, "one").await?;
    let second = harness.publish(3, "two").await?;
    let third = harness.publish(3, "three").await?;
    harness.drain().await?;

    assert_eq!(harness.feeds.get_feed(Id(2)).await?, vec![third, second, first]);
    Ok(())
}

#[tokio::test]
async fn unfollow_removes_the_authors_entries() -> TestResult {
    let harness = Harness::new().await?;
    let follows = harness.follows();
    assert!(follows.add(edge(1, 2)).await?);
    assert!(!follows.add(edge(1, 2)).await?);
    follows.add(edge(3, 2)).await?;

    harness.publish(1, "one").await?;
    let kept = harness.publish(3, "two").await?;
    harness.publish(1, "three").await?;
    harness.drain().await?;
    assert_eq!(harness.feeds.get_feed(Id(2)).await?.len(), 3);

    assert!(follows.remove(edge(1, 2)).await?);
    assert_eq!(harness.feeds.get_feed(Id(2)).await?, vec![kept]);
    assert_eq!(harness.graph.followers_of(Id(1)).await?, vec![]);
    assert!(!follows.remove(edge(1, 2)).await?);
    Ok(())
}

#[tokio::test]
async fn run_drains_the_queue_and_stops_on_shutdown() -> TestResult {
    let harness = Harness::new().await?;
    harness.follows().add(edge(1, 2)).await?;
    let (stop, shutdown) = watch::channel(false);
    let worker = tokio::spawn(harness.worker().run(shutdown));

    for n in 0..3 {
        harness.publish(1, &n.to_string()).await?;
    }
    for _ in 0..100 {
        if harness.feeds.get_feed(Id(2)).await?.len() == 3 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(harness.feeds.get_feed(Id(2)).await?.len(), 3);

    stop.send_replace(true);
    tokio::time::timeout(Duration::from_secs(1), worker).await??;
    Ok(())
}

#[tokio::test]
async fn run_resumes_on_a_replacement_channel() -> TestResult {
    let harness = Harness::new().await?;
    harness.follows().add(edge(1, 2)).await?;
    let (stop, shutdown) = watch::channel(false);
    let worker = tokio::spawn(harness.worker().run(shutdown));

    harness.connector.close_all();
    for _ in 0..100 {
        if harness.connector.opened() == 2 && harness.broker.channel().is_open() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    let publication = harness.publish(1, "after the outage").await?;
    for _ in 0..100 {
        if !harness.feeds.get_feed(Id(2)).await?.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(harness.feeds.get_feed(Id(2)).await?, vec![publication]);

    stop.send_replace(true);
    tokio::time::timeout(Duration::from_secs(1), worker).await??;
    Ok(())
}
