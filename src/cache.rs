//! The derived read models: every viewer's bounded feed and every author's follower set.
//!
//! Both live in a shared key space; feeds are keyed by the viewer id itself and follower
//! sets by `<author id>followedBy`, so the two can never collide.
mod err;
mod feed;
mod follow_graph;
mod memory;
mod redis_backend;

pub use err::CacheErr;
pub use feed::FeedCache;
pub use follow_graph::FollowGraph;
pub use memory::MemoryCache;
pub use redis_backend::RedisCache;

use async_trait::async_trait;

pub type Result<T> = std::result::Result<T, CacheErr>;

/// The list and set operations the caches are built from.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Prepend `value` to the list at `key`
    async fn push(&self, key: &str, value: &str) -> Result<()>;

    /// Drop every element of the list beyond the first `max_len`
    async fn trim(&self, key: &str, max_len: usize) -> Result<()>;

    /// `push` followed by `trim`, applied as one update that readers never see half-done
    async fn push_bounded(&self, key: &str, value: &str, max_len: usize) -> Result<()>;

    /// Up to `max_len` elements from the head of the list; an absent list is empty
    async fn range(&self, key: &str, max_len: usize) -> Result<Vec<String>>;

    /// Remove every element equal to `value`, returning how many were removed
    async fn remove(&self, key: &str, value: &str) -> Result<u64>;

    async fn set_add(&self, key: &str, member: &str) -> Result<()>;
    async fn set_remove(&self, key: &str, member: &str) -> Result<()>;
    async fn set_members(&self, key: &str) -> Result<Vec<String>>;
}
