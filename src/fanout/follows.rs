use super::Result;
use crate::cache::{FeedCache, FollowGraph};
use crate::model::Follower;
use crate::store::Store;

use std::sync::Arc;

/// Follow and unfollow: written to the store first, then mirrored into the follow graph.
#[derive(Clone)]
pub struct FollowEdges {
    store: Arc<dyn Store>,
    graph: FollowGraph,
    feeds: FeedCache,
}

impl FollowEdges {
    pub fn new(store: Arc<dyn Store>, graph: FollowGraph, feeds: FeedCache) -> Self {
        Self { store, graph, feeds }
    }

    /// `true` if the edge is new.  The mirror is updated either way.
    pub async fn add(&self, edge: Follower) -> Result<bool> {
        let added = self.store.add_follower(edge).await? == 1;
        self.graph.add(edge).await?;
        log::debug!("{} follows {} (new: {})", edge.follower_id, edge.user_id, added);
        Ok(added)
    }

    /// `true` if the edge existed.  Afterwards the follower's feed holds nothing by the
    /// user they stopped following, barring a fan-out that was already underway.
    pub async fn remove(&self, edge: Follower) -> Result<bool> {
        let removed = self.store.remove_follower(edge).await? == 1;
        self.graph.remove(edge).await?;
        let evicted = self
            .feeds
            .invalidate_author(edge.follower_id, edge.user_id)
            .await?;
        log::debug!(
            "{} unfollowed {}; {} feed entries removed",
            edge.follower_id,
            edge.user_id,
            evicted
        );
        Ok(removed)
    }
}
