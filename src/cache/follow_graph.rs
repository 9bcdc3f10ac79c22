use super::{CacheBackend, Result};
use crate::model::{Follower, Id};

use std::sync::Arc;

/// Mirror of the durable follow edges, indexed by the followed user.
#[derive(Clone)]
pub struct FollowGraph {
    backend: Arc<dyn CacheBackend>,
}

impl FollowGraph {
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self { backend }
    }

    fn key(followed: Id) -> String {
        format!("{}followedBy", followed)
    }

    pub async fn add(&self, edge: Follower) -> Result<()> {
        self.backend
            .set_add(&Self::key(edge.user_id), &edge.follower_id.to_string())
            .await
    }

    pub async fn remove(&self, edge: Follower) -> Result<()> {
        self.backend
            .set_remove(&Self::key(edge.user_id), &edge.follower_id.to_string())
            .await
    }

    /// Everyone following `author`, in no particular order
    pub async fn followers_of(&self, author: Id) -> Result<Vec<Id>> {
        let members = self.backend.set_members(&Self::key(author)).await?;
        Ok(members
            .iter()
            .filter_map(|member| match member.parse() {
                Ok(id) => Some(id),
                Err(_) => {
                    log::warn!("Ignoring non-numeric follower `{}` of {}", member, author);
                    None
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::cache::MemoryCache;

    fn edge(user_id: i64, follower_id: i64) -> Follower {
        Follower {
            user_id: Id(user_id),
            follower_id: Id(follower_id),
        }
    }

    #[tokio::test]
    async fn tracks_followers_per_author() -> Result<()> {
        let graph = FollowGraph::new(Arc::new(MemoryCache::new()));
        graph.add(edge(1, 2)).await?;
        graph.add(edge(1, 3)).await?;
        graph.add(edge(1, 3)).await?;
        graph.add(edge(4, 2)).await?;

        let mut followers = graph.followers_of(Id(1)).await?;
        followers.sort();
        assert_eq!(followers, vec![Id(2), Id(3)]);

        graph.remove(edge(1, 2)).await?;
        assert_eq!(graph.followers_of(Id(1)).await?, vec![Id(3)]);
        assert!(graph.followers_of(Id(5)).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn follower_sets_do_not_share_keys_with_feeds() -> Result<()> {
        let backend = Arc::new(MemoryCache::new());
        let graph = FollowGraph::new(backend.clone());
        graph.add(edge(1, 2)).await?;
        assert!(backend.range("1", 10).await?.is_empty());
        assert_eq!(backend.set_members("1followedBy").await?, vec!["2"]);
        Ok(())
    }
}
