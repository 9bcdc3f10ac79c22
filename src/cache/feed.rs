use super::{CacheBackend, Result};
use crate::model::{Id, Publication};

use std::sync::Arc;

/// Each viewer's feed: the snapshots of their followees' publications, newest first,
/// never longer than `max_size`.
#[derive(Clone)]
pub struct FeedCache {
    backend: Arc<dyn CacheBackend>,
    max_size: usize,
}

impl FeedCache {
    pub fn new(backend: Arc<dyn CacheBackend>, max_size: usize) -> Self {
        Self { backend, max_size }
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    fn key(viewer: Id) -> String {
        viewer.to_string()
    }

    /// The viewer's feed, newest first.  A viewer with no feed gets an empty one.
    pub async fn get_feed(&self, viewer: Id) -> Result<Vec<Publication>> {
        let entries = self.backend.range(&Self::key(viewer), self.max_size).await?;
        entries
            .iter()
            .map(|entry| Ok(Publication::from_snapshot(entry)?))
            .collect()
    }

    pub async fn push_entry(&self, viewer: Id, snapshot: &str) -> Result<()> {
        self.backend.push(&Self::key(viewer), snapshot).await
    }

    pub async fn trim_to_bound(&self, viewer: Id) -> Result<()> {
        self.backend.trim(&Self::key(viewer), self.max_size).await
    }

    /// Prepend a snapshot and evict whatever falls beyond the bound, as one update
    pub async fn record(&self, viewer: Id, snapshot: &str) -> Result<()> {
        self.backend
            .push_bounded(&Self::key(viewer), snapshot, self.max_size)
            .await
    }

    /// Remove every entry `author` published from the viewer's feed.
    ///
    /// Entries that no longer decode are left alone.  If a removal fails partway, the
    /// entries already removed stay removed.
    pub async fn invalidate_author(&self, viewer: Id, author: Id) -> Result<u64> {
        let key = Self::key(viewer);
        let mut removed = 0;
        for entry in self.backend.range(&key, self.max_size).await? {
            match Publication::from_snapshot(&entry) {
                Ok(publication) if publication.author == author => {
                    removed += self.backend.remove(&key, &entry).await?;
                }
                Ok(_) => (),
                Err(e) => log::warn!("Skipping undecodable entry in feed {}: {}", viewer, e),
            }
        }
        log::debug!("Removed {} entries by {} from feed {}", removed, author, viewer);
        Ok(removed)
    }
}
