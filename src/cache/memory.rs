use super::{CacheBackend, CacheErr, Result};

use async_trait::async_trait;
use hashbrown::{HashMap, HashSet};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct Keys {
    lists: HashMap<String, VecDeque<String>>,
    sets: HashMap<String, HashSet<String>>,
}

/// An in-process cache backend for tests and local development
#[derive(Debug, Default)]
pub struct MemoryCache {
    keys: Mutex<Keys>,
    unavailable: AtomicBool,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent operation fail with `CacheErr::Unavailable`
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn keys(&self) -> Result<MutexGuard<Keys>> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(CacheErr::Unavailable);
        }
        Ok(self.keys.lock().unwrap_or_else(Self::recover))
    }

    fn recover(poisoned: PoisonError<MutexGuard<Keys>>) -> MutexGuard<Keys> {
        log::error!("A thread panicked while holding the cache lock; continuing with its data");
        poisoned.into_inner()
    }
}

#[async_trait]
impl CacheBackend for MemoryCache {
    async fn push(&self, key: &str, value: &str) -> Result<()> {
        let mut keys = self.keys()?;
        keys.lists
            .entry(key.to_string())
            .or_default()
            .push_front(value.to_string());
        Ok(())
    }

    async fn trim(&self, key: &str, max_len: usize) -> Result<()> {
        let mut keys = self.keys()?;
        if let Some(list) = keys.lists.get_mut(key) {
            list.truncate(max_len);
            if list.is_empty() {
                keys.lists.remove(key);
            }
        }
        Ok(())
    }

    async fn push_bounded(&self, key: &str, value: &str, max_len: usize) -> Result<()> {
        let mut keys = self.keys()?;
        let list = keys.lists.entry(key.to_string()).or_default();
        list.push_front(value.to_string());
        list.truncate(max_len);
        Ok(())
    }

    async fn range(&self, key: &str, max_len: usize) -> Result<Vec<String>> {
        let keys = self.keys()?;
        Ok(keys
            .lists
            .get(key)
            .map(|list| list.iter().take(max_len).cloned().collect())
            .unwrap_or_default())
    }

    async fn remove(&self, key: &str, value: &str) -> Result<u64> {
        let mut keys = self.keys()?;
        let removed = match keys.lists.get_mut(key) {
            Some(list) => {
                let before = list.len();
                list.retain(|entry| entry != value);
                (before - list.len()) as u64
            }
            None => 0,
        };
        Ok(removed)
    }

    async fn set_add(&self, key: &str, member: &str) -> Result<()> {
        let mut keys = self.keys()?;
        keys.sets
            .entry(key.to_string())
            .or_default()
            .insert(member.to_string());
        Ok(())
    }

    async fn set_remove(&self, key: &str, member: &str) -> Result<()> {
        let mut keys = self.keys()?;
        if let Some(set) = keys.sets.get_mut(key) {
            set.remove(member);
        }
        Ok(())
    }

    async fn set_members(&self, key: &str) -> Result<Vec<String>> {
        let keys = self.keys()?;
        Ok(keys
            .sets
            .get(key)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default())
    }
}
