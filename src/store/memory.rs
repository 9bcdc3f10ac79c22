use super::{Result, StoreErr};
use super::Store;
use crate::model::{Follower, Id, Publication, User};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hashbrown::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// An in-process stand-in for the durable store, for tests and local runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    unavailable: AtomicBool,
}

#[derive(Debug, Default)]
struct Tables {
    users: Vec<User>,
    followers: HashSet<Follower>,
    publications: Vec<Publication>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every write fail with `StoreErr::Unavailable` until switched back
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn publications(&self) -> Vec<Publication> {
        self.lock().publications.clone()
    }

    pub fn followers(&self) -> HashSet<Follower> {
        self.lock().followers.clone()
    }

    fn lock(&self) -> MutexGuard<Tables> {
        self.tables.lock().unwrap_or_else(Self::recover)
    }

    fn writable(&self) -> Result<MutexGuard<Tables>> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreErr::Unavailable);
        }
        Ok(self.lock())
    }

    fn recover(poisoned: PoisonError<MutexGuard<Tables>>) -> MutexGuard<Tables> {
        log::error!("{}", &poisoned);
        poisoned.into_inner()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn add_user(&self, login: &str) -> Result<Id> {
        let mut tables = self.writable()?;
        let id = Id(tables.users.len() as i64 + 1);
        tables.users.push(User {
            id,
            login: login.to_string(),
        });
        Ok(id)
    }

    async fn add_follower(&self, edge: Follower) -> Result<u64> {
        Ok(self.writable()?.followers.insert(edge) as u64)
    }

    async fn remove_follower(&self, edge: Follower) -> Result<u64> {
        Ok(self.writable()?.followers.remove(&edge) as u64)
    }

    async fn add_publication(&self, author: Id, text: &str, at: DateTime<Utc>) -> Result<Publication> {
        let mut tables = self.writable()?;
        let publication = Publication {
            id: Id(tables.publications.len() as i64 + 1),
            author,
            text: text.to_string(),
            at,
        };
        tables.publications.push(publication.clone());
        Ok(publication)
    }
}
