//! The durable store: the source of truth for users, follow edges and publications.
//!
//! Everything else in the service (feeds, follower sets) is a derived, loosely consistent
//! copy of what is committed here.
mod err;
mod memory;
mod postgres;

pub use self::err::StoreErr;
pub use self::memory::MemoryStore;
pub use self::postgres::PgStore;

use crate::model::{Follower, Id, Publication};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub type Result<T> = std::result::Result<T, StoreErr>;

#[async_trait]
pub trait Store: Send + Sync {
    /// Insert a user and return the generated id
    async fn add_user(&self, login: &str) -> Result<Id>;

    /// Insert a follow edge; returns the number of rows affected (0 if it already existed)
    async fn add_follower(&self, edge: Follower) -> Result<u64>;

    /// Delete a follow edge; returns the number of rows affected
    async fn remove_follower(&self, edge: Follower) -> Result<u64>;

    /// Insert a publication in one transaction and return it with its generated id
    async fn add_publication(&self, author: Id, text: &str, at: DateTime<Utc>)
        -> Result<Publication>;
}
