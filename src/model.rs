//! The entities the feed is built from: users, follow edges and publications.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, ops::Deref, str::FromStr};

/// A surrogate id generated by the durable store.
///
/// Ids are sent to clients as plain JSON numbers, and used as-is for the per-viewer
/// cache keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Id(pub i64);

impl Deref for Id {
    type Target = i64;
    fn deref(&self) -> &i64 {
        &self.0
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Id {
    type Err = std::num::ParseIntError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Id(s.parse()?))
    }
}

/// A registered user.  Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Id,
    pub login: String,
}

/// Registration request for a new user
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewUser {
    #[serde(alias = "name")]
    pub login: String,
}

/// A directed follow edge: `follower_id`'s feed includes `user_id`'s publications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Follower {
    pub user_id: Id,
    pub follower_id: Id,
}

/// A publication as submitted by its author, before it has an id or timestamp
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewPublication {
    pub author: Id,
    pub text: String,
}

/// An immutable publication.  The serialized form is also the feed entry
/// snapshot stored in every follower's feed and pushed to live viewers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Publication {
    pub id: Id,
    pub author: Id,
    pub text: String,
    pub at: DateTime<Utc>,
}

impl Publication {
    pub fn to_snapshot(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_snapshot(snapshot: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(snapshot)
    }
}
