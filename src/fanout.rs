//! The write side of the feed: ingesting publications, fanning them out to followers,
//! and keeping the follower mirror (and the feeds derived from it) in step with follow
//! edges.
mod err;
mod follows;
mod ingest;
mod worker;

pub use err::FanoutErr;
pub use follows::FollowEdges;
pub use ingest::Ingest;
pub use worker::Worker;

pub type Result<T> = std::result::Result<T, FanoutErr>;

#[cfg(test)]
mod test;
