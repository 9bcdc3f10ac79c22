//! Fan-out-on-write activity feed
//!
//!
//! Each user of a follow-graph social network gets a feed of the publications of the users
//! they follow, newest first.  Feeds are built when a publication is written, not when it is
//! read: the publication is copied into every follower's cached feed, and pushed live to
//! followers who have a WebSocket open.
//!
//! # Notes on data flow
//! * **Client Request → Warp**:
//! Warp filters for valid requests and parses request data (see [`request::Handler`]).
//! Users, follow edges and publications are committed to the durable [`store`] before
//! anything else happens.
//!
//! * **Ingest → Fan-out queue**:
//! Once a publication is committed, [`fanout::Ingest`] puts its snapshot on the broker's
//! fan-out queue and answers the client.  Nothing else happens on the request path.
//!
//! * **Fan-out queue → Worker**:
//! A single [`fanout::Worker`] takes publications off the queue one at a time, looks up the
//! author's followers in the [`cache::FollowGraph`] (never in the durable store) and, for
//! each follower, prepends the snapshot to their [`cache::FeedCache`] entry and publishes it
//! on the live exchange under the follower's routing key.
//!
//! * **Live exchange → WebSocket**:
//! Every open WebSocket holds its own [`broker::LiveSubscription`] to its viewer's routing
//! key and forwards whatever arrives on it, verbatim.  The subscription goes away with the
//! connection.
//!
//! The caches and the broker are derived, loosely consistent state: a crash between two
//! steps above loses work rather than corrupting the store.

pub mod broker;
pub mod cache;
pub mod config;
pub mod err;
pub mod fanout;
pub mod model;
pub mod redis;
pub mod request;
pub mod response;
pub mod store;
