//! Just enough of a Redis client for the feed caches, the fan-out queue and live
//! delivery.  Commands are written as raw RESP arrays and replies are parsed by hand; see
//! the [Redis protocol documentation](https://redis.io/topics/protocol).
mod cmd;
mod connection;
mod msg;
mod subscriber;

pub use cmd::RedisCmd;
pub use connection::{RedisConn, RedisConnErr};
pub use msg::{RedisMsg, RedisParseErr, RedisParseOutput, RedisReply};
pub use subscriber::RedisSubscriber;
