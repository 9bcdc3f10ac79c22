use crate::redis::{RedisConnErr, RedisParseErr};
use std::fmt;

#[derive(Debug)]
pub enum CacheErr {
    Redis(RedisConnErr),
    UnexpectedReply(RedisParseErr),
    Decode(serde_json::Error),
    Unavailable,
}

impl std::error::Error for CacheErr {}

impl fmt::Display for CacheErr {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        use CacheErr::*;
        match self {
            Redis(inner) => write!(f, "{}", inner),
            UnexpectedReply(inner) => write!(f, "unexpected reply from the cache: {}", inner),
            Decode(inner) => write!(f, "could not decode a cached feed entry: {}", inner),
            Unavailable => write!(f, "the cache is unavailable"),
        }
    }
}

impl From<RedisConnErr> for CacheErr {
    fn from(e: RedisConnErr) -> Self {
        Self::Redis(e)
    }
}
impl From<RedisParseErr> for CacheErr {
    fn from(e: RedisParseErr) -> Self {
        Self::UnexpectedReply(e)
    }
}
impl From<serde_json::Error> for CacheErr {
    fn from(e: serde_json::Error) -> Self {
        Self::Decode(e)
    }
}
