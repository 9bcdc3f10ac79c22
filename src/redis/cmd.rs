//! Build raw RESP commands to send to the Redis server
use std::fmt::Display;

/// A command encoded as a RESP array of bulk strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedisCmd {
    args: Vec<String>,
}

impl RedisCmd {
    pub fn new(command: impl Display) -> Self {
        Self {
            args: vec![command.to_string()],
        }
    }

    pub fn arg(mut self, arg: impl Display) -> Self {
        self.args.push(arg.to_string());
        self
    }

    pub fn name(&self) -> &str {
        &self.args[0]
    }

    /// Encode as `*[NUMBER_OF_ARGS]\r\n` followed by one `$[LENGTH]\r\n[ARG]\r\n` per arg
    pub fn into_sendable(self) -> Vec<u8> {
        let mut sendable = ["*", &self.args.len().to_string(), "\r\n"].concat().into_bytes();
        for arg in self.args {
            sendable.extend_from_slice(["$", &arg.len().to_string(), "\r\n"].concat().as_bytes());
            sendable.extend_from_slice(arg.as_bytes());
            sendable.extend_from_slice(b"\r\n");
        }
        sendable
    }

    pub fn ping() -> Self {
        Self::new("PING")
    }
    pub fn auth(password: &str) -> Self {
        Self::new("AUTH").arg(password)
    }
    pub fn select(db: &str) -> Self {
        Self::new("SELECT").arg(db)
    }
    pub fn type_of(key: &str) -> Self {
        Self::new("TYPE").arg(key)
    }
    pub fn multi() -> Self {
        Self::new("MULTI")
    }
    pub fn exec() -> Self {
        Self::new("EXEC")
    }

    // lists
    pub fn lpush(key: &str, value: &str) -> Self {
        Self::new("LPUSH").arg(key).arg(value)
    }
    pub fn ltrim(key: &str, start: i64, stop: i64) -> Self {
        Self::new("LTRIM").arg(key).arg(start).arg(stop)
    }
    pub fn lrange(key: &str, start: i64, stop: i64) -> Self {
        Self::new("LRANGE").arg(key).arg(start).arg(stop)
    }
    pub fn lrem(key: &str, count: i64, value: &str) -> Self {
        Self::new("LREM").arg(key).arg(count).arg(value)
    }
    /// Blocking pop from the tail of a list, giving up after `timeout_secs`
    pub fn brpop(key: &str, timeout_secs: u64) -> Self {
        Self::new("BRPOP").arg(key).arg(timeout_secs)
    }

    // sets
    pub fn sadd(key: &str, member: &str) -> Self {
        Self::new("SADD").arg(key).arg(member)
    }
    pub fn srem(key: &str, member: &str) -> Self {
        Self::new("SREM").arg(key).arg(member)
    }
    pub fn smembers(key: &str) -> Self {
        Self::new("SMEMBERS").arg(key)
    }

    // pub/sub
    pub fn publish(channel: &str, message: &str) -> Self {
        Self::new("PUBLISH").arg(channel).arg(message)
    }
    pub fn subscribe(channel: &str) -> Self {
        Self::new("SUBSCRIBE").arg(channel)
    }
}
