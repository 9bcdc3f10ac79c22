use crate::redis::RedisConnErr;
use std::fmt;

#[derive(Debug)]
pub enum BrokerErr {
    Redis(RedisConnErr),
    Closed,
    Topology(String),
    SetupExhausted { attempts: u32, last: Box<BrokerErr> },
}

impl std::error::Error for BrokerErr {}

impl fmt::Display for BrokerErr {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        use BrokerErr::*;
        match self {
            Redis(inner) => write!(f, "{}", inner),
            Closed => write!(f, "the broker channel is closed"),
            Topology(msg) => write!(f, "could not declare the broker topology: {}", msg),
            SetupExhausted { attempts, last } => write!(
                f,
                "gave up opening a broker channel after {} attempts.  Last error: {}",
                attempts, last
            ),
        }
    }
}

impl From<RedisConnErr> for BrokerErr {
    fn from(e: RedisConnErr) -> Self {
        Self::Redis(e)
    }
}
