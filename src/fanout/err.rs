use crate::broker::BrokerErr;
use crate::cache::CacheErr;
use crate::store::StoreErr;
use std::fmt;

#[derive(Debug)]
pub enum FanoutErr {
    Store(StoreErr),
    Cache(CacheErr),
    Broker(BrokerErr),
    Encode(serde_json::Error),
}

impl std::error::Error for FanoutErr {}

impl fmt::Display for FanoutErr {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        use FanoutErr::*;
        match self {
            Store(e) => write!(f, "{}", e),
            Cache(e) => write!(f, "{}", e),
            Broker(e) => write!(f, "{}", e),
            Encode(e) => write!(f, "could not encode the publication: {}", e),
        }
    }
}

impl From<StoreErr> for FanoutErr {
    fn from(e: StoreErr) -> Self {
        Self::Store(e)
    }
}
impl From<CacheErr> for FanoutErr {
    fn from(e: CacheErr) -> Self {
        Self::Cache(e)
    }
}
impl From<BrokerErr> for FanoutErr {
    fn from(e: BrokerErr) -> Self {
        Self::Broker(e)
    }
}
impl From<serde_json::Error> for FanoutErr {
    fn from(e: serde_json::Error) -> Self {
        Self::Encode(e)
    }
}
