use crate::broker::BrokerErr;
use crate::cache::CacheErr;
use crate::fanout::FanoutErr;
use crate::store::StoreErr;

use std::fmt;
use warp::http::StatusCode;

/// Why a request failed, after it was parsed
#[derive(Debug)]
pub enum ApiErr {
    Validation(String),
    Store(StoreErr),
    Cache(CacheErr),
    Broker(BrokerErr),
    Encode(serde_json::Error),
}

impl ApiErr {
    pub fn status(&self) -> StatusCode {
        use ApiErr::*;
        match self {
            Validation(_) => StatusCode::BAD_REQUEST,
            Store(_) | Encode(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Cache(_) | Broker(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl warp::reject::Reject for ApiErr {}
impl std::error::Error for ApiErr {}

impl fmt::Display for ApiErr {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        use ApiErr::*;
        match self {
            Validation(msg) => write!(f, "{}", msg),
            Store(e) => write!(f, "{}", e),
            Cache(e) => write!(f, "{}", e),
            Broker(e) => write!(f, "{}", e),
            Encode(e) => write!(f, "{}", e),
        }
    }
}

impl From<FanoutErr> for ApiErr {
    fn from(e: FanoutErr) -> Self {
        match e {
            FanoutErr::Store(e) => Self::Store(e),
            FanoutErr::Cache(e) => Self::Cache(e),
            FanoutErr::Broker(e) => Self::Broker(e),
            FanoutErr::Encode(e) => Self::Encode(e),
        }
    }
}
impl From<StoreErr> for ApiErr {
    fn from(e: StoreErr) -> Self {
        Self::Store(e)
    }
}
impl From<CacheErr> for ApiErr {
    fn from(e: CacheErr) -> Self {
        Self::Cache(e)
    }
}
impl From<BrokerErr> for ApiErr {
    fn from(e: BrokerErr) -> Self {
        Self::Broker(e)
    }
}
