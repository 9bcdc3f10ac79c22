use crate::broker::BrokerErr;
use crate::redis::RedisConnErr;
use crate::store::StoreErr;
use std::fmt;

/// Errors that stop the service from starting (or keep it from continuing).
pub enum FatalErr {
    Bind(warp::Error),
    Broker(BrokerErr),
    Dotenv(dotenv::Error),
    Logger(log::SetLoggerError),
    Postgres(StoreErr),
    Redis(RedisConnErr),
    StdIo(std::io::Error),
    // config errs
    UrlParse(url::ParseError),
    UrlEncoding(std::string::FromUtf8Error),
    ConfigErr(String),
}

impl FatalErr {
    pub fn config(var: impl fmt::Display, value: impl fmt::Display, allowed_vals: impl fmt::Display) -> Self {
        Self::ConfigErr(format!(
            "{0} is set to `{1}`, which is invalid.\n{3:7}{0} must be {2}.",
            var, value, allowed_vals, ""
        ))
    }
}

impl std::error::Error for FatalErr {}
impl fmt::Debug for FatalErr {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        write!(f, "{}", self)
    }
}

impl fmt::Display for FatalErr {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        use FatalErr::*;
        write!(
            f,
            "{}",
            match self {
                Bind(e) => format!("could not bind the server address.\n{:7}{}", "", e),
                Broker(e) => format!("could not set up the message broker.\n{:7}{}", "", e),
                Dotenv(e) => format!("could not read the `.env` file.\n{:7}{}", "", e),
                Logger(e) => format!("{}", e),
                StdIo(e) => format!("{}", e),
                Postgres(e) => format!("could not connect to Postgres.\n{:7}{}", "", e),
                Redis(e) => format!("could not connect to Redis.\n{:7}{}", "", e),
                ConfigErr(e) => e.to_string(),
                UrlParse(e) => format!("could not parse a connection URL.\n{:7}{}", "", e),
                UrlEncoding(e) => format!("could not decode a connection URL.\n{:7}{}", "", e),
            }
        )
    }
}

impl From<warp::Error> for FatalErr {
    fn from(e: warp::Error) -> Self {
        Self::Bind(e)
    }
}
impl From<BrokerErr> for FatalErr {
    fn from(e: BrokerErr) -> Self {
        Self::Broker(e)
    }
}
impl From<StoreErr> for FatalErr {
    fn from(e: StoreErr) -> Self {
        Self::Postgres(e)
    }
}
impl From<RedisConnErr> for FatalErr {
    fn from(e: RedisConnErr) -> Self {
        Self::Redis(e)
    }
}
impl From<std::string::FromUtf8Error> for FatalErr {
    fn from(e: std::string::FromUtf8Error) -> Self {
        Self::UrlEncoding(e)
    }
}
impl From<url::ParseError> for FatalErr {
    fn from(e: url::ParseError) -> Self {
        Self::UrlParse(e)
    }
}
impl From<std::io::Error> for FatalErr {
    fn from(e: std::io::Error) -> Self {
        Self::StdIo(e)
    }
}
impl From<log::SetLoggerError> for FatalErr {
    fn from(e: log::SetLoggerError) -> Self {
        Self::Logger(e)
    }
}
