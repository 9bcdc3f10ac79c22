use crate::from_env_var;
use std::net::{IpAddr, Ipv4Addr};
use std::{fmt, str::FromStr, time::Duration};
use strum::VariantNames;
use strum_macros::{EnumString, EnumVariantNames};

from_env_var!(
    /// The current environment, which controls what file to read other ENV vars from
    let name = Env;
    let default: EnvInner = EnvInner::Development;
    let (env_var, allowed_values) = ("RUST_ENV", format!("one of: {:?}", EnvInner::VARIANTS));
    let from_str = |s| EnvInner::from_str(s).ok();
);
from_env_var!(
    /// The address to run the feed service on
    let name = BindAddr;
    let default: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);
    let (env_var, allowed_values) = ("BIND", "a valid address (e.g., 127.0.0.1)");
    let from_str = |s| match s {
        "localhost" => Some(IpAddr::V4(Ipv4Addr::LOCALHOST)),
        _ => s.parse().ok(),
    };
);
from_env_var!(
    /// The port to run the feed service on
    let name = Port;
    let default: u16 = 1234;
    let (env_var, allowed_values) = ("PORT", "a number between 0 and 65535");
    let from_str = |s| s.parse().ok();
);
from_env_var!(
    /// The time between keep-alive pings sent to live WebSocket connections
    let name = WsPingFreq;
    let default: Duration = Duration::from_secs(30);
    let (env_var, allowed_values) = ("WS_PING_FREQ", "a number of milliseconds greater than 0");
    let from_str = |s| s.parse().ok().filter(|n| *n > 0).map(Duration::from_millis);
);

#[derive(EnumString, EnumVariantNames, Debug, Clone, Copy, PartialEq, Eq)]
#[strum(serialize_all = "snake_case")]
pub enum EnvInner {
    Production,
    Development,
}

/// Permissions for Cross Origin Resource Sharing (CORS)
pub struct Cors<'a> {
    pub allowed_headers: Vec<&'a str>,
    pub allowed_methods: Vec<&'a str>,
}
impl fmt::Debug for Cors<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "allowed headers: {:?}\n      allowed methods: {:?}",
            self.allowed_headers, self.allowed_methods
        )
    }
}
impl std::default::Default for Cors<'_> {
    fn default() -> Self {
        Self {
            allowed_methods: vec!["GET", "POST", "OPTIONS"],
            allowed_headers: vec!["Authorization", "Accept", "Content-Type", "Cache-Control"],
        }
    }
}
