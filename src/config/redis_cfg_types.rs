use crate::from_env_var;

from_env_var!(
    /// The host address where Redis is running
    let name = RedisHost;
    let default: String = "127.0.0.1".to_string();
    let (env_var, allowed_values) = ("REDIS_HOST", "a valid address (e.g., 127.0.0.1)");
    let from_str = |s| match s {
        "localhost" => Some("127.0.0.1".to_string()),
        _ => Some(s.to_string()),
    };
);
from_env_var!(
    /// The port Redis is running on
    let name = RedisPort;
    let default: u16 = 6379;
    let (env_var, allowed_values) = ("REDIS_PORT", "a number between 0 and 65535");
    let from_str = |s| s.parse().ok();
);
from_env_var!(
    /// The password to use for Redis
    let name = RedisPass;
    let default: Option<String> = None;
    let (env_var, allowed_values) = ("REDIS_PASSWORD", "any string");
    let from_str = |s| Some(Some(s.to_string()));
);
from_env_var!(
    /// An optional Redis namespace, prepended to every key and channel
    let name = RedisNamespace;
    let default: Option<String> = None;
    let (env_var, allowed_values) = ("REDIS_NAMESPACE", "any string");
    let from_str = |s| Some(Some(s.to_string()));
);
from_env_var!(
    /// A user for Redis (not supported)
    let name = RedisUser;
    let default: Option<String> = None;
    let (env_var, allowed_values) = ("REDIS_USER", "any string");
    let from_str = |s| Some(Some(s.to_string()));
);
from_env_var!(
    /// The database to select after connecting
    let name = RedisDb;
    let default: Option<String> = None;
    let (env_var, allowed_values) = ("REDIS_DB", "a database number");
    let from_str = |s| s.parse::<u16>().ok().map(|_| Some(s.to_string()));
);
