use crate::from_env_var;
use std::time::Duration;

from_env_var!(
    /// The maximum number of entries kept in each viewer's cached feed
    let name = FeedMaxSize;
    let default: usize = 1000;
    let (env_var, allowed_values) = ("FEED_MAX_SIZE", "a number greater than 0");
    let from_str = |s| s.parse().ok().filter(|n| *n > 0);
);
from_env_var!(
    /// The name of the queue carrying new publications to the fan-out worker
    let name = FanoutQueue;
    let default: String = "publications".to_string();
    let (env_var, allowed_values) = ("FANOUT_QUEUE", "a non-empty string");
    let from_str = |s| Some(s.to_string());
);
from_env_var!(
    /// The name of the exchange live viewers subscribe to
    let name = LiveExchange;
    let default: String = "FeedExchange".to_string();
    let (env_var, allowed_values) = ("LIVE_EXCHANGE", "a non-empty string");
    let from_str = |s| Some(s.to_string());
);
from_env_var!(
    /// How many times opening a broker channel is attempted before giving up
    let name = BrokerRetryLimit;
    let default: u32 = 10;
    let (env_var, allowed_values) = ("BROKER_RETRY_LIMIT", "a number greater than 0");
    let from_str = |s| s.parse().ok().filter(|n| *n > 0);
);
from_env_var!(
    /// The delay before the first retry; doubled after every failed attempt
    let name = BrokerRetryDelay;
    let default: Duration = Duration::from_millis(500);
    let (env_var, allowed_values) = ("BROKER_RETRY_DELAY", "a number of milliseconds");
    let from_str = |s| s.parse().map(Duration::from_millis).ok();
);
from_env_var!(
    /// How long one dequeue blocks before the worker re-checks for shutdown
    let name = DequeueTimeout;
    let default: Duration = Duration::from_secs(1);
    let (env_var, allowed_values) = ("DEQUEUE_TIMEOUT", "a number of seconds greater than 0");
    let from_str = |s| s.parse().ok().filter(|n| *n > 0).map(Duration::from_secs);
);
