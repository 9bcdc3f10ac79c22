use super::{feed_cfg_types::*, EnvVar};
use crate::err::FatalErr;
use std::time::Duration;

/// Longest pause between two broker setup attempts
const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Default)]
pub struct Feed {
    pub max_size: FeedMaxSize,
    pub queue: FanoutQueue,
    pub exchange: LiveExchange,
    pub retry_limit: BrokerRetryLimit,
    pub retry_delay: BrokerRetryDelay,
    pub dequeue_timeout: DequeueTimeout,
}

impl Feed {
    pub(crate) fn from_env(env: &EnvVar) -> Result<Self, FatalErr> {
        let cfg = Self {
            max_size: FeedMaxSize::default().maybe_update(env.get("FEED_MAX_SIZE"))?,
            queue: FanoutQueue::default().maybe_update(env.get("FANOUT_QUEUE"))?,
            exchange: LiveExchange::default().maybe_update(env.get("LIVE_EXCHANGE"))?,
            retry_limit: BrokerRetryLimit::default().maybe_update(env.get("BROKER_RETRY_LIMIT"))?,
            retry_delay: BrokerRetryDelay::default().maybe_update(env.get("BROKER_RETRY_DELAY"))?,
            dequeue_timeout: DequeueTimeout::default().maybe_update(env.get("DEQUEUE_TIMEOUT"))?,
        };
        log::info!("Feed configuration:\n{:#?}", &cfg);
        Ok(cfg)
    }

    /// The backoff before retry number `attempt` (starting at 1)
    pub fn retry_delay_for(&self, attempt: u32) -> Duration {
        let factor = 2_u32.saturating_pow(attempt.saturating_sub(1));
        self.retry_delay
            .checked_mul(factor)
            .map_or(MAX_RETRY_DELAY, |delay| delay.min(MAX_RETRY_DELAY))
    }
}
