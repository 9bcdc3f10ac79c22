use super::{RedisCmd, RedisConn, RedisConnErr, RedisParseOutput};
use crate::config;

use std::convert::TryFrom;

type Result<T> = std::result::Result<T, RedisConnErr>;

/// A dedicated connection in subscribe mode, listening to exactly one channel.
///
/// Redis forgets the subscription as soon as the connection closes, so dropping the
/// `RedisSubscriber` releases it on every exit path.
#[derive(Debug)]
pub struct RedisSubscriber {
    conn: RedisConn,
    channel: String,
}

impl RedisSubscriber {
    pub async fn subscribe(redis_cfg: &config::Redis, channel: String) -> Result<Self> {
        let mut conn = RedisConn::new(redis_cfg).await?;
        conn.write(RedisCmd::subscribe(&channel)).await?;
        // wait for the confirmation so that nothing published afterwards is missed
        loop {
            match RedisParseOutput::try_from(conn.read_reply().await?)? {
                RedisParseOutput::NonMsg => break,
                RedisParseOutput::Msg(msg) => log::debug!("Ignoring early message on {}", msg.channel),
            }
        }
        log::info!("Subscribed to {}", channel);
        Ok(Self { conn, channel })
    }

    /// Wait for the next message published to the channel and return its payload.
    pub async fn next_message(&mut self) -> Result<String> {
        loop {
            match RedisParseOutput::try_from(self.conn.read_reply().await?)? {
                RedisParseOutput::Msg(msg) if msg.channel == self.channel => return Ok(msg.payload),
                RedisParseOutput::Msg(other) => {
                    log::warn!("Message for {} arrived on {}", other.channel, self.channel)
                }
                RedisParseOutput::NonMsg => (),
            }
        }
    }
}
