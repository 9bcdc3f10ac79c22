mod err;
pub use err::RedisConnErr;

use super::{RedisCmd, RedisParseErr, RedisReply};
use crate::config;

use std::str;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time;

type Result<T> = std::result::Result<T, RedisConnErr>;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// One authenticated connection to Redis.
///
/// Commands and replies are strictly paired: every command written is followed by reading
/// its reply before the next command.  A connection whose command was interrupted (an
/// error, or a cancelled future) is left `dirty` and must be discarded, since its next
/// reply would belong to the old command.
#[derive(Debug)]
pub struct RedisConn {
    stream: TcpStream,
    addr: String,
    redis_input: Vec<u8>,
    dirty: bool,
}

impl RedisConn {
    pub async fn new(redis_cfg: &config::Redis) -> Result<Self> {
        let addr = redis_cfg.addr();
        let stream = time::timeout(CONNECT_TIMEOUT, TcpStream::connect(&addr))
            .await
            .map_err(|elapsed| RedisConnErr::with_addr(&addr, elapsed.into()))?
            .map_err(|e| RedisConnErr::with_addr(&addr, e))?;
        stream
            .set_nodelay(true)
            .map_err(|e| RedisConnErr::with_addr(&addr, e))?;

        let mut conn = Self {
            stream,
            addr,
            redis_input: Vec::with_capacity(4096),
            dirty: false,
        };
        if let Some(password) = &*redis_cfg.password {
            conn.auth_connection(password).await?;
        }
        conn.validate_connection().await?;
        if let Some(db) = &*redis_cfg.db {
            conn.send(RedisCmd::select(db)).await?;
        }
        log::debug!("Opened Redis connection to {}", conn.addr);
        Ok(conn)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Send one command and wait for its reply.  Error replies become `ServerErr`.
    pub async fn send(&mut self, cmd: RedisCmd) -> Result<RedisReply> {
        self.write(cmd).await?;
        let reply = self.read_reply().await?;
        self.dirty = false;
        match reply {
            RedisReply::Error(msg) => Err(RedisConnErr::ServerErr(msg)),
            reply => Ok(reply),
        }
    }

    /// Send several commands in one write, then read one reply per command.
    pub async fn pipeline(&mut self, cmds: Vec<RedisCmd>) -> Result<Vec<RedisReply>> {
        let n = cmds.len();
        let sendable: Vec<u8> = cmds.into_iter().flat_map(RedisCmd::into_sendable).collect();
        self.dirty = true;
        self.stream.write_all(&sendable).await?;

        let mut replies = Vec::with_capacity(n);
        for _ in 0..n {
            replies.push(self.read_reply().await?);
        }
        self.dirty = false;
        if let Some(RedisReply::Error(msg)) = replies.iter().find(|r| matches!(r, RedisReply::Error(_))) {
            return Err(RedisConnErr::ServerErr(msg.clone()));
        }
        Ok(replies)
    }

    pub(super) async fn write(&mut self, cmd: RedisCmd) -> Result<()> {
        log::trace!("Sending {} to Redis", cmd.name());
        self.dirty = true;
        self.stream.write_all(&cmd.into_sendable()).await?;
        Ok(())
    }

    /// Read until one complete reply is buffered, and return it.  Bytes after the reply
    /// (e.g. the next pushed message) stay buffered for the next call.
    pub(super) async fn read_reply(&mut self) -> Result<RedisReply> {
        let mut buffer = [0_u8; 4096];
        loop {
            if !self.redis_input.is_empty() {
                let parsed = valid_utf8_prefix(&self.redis_input).and_then(|input| {
                    RedisReply::parse(input).map(|(reply, leftover)| (reply, input.len() - leftover.len()))
                });
                match parsed {
                    Ok((reply, consumed)) => {
                        self.redis_input.drain(..consumed);
                        return Ok(reply);
                    }
                    Err(RedisParseErr::Incomplete) => (),
                    Err(other) => {
                        self.redis_input.clear();
                        self.dirty = true;
                        return Err(other.into());
                    }
                }
            }

            let n = self.stream.read(&mut buffer).await?;
            if n == 0 {
                self.dirty = true;
                return Err(RedisConnErr::Closed(self.addr.clone()));
            }
            self.redis_input.extend_from_slice(&buffer[..n]);
        }
    }

    async fn auth_connection(&mut self, pass: &str) -> Result<()> {
        match self.send(RedisCmd::auth(pass)).await {
            Ok(RedisReply::Status(ok)) if ok == "OK" => Ok(()),
            Ok(other) => Err(RedisConnErr::InvalidRedisReply(format!("{:?}", other))),
            Err(RedisConnErr::ServerErr(_)) => Err(RedisConnErr::IncorrectPassword),
            Err(RedisConnErr::ParseErr(RedisParseErr::InvalidLineStart(_))) => {
                Err(RedisConnErr::NotRedis(self.addr.clone()))
            }
            Err(e) => Err(e),
        }
    }

    async fn validate_connection(&mut self) -> Result<()> {
        match self.send(RedisCmd::ping()).await {
            Ok(RedisReply::Status(pong)) if pong == "PONG" => Ok(()),
            Ok(other) => Err(RedisConnErr::InvalidRedisReply(format!("{:?}", other))),
            Err(RedisConnErr::ServerErr(msg)) if msg.starts_with("NOAUTH") => {
                Err(RedisConnErr::MissingPassword)
            }
            Err(RedisConnErr::ParseErr(RedisParseErr::InvalidLineStart(_))) => {
                Err(RedisConnErr::NotRedis(self.addr.clone()))
            }
            Err(e) => Err(e),
        }
    }
}

/// The longest prefix of `input` that is valid UTF-8; a multi-byte character split across
/// two reads stays buffered until the rest of it arrives.  Bytes that can never become
/// valid UTF-8 are an error.
fn valid_utf8_prefix(input: &[u8]) -> std::result::Result<&str, RedisParseErr> {
    match str::from_utf8(input) {
        Ok(valid) => Ok(valid),
        Err(e) if e.error_len().is_some() => Err(RedisParseErr::InvalidUtf8),
        Err(e) => Ok(str::from_utf8(&input[..e.valid_up_to()]).unwrap_or_default()),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use tokio::net::TcpListener;

    #[test]
    fn split_multibyte_char_is_held_back() {
        let bytes = "$2\r\n\u{e9}\r\n".as_bytes();
        let split = &bytes[..5];
        assert_eq!(valid_utf8_prefix(split), Ok("$2\r\n"));
        assert_eq!(valid_utf8_prefix(bytes), Ok("$2\r\n\u{e9}\r\n"));
    }

    #[test]
    fn bytes_that_are_never_utf8_are_rejected() {
        assert_eq!(
            valid_utf8_prefix(b"$2\r\n\xff\xfe\r\n"),
            Err(RedisParseErr::InvalidUtf8)
        );
    }

    #[tokio::test]
    async fn invalid_utf8_reply_fails_instead_of_waiting() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?.to_string();
        tokio::spawn(async move {
            if let Ok((mut socket, _)) = listener.accept().await {
                let _ = socket.write_all(b"$2\r\n\xff\xfe\r\n").await;
                let mut rest = [0_u8; 64];
                let _ = socket.read(&mut rest).await;
            }
        });

        let mut conn = RedisConn {
            stream: TcpStream::connect(&addr).await?,
            addr,
            redis_input: Vec::new(),
            dirty: false,
        };
        let reply = time::timeout(Duration::from_secs(1), conn.read_reply()).await?;
        assert!(matches!(
            reply,
            Err(RedisConnErr::ParseErr(RedisParseErr::InvalidUtf8))
        ));
        assert!(conn.is_dirty());
        Ok(())
    }
}
