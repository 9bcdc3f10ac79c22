//! Methods for parsing input in the subset of the Redis Serialization Protocol we use.
//!
//! Replies are simple strings, errors, integers, bulk strings or (possibly nested) arrays
//! of those.  Messages pushed to a subscribed connection are always arrays of three bulk
//! strings.  A raw pushed message might look like this (with line breaks added between
//! fields):
//!
//! ```text
//! *3\r\n
//! $7\r\n
//! message\r\n
//! $19\r\n
//! FeedExchange:user.4\r\n
//! $62\r\n{"id":7,"author":3,"text":"hi","at":"2022-05-01T12:30:00Z"}\r\n
//! ```
//!
//! Read that as: an array with three elements: the first element is a bulk string with
//! seven characters, the second is a bulk string with nineteen characters, and the third
//! is a bulk string with 62 characters.

mod err;
pub use err::RedisParseErr;

use std::convert::TryFrom;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedisReply {
    Status(String),
    Error(String),
    Integer(i64),
    /// `None` is the nil bulk string (`$-1`)
    Bulk(Option<String>),
    /// `None` is the nil array (`*-1`), e.g. a `BRPOP` that timed out
    Array(Option<Vec<RedisReply>>),
}

use RedisParseErr::*;
use RedisReply::*;
type RedisParser<Item> = Result<Item, RedisParseErr>;

impl RedisReply {
    /// Parse one reply from the start of `input`, returning it with the unparsed remainder.
    pub fn parse(input: &str) -> RedisParser<(RedisReply, &str)> {
        utf8_to_redis_data(input)
    }

    pub fn into_integer(self) -> Result<i64, RedisParseErr> {
        match self {
            Integer(n) => Ok(n),
            _ => Err(IncorrectRedisType),
        }
    }

    /// The elements of an array of bulk strings (`LRANGE`, `SMEMBERS`); nil is empty
    pub fn into_strings(self) -> Result<Vec<String>, RedisParseErr> {
        match self {
            Array(None) => Ok(Vec::new()),
            Array(Some(elements)) => elements.into_iter().map(String::try_from).collect(),
            _ => Err(IncorrectRedisType),
        }
    }
}

fn utf8_to_redis_data(s: &str) -> RedisParser<(RedisReply, &str)> {
    if s.len() < 3 {
        Err(Incomplete)?
    };
    let (first_char, s) = s.split_at(1);
    match first_char {
        "+" => parse_redis_line(s).map(|(line, rest)| (Status(line.to_string()), rest)),
        "-" => parse_redis_line(s).map(|(line, rest)| (Error(line.to_string()), rest)),
        ":" => parse_redis_int(s),
        "$" => parse_redis_bulk_string(s),
        "*" => parse_redis_array(s),
        e => Err(InvalidLineStart(e.to_string())),
    }
}

fn after_newline_at(s: &str, start: usize) -> RedisParser<&str> {
    let s = s.get(start..).ok_or(Incomplete)?;
    if s.len() < "\r\n".len() {
        return Err(Incomplete);
    }
    if !s.starts_with("\r\n") {
        return Err(InvalidLineEnd);
    }
    Ok(&s["\r\n".len()..])
}

fn parse_number_at(s: &str) -> RedisParser<(i64, &str)> {
    let sign_len = if s.starts_with('-') { 1 } else { 0 };
    let len = sign_len
        + s[sign_len..]
            .find(|c: char| !c.is_ascii_digit())
            .ok_or(Incomplete)?;
    Ok((s[..len].parse()?, after_newline_at(s, len)?))
}

/// Simple strings and errors are a single line: `+[TEXT]\r\n` / `-[TEXT]\r\n`
fn parse_redis_line(s: &str) -> RedisParser<(&str, &str)> {
    let len = s.find("\r\n").ok_or(Incomplete)?;
    Ok((&s[..len], &s[len + "\r\n".len()..]))
}

fn parse_redis_int(s: &str) -> RedisParser<(RedisReply, &str)> {
    let (number, rest) = parse_number_at(s)?;
    Ok((Integer(number), rest))
}

/// Parse a Redis bulk string and return the content of that string and the unparsed remainder.
///
/// All bulk strings have the format `$[LENGTH_OF_ITEM_BODY]\r\n[ITEM_BODY]\r\n`, except
/// the nil bulk string `$-1\r\n`
fn parse_redis_bulk_string(s: &str) -> RedisParser<(RedisReply, &str)> {
    let (len, rest) = parse_number_at(s)?;
    if len < 0 {
        return Ok((Bulk(None), rest));
    }
    let len = len as usize;
    let content = rest.get(..len).ok_or(Incomplete)?;
    Ok((Bulk(Some(content.to_string())), after_newline_at(rest, len)?))
}

fn parse_redis_array(s: &str) -> RedisParser<(RedisReply, &str)> {
    let (number_of_elements, mut rest) = parse_number_at(s)?;
    if number_of_elements < 0 {
        return Ok((Array(None), rest));
    }

    let mut inner = Vec::with_capacity(number_of_elements as usize);
    for _ in 0..number_of_elements {
        let (next_el, new_rest) = utf8_to_redis_data(rest)?;
        rest = new_rest;
        inner.push(next_el);
    }
    Ok((Array(Some(inner)), rest))
}

impl TryFrom<RedisReply> for String {
    type Error = RedisParseErr;

    fn try_from(val: RedisReply) -> Result<Self, Self::Error> {
        match val {
            Bulk(Some(inner)) | Status(inner) => Ok(inner),
            _ => Err(IncorrectRedisType),
        }
    }
}

/// What arrives on a connection in subscribe mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedisParseOutput {
    Msg(RedisMsg),
    NonMsg,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedisMsg {
    pub channel: String,
    pub payload: String,
}

impl TryFrom<RedisReply> for RedisParseOutput {
    type Error = RedisParseErr;

    fn try_from(reply: RedisReply) -> Result<RedisParseOutput, Self::Error> {
        if let Array(Some(elements)) = reply {
            let mut elements = elements.into_iter();
            let kind = String::try_from(elements.next().ok_or(MissingField)?)?;
            match kind.as_str() {
                // subscription statuses look like:
                // $19\r\nFeedExchange:user.4\r\n
                // :1\r\n
                "subscribe" | "unsubscribe" => Ok(RedisParseOutput::NonMsg),
                // Messages look like:
                // $19\r\nFeedExchange:user.4\r\n
                // $62\r\n{"id":7,"author":3,...}\r\n
                "message" => Ok(RedisParseOutput::Msg(RedisMsg {
                    channel: String::try_from(elements.next().ok_or(MissingField)?)?,
                    payload: String::try_from(elements.next().ok_or(MissingField)?)?,
                })),
                _other => Err(IncorrectRedisType),
            }
        } else {
            Err(IncorrectRedisType)
        }
    }
}

#[cfg(test)]
mod test;
