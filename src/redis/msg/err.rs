use std::{error::Error, fmt};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedisParseErr {
    Incomplete,
    InvalidNumber(std::num::ParseIntError),
    InvalidLineStart(String),
    InvalidLineEnd,
    IncorrectRedisType,
    MissingField,
    InvalidUtf8,
}

impl fmt::Display for RedisParseErr {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        use RedisParseErr::*;
        write!(
            f,
            "{}",
            match self {
                Incomplete => "The input from Redis does not form a complete reply.".to_string(),
                InvalidNumber(parse_int_err) => format!(
                    "Redis indicated that an item would be a number, but it could not be parsed: {}",
                    parse_int_err
                ),
                InvalidLineStart(line_start_char) => format!(
                    "A line from Redis started with `{}`, which is not a valid Redis type.",
                    line_start_char
                ),
                InvalidLineEnd => "A Redis line ended before expected line length".to_string(),
                IncorrectRedisType => "Received a Redis type that is not supported here.".to_string(),
                MissingField => "Redis input was missing a field required here.".to_string(),
                InvalidUtf8 => "Redis sent a value that is not valid UTF-8.".to_string(),
            }
        )
    }
}

impl Error for RedisParseErr {}

impl From<std::num::ParseIntError> for RedisParseErr {
    fn from(error: std::num::ParseIntError) -> Self {
        Self::InvalidNumber(error)
    }
}
