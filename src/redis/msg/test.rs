use super::*;

type TestResult = Result<(), RedisParseErr>;

#[test]
fn parse_status_and_error_lines() -> TestResult {
    let (reply, rest) = RedisReply::parse("+OK\r\n-ERR wrong type\r\n")?;
    assert_eq!(reply, Status("OK".to_string()));
    let (reply, rest) = RedisReply::parse(rest)?;
    assert_eq!(reply, Error("ERR wrong type".to_string()));
    assert!(rest.is_empty());
    Ok(())
}

#[test]
fn parse_negative_and_positive_integers() -> TestResult {
    assert_eq!(RedisReply::parse(":1001\r\n")?, (Integer(1001), ""));
    assert_eq!(RedisReply::parse(":-2\r\n")?, (Integer(-2), ""));
    Ok(())
}

#[test]
fn parse_nil_bulk_and_nil_array() -> TestResult {
    assert_eq!(RedisReply::parse("$-1\r\n")?, (Bulk(None), ""));
    assert_eq!(RedisReply::parse("*-1\r\n")?, (Array(None), ""));
    Ok(())
}

#[test]
fn parse_lrange_reply() -> TestResult {
    let input = "*2\r\n$5\r\nfirst\r\n$6\r\nsecond\r\n";
    let (reply, rest) = RedisReply::parse(input)?;
    assert!(rest.is_empty());
    assert_eq!(reply.into_strings()?, vec!["first", "second"]);
    Ok(())
}

#[test]
fn parse_exec_reply_with_nested_values() -> TestResult {
    let input = "*2\r\n:3\r\n+OK\r\n";
    let (reply, _) = RedisReply::parse(input)?;
    assert_eq!(
        reply,
        Array(Some(vec![Integer(3), Status("OK".to_string())]))
    );
    Ok(())
}

#[test]
fn parse_leaves_following_replies_unconsumed() -> TestResult {
    let (reply, rest) = RedisReply::parse(":1\r\n$3\r\nabc\r\n")?;
    assert_eq!(reply, Integer(1));
    assert_eq!(rest, "$3\r\nabc\r\n");
    Ok(())
}

#[test]
fn partial_input_is_incomplete() {
    for partial in &["*2\r\n$5\r\nfirst\r\n$6\r\nsec", "$5\r\nfir", ":12", "+OK\r", "*"] {
        assert_eq!(RedisReply::parse(partial), Err(Incomplete), "{:?}", partial);
    }
}

#[test]
fn parse_redis_detects_non_newline() {
    let input = "*3QQ$7\r\nmessage\r\n$12\r\ntimeline:308\r\n";
    assert!(matches!(RedisReply::parse(input), Err(InvalidLineEnd)));
}

#[test]
fn parse_redis_detects_invalid_line_start() {
    let input = "HTTP/1.1 400 Bad Request\r\n";
    assert_eq!(
        RedisReply::parse(input),
        Err(InvalidLineStart("H".to_string()))
    );
}

#[test]
fn parse_redis_subscribe() -> TestResult {
    let input = "*3\r\n$9\r\nsubscribe\r\n$19\r\nFeedExchange:user.4\r\n:1\r\n";
    let (reply, rest) = RedisReply::parse(input)?;
    assert!(rest.is_empty());
    assert_eq!(RedisParseOutput::try_from(reply)?, RedisParseOutput::NonMsg);
    Ok(())
}

#[test]
fn parse_redis_msg() -> TestResult {
    let payload = r#"{"id":7,"author":3,"text":"hi","at":"2022-05-01T12:30:00Z"}"#;
    let input = format!(
        "*3\r\n$7\r\nmessage\r\n$19\r\nFeedExchange:user.4\r\n${}\r\n{}\r\n",
        payload.len(),
        payload
    );
    let (reply, rest) = RedisReply::parse(&input)?;
    assert!(rest.is_empty());

    match RedisParseOutput::try_from(reply)? {
        RedisParseOutput::Msg(msg) => {
            assert_eq!(msg.channel, "FeedExchange:user.4");
            assert_eq!(msg.payload, payload);
        }
        RedisParseOutput::NonMsg => panic!("parsed a msg as a non-msg"),
    }
    Ok(())
}

#[test]
fn parse_multibyte_bulk_string() -> TestResult {
    let input = "$7\r\nh\u{e9}ll\u{f6}\r\n";
    assert_eq!(
        RedisReply::parse(input)?,
        (Bulk(Some("h\u{e9}ll\u{f6}".to_string())), "")
    );
    Ok(())
}
