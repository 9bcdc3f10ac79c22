use criterion::black_box;
use criterion::criterion_group;
use criterion::criterion_main;
use criterion::Criterion;
use fanfeed::model::Publication;
use fanfeed::redis::{RedisParseOutput, RedisReply};
use std::convert::TryFrom;

const SNAPSHOT: &str =
    r#"{"id":102775370,"author":78,"text":"Trending tags: neverforget, 4styles, newpipe, uber and mercredifiction","at":"2019-09-11T18:42:19.123456Z"}"#;

fn bulk(s: &str) -> String {
    format!("${}\r\n{}\r\n", s.len(), s)
}

/// A live exchange message, as a subscriber connection receives it
fn pubsub_message() -> String {
    ["*3\r\n", &bulk("message"), &bulk("FeedExchange:user.1"), &bulk(SNAPSHOT)].concat()
}

/// A full feed, as `LRANGE` returns it
fn feed_range(entries: usize) -> String {
    let mut reply = format!("*{}\r\n", entries);
    for _ in 0..entries {
        reply.push_str(&bulk(SNAPSHOT));
    }
    reply
}

mod parse_inline {
    /// Best case: pull the payload out of a known message shape without a general parser
    pub fn payload(input: &str) -> &str {
        let mut fields = input.split("\r\n");
        fields.nth(6).unwrap_or_default()
    }
}

fn criterion_benchmark(c: &mut Criterion) {
    let message = pubsub_message();
    let mut group = c.benchmark_group("Parse redis RESP array");

    group.bench_function("extract a live payload inline", |b| {
        b.iter(|| black_box(parse_inline::payload(black_box(&message))).len())
    });
    group.bench_function("parse a live message", |b| {
        b.iter(|| {
            let (reply, _) = RedisReply::parse(black_box(&message)).expect("in bench");
            black_box(RedisParseOutput::try_from(reply).expect("in bench"))
        })
    });
    group.bench_function("parse and decode a live message", |b| {
        b.iter(|| {
            let (reply, _) = RedisReply::parse(black_box(&message)).expect("in bench");
            match RedisParseOutput::try_from(reply).expect("in bench") {
                RedisParseOutput::Msg(msg) => {
                    black_box(Publication::from_snapshot(&msg.payload).expect("in bench"));
                }
                RedisParseOutput::NonMsg => unreachable!(),
            }
        })
    });
    group.finish();

    let feed = feed_range(1000);
    let mut group = c.benchmark_group("Read a full feed");
    group.bench_function("parse a 1000 entry LRANGE reply", |b| {
        b.iter(|| {
            let (reply, _) = RedisReply::parse(black_box(&feed)).expect("in bench");
            black_box(reply.into_strings().expect("in bench"))
        })
    });
    group.bench_function("parse and decode a 1000 entry feed", |b| {
        b.iter(|| {
            let (reply, _) = RedisReply::parse(black_box(&feed)).expect("in bench");
            let entries = reply.into_strings().expect("in bench");
            black_box(
                entries
                    .iter()
                    .map(|entry| Publication::from_snapshot(entry))
                    .collect::<Result<Vec<_>, _>>()
                    .expect("in bench"),
            )
        })
    });
    group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
