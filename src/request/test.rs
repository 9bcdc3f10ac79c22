use super::*;
use crate::broker::{BrokerErr, MemoryConnector};
use crate::cache::MemoryCache;
use crate::store::MemoryStore;

use hashbrown::HashMap;
use serde_json::{json, Value};

struct Backends {
    store: Arc<MemoryStore>,
    cache: Arc<MemoryCache>,
    handler: Handler,
}

async fn backends() -> Backends {
    let (_, _, feed_cfg, _) = match config::from_env(HashMap::new()) {
        Ok(cfg) => cfg,
        Err(e) => panic!("{}", e),
    };
    let store = Arc::new(MemoryStore::new());
    let cache = Arc::new(MemoryCache::new());
    let broker = match Supervisor::open(Arc::new(MemoryConnector::new()), &feed_cfg).await {
        Ok(broker) => Arc::new(broker),
        Err(e) => panic!("{}", e),
    };
    let handler = Handler::new(
        store.clone(),
        cache.clone(),
        broker,
        &feed_cfg,
        Duration::from_secs(30),
    );
    Backends {
        store,
        cache,
        handler,
    }
}

fn error_of(body: &[u8]) -> Option<String> {
    let body: Value = serde_json::from_slice(body).ok()?;
    body["error"].as_str().map(str::to_string)
}

#[tokio::test]
async fn registering_returns_the_new_id() {
    let api = backends().await.handler.routes(warp::cors());
    let res = warp::test::request()
        .method("POST")
        .path("/user")
        .json(&json!({"login": "ann"}))
        .reply(&api)
        .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    assert_eq!(res.body(), "1");
}

#[tokio::test]
async fn empty_login_is_a_bad_request() {
    let backends = backends().await;
    let api = backends.handler.routes(warp::cors());
    let res = warp::test::request()
        .method("POST")
        .path("/user")
        .json(&json!({"login": "  "}))
        .reply(&api)
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(error_of(res.body()).is_some());
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let api = backends().await.handler.routes(warp::cors());
    let res = warp::test::request()
        .method("POST")
        .path("/follower")
        .header("content-type", "application/json")
        .body(r#"{"userId": "one"}"#)
        .reply(&api)
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn oversized_body_is_refused() {
    let api = backends().await.handler.routes(warp::cors());
    let text = "x".repeat(MAX_BODY_BYTES as usize);
    let res = warp::test::request()
        .method("POST")
        .path("/publication")
        .json(&json!({"author": 1, "text": text}))
        .reply(&api)
        .await;
    assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let api = backends().await.handler.routes(warp::cors());
    let res = warp::test::request().path("/nowhere/at/all").reply(&api).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn wrong_method_is_not_allowed() {
    let api = backends().await.handler.routes(warp::cors());
    let res = warp::test::request()
        .method("GET")
        .path("/publication")
        .reply(&api)
        .await;
    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn store_failure_is_a_server_error_without_an_id() {
    let backends = backends().await;
    backends.store.set_unavailable(true);
    let api = backends.handler.routes(warp::cors());
    let res = warp::test::request()
        .method("POST")
        .path("/publication")
        .json(&json!({"author": 1, "text": "lost"}))
        .reply(&api)
        .await;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(error_of(res.body()).is_some());
}

#[tokio::test]
async fn unreachable_cache_fails_the_feed_read() {
    let backends = backends().await;
    backends.cache.set_unavailable(true);
    let api = backends.handler.routes(warp::cors());
    let res = warp::test::request().path("/feed/1").reply(&api).await;
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn empty_feed_is_an_empty_list() {
    let api = backends().await.handler.routes(warp::cors());
    let res = warp::test::request().path("/feed/42").reply(&api).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.body(), "[]");
}

#[tokio::test]
async fn health_check() {
    let api = backends().await.handler.routes(warp::cors());
    let res = warp::test::request().path("/health").reply(&api).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.body(), "OK");
}

#[test]
fn api_errors_map_to_statuses() {
    assert_eq!(
        ApiErr::Validation(String::new()).status(),
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        ApiErr::Store(crate::store::StoreErr::Unavailable).status(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
    assert_eq!(
        ApiErr::Cache(crate::cache::CacheErr::Unavailable).status(),
        StatusCode::SERVICE_UNAVAILABLE
    );
    assert_eq!(
        ApiErr::Broker(BrokerErr::Closed).status(),
        StatusCode::SERVICE_UNAVAILABLE
    );
}
