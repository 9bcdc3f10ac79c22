//! Parse client requests and hand them to the feed
mod err;
mod query;

pub use err::ApiErr;

use self::query::Remove;
use crate::broker::{self, Supervisor};
use crate::cache::{CacheBackend, FeedCache, FollowGraph};
use crate::config;
use crate::fanout::{FollowEdges, Ingest};
use crate::model::{Follower, Id, NewPublication, NewUser};
use crate::response;
use crate::store::Store;

use serde::de::DeserializeOwned;
use std::{convert::Infallible, sync::Arc, time::Duration};
use warp::filters::BoxedFilter;
use warp::http::StatusCode;
use warp::reply::{self, Reply, Response};
use warp::{reject, Filter, Rejection};

#[cfg(test)]
mod test;

/// Largest JSON body accepted by the write endpoints
const MAX_BODY_BYTES: u64 = 16 * 1024;

/// Helper macro to match on the first of any of the provided filters
macro_rules! any_of {
    ($filter:expr, $($other_filter:expr),*) => {
        $filter$(.or($other_filter).unify())*.boxed()
    };
}

#[derive(Clone)]
pub struct Handler {
    store: Arc<dyn Store>,
    ingest: Ingest,
    follows: FollowEdges,
    feeds: FeedCache,
    broker: Arc<Supervisor>,
    ws_ping_freq: Duration,
}

impl Handler {
    pub fn new(
        store: Arc<dyn Store>,
        cache: Arc<dyn CacheBackend>,
        broker: Arc<Supervisor>,
        feed_cfg: &config::Feed,
        ws_ping_freq: Duration,
    ) -> Self {
        let feeds = FeedCache::new(cache.clone(), *feed_cfg.max_size);
        let graph = FollowGraph::new(cache);
        Self {
            ingest: Ingest::new(store.clone(), broker.clone()),
            follows: FollowEdges::new(store.clone(), graph, feeds.clone()),
            store,
            feeds,
            broker,
            ws_ping_freq,
        }
    }

    /// Every endpoint, with CORS applied and rejections turned into responses
    pub fn routes(
        &self,
        cors: warp::cors::Builder,
    ) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
        any_of!(
            self.add_user(),
            self.follower(),
            self.add_publication(),
            self.feed(),
            self.live(),
            self.health()
        )
        .with(cors)
        .recover(Self::err)
    }

    /// `POST /user {login}`
    pub fn add_user(&self) -> BoxedFilter<(Response,)> {
        let handler = self.clone();
        warp::path!("user")
            .and(warp::post())
            .and(json_body())
            .and_then(move |new: NewUser| {
                let handler = handler.clone();
                async move { handler.create_user(new).await.map_err(reject::custom) }
            })
            .boxed()
    }

    /// `POST /follower {userId, followerId}`, or with `?remove=true` to unfollow
    pub fn follower(&self) -> BoxedFilter<(Response,)> {
        let handler = self.clone();
        warp::path!("follower")
            .and(warp::post())
            .and(Remove::to_filter())
            .and(json_body())
            .and_then(move |remove: Remove, edge: Follower| {
                let handler = handler.clone();
                async move {
                    handler
                        .update_follower(edge, remove.is_truthy())
                        .await
                        .map_err(reject::custom)
                }
            })
            .boxed()
    }

    /// `POST /publication {author, text}`
    pub fn add_publication(&self) -> BoxedFilter<(Response,)> {
        let ingest = self.ingest.clone();
        warp::path!("publication")
            .and(warp::post())
            .and(json_body())
            .and_then(move |new: NewPublication| {
                let ingest = ingest.clone();
                async move {
                    let publication = ingest
                        .add_publication(new)
                        .await
                        .map_err(|e| reject::custom(ApiErr::from(e)))?;
                    Ok::<_, Rejection>(created(&publication))
                }
            })
            .boxed()
    }

    /// `GET /feed/:viewerId`
    pub fn feed(&self) -> BoxedFilter<(Response,)> {
        let feeds = self.feeds.clone();
        warp::path!("feed" / Id)
            .and(warp::get())
            .and_then(move |viewer: Id| {
                let feeds = feeds.clone();
                async move {
                    let feed = feeds
                        .get_feed(viewer)
                        .await
                        .map_err(|e| reject::custom(ApiErr::from(e)))?;
                    Ok::<_, Rejection>(reply::json(&feed).into_response())
                }
            })
            .boxed()
    }

    /// `GET /:viewerId/ws`: a WebSocket that receives the viewer's new feed entries
    pub fn live(&self) -> BoxedFilter<(Response,)> {
        let handler = self.clone();
        warp::path!(Id / "ws")
            .and(warp::get())
            .and(warp::ws())
            .and_then(move |viewer: Id, ws: warp::ws::Ws| {
                let handler = handler.clone();
                async move { handler.open_live(viewer, ws).await.map_err(reject::custom) }
            })
            .boxed()
    }

    pub fn health(&self) -> BoxedFilter<(Response,)> {
        warp::path!("health")
            .and(warp::get())
            .map(|| "OK".into_response())
            .boxed()
    }

    async fn create_user(self, new: NewUser) -> Result<Response, ApiErr> {
        let login = new.login.trim();
        if login.is_empty() {
            return Err(ApiErr::Validation("`login` must not be empty".to_string()));
        }
        let id = self.store.add_user(login).await?;
        log::info!("Registered user {} as {}", login, id);
        Ok(created(&id))
    }

    async fn update_follower(self, edge: Follower, remove: bool) -> Result<Response, ApiErr> {
        let changed = match remove {
            true => self.follows.remove(edge).await?,
            false => self.follows.add(edge).await?,
        };
        Ok(created(&changed))
    }

    async fn open_live(self, viewer: Id, ws: warp::ws::Ws) -> Result<Response, ApiErr> {
        // subscribe before upgrading, so a failure can still be answered with a status
        let subscription = self.broker.subscribe(&broker::routing_key(viewer)).await?;
        log::info!("Incoming websocket request for {}", viewer);
        let live = response::Ws::new(subscription, self.broker.clone(), self.ws_ping_freq);
        Ok(ws.on_upgrade(move |socket| live.send_to(socket)).into_response())
    }

    /// Turn a rejection into the response the client sees
    pub async fn err(rejection: Rejection) -> Result<Response, Infallible> {
        let (status, msg) = if let Some(e) = rejection.find::<ApiErr>() {
            let status = e.status();
            match status.is_server_error() {
                true => log::error!("Request failed: {}", e),
                false => log::info!("Rejected request: {}", e),
            }
            (status, e.to_string())
        } else if rejection.is_not_found() {
            (StatusCode::NOT_FOUND, "not found".to_string())
        } else if let Some(e) = rejection.find::<warp::filters::body::BodyDeserializeError>() {
            (StatusCode::BAD_REQUEST, e.to_string())
        } else if let Some(e) = rejection.find::<reject::MethodNotAllowed>() {
            (StatusCode::METHOD_NOT_ALLOWED, e.to_string())
        } else if let Some(e) = rejection.find::<reject::PayloadTooLarge>() {
            (StatusCode::PAYLOAD_TOO_LARGE, e.to_string())
        } else if let Some(e) = rejection.find::<reject::LengthRequired>() {
            (StatusCode::LENGTH_REQUIRED, e.to_string())
        } else if let Some(e) = rejection.find::<reject::UnsupportedMediaType>() {
            (StatusCode::UNSUPPORTED_MEDIA_TYPE, e.to_string())
        } else {
            log::debug!("Unhandled rejection: {:?}", rejection);
            (StatusCode::BAD_REQUEST, "bad request".to_string())
        };
        let body = reply::json(&serde_json::json!({ "error": msg }));
        Ok(reply::with_status(body, status).into_response())
    }
}

fn json_body<T: DeserializeOwned + Send>() -> impl Filter<Extract = (T,), Error = Rejection> + Clone {
    warp::body::content_length_limit(MAX_BODY_BYTES).and(warp::body::json())
}

/// A `201 Created` response with `body` as JSON
fn created<T: serde::Serialize>(body: &T) -> Response {
    reply::with_status(reply::json(body), StatusCode::CREATED).into_response()
}
