use fanfeed::broker::{RedisConnector, Supervisor};
use fanfeed::cache::{CacheBackend, FeedCache, FollowGraph, RedisCache};
use fanfeed::config;
use fanfeed::err::FatalErr;
use fanfeed::fanout::Worker;
use fanfeed::request::Handler;
use fanfeed::store::{PgStore, Store};

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::watch;

fn main() -> Result<(), FatalErr> {
    config::merge_dotenv()?;
    let mut logger = pretty_env_logger::formatted_builder();
    match std::env::var("RUST_LOG") {
        Ok(filters) => logger.parse_filters(&filters),
        Err(_) => logger.filter_level(log::LevelFilter::Warn),
    };
    logger.try_init()?;
    let (postgres_cfg, redis_cfg, feed_cfg, cfg) = config::from_env(dotenv::vars().collect())?;

    // the Postgres client blocks, so it is set up before the runtime exists
    let store = PgStore::new(&postgres_cfg)?;
    store.migrate()?;

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(serve(Arc::new(store), redis_cfg, feed_cfg, cfg))
}

async fn serve(
    store: Arc<dyn Store>,
    redis_cfg: config::Redis,
    feed_cfg: config::Feed,
    cfg: config::Deployment<'_>,
) -> Result<(), FatalErr> {
    let cache: Arc<dyn CacheBackend> = Arc::new(RedisCache::new(&redis_cfg).await?);
    let connector = Arc::new(RedisConnector::new(&redis_cfg, &feed_cfg));
    let broker = Arc::new(Supervisor::open(connector, &feed_cfg).await?);
    let (stop, shutdown) = watch::channel(false);

    let worker = Worker::new(
        broker.clone(),
        FeedCache::new(cache.clone(), *feed_cfg.max_size),
        FollowGraph::new(cache.clone()),
        *feed_cfg.dequeue_timeout,
    );
    let worker = tokio::spawn(worker.run(shutdown.clone()));

    let request = Handler::new(store, cache, broker.clone(), &feed_cfg, *cfg.ws_ping_freq);
    let cors = warp::cors()
        .allow_any_origin()
        .allow_methods(cfg.cors.allowed_methods.clone())
        .allow_headers(cfg.cors.allowed_headers.clone());

    let server_addr = SocketAddr::new(*cfg.address, *cfg.port);
    let mut server_shutdown = shutdown.clone();
    let (addr, server) = warp::serve(request.routes(cors))
        .try_bind_with_graceful_shutdown(server_addr, async move {
            let _ = server_shutdown.wait_for(|stop| *stop).await;
        })?;
    let server = tokio::spawn(server);
    log::warn!("Feed service listening on {}", addr);

    let supervise = broker.watch(shutdown);
    tokio::pin!(supervise);
    let outcome = tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            log::warn!("Received shutdown signal; stopping");
            signal.map_err(FatalErr::from)
        }
        supervised = &mut supervise => supervised.map_err(FatalErr::from),
    };

    stop.send_replace(true);
    for (task, handle) in [("server", server), ("fan-out worker", worker)] {
        if let Err(e) = handle.await {
            log::error!("The {} task failed: {}", task, e);
        }
    }
    outcome
}
