//! Postgres queries
use super::{Result, Store};
use crate::config;
use crate::model::{Follower, Id, Publication};

use ::postgres;
use ::postgres::config::SslMode;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use r2d2_postgres::PostgresConnectionManager;
use tokio::task;

type Pool = r2d2::Pool<PostgresConnectionManager<postgres::NoTls>>;
type PooledConn = r2d2::PooledConnection<PostgresConnectionManager<postgres::NoTls>>;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS users (
    id BIGSERIAL PRIMARY KEY,
    login TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS followers (
    user_id BIGINT NOT NULL,
    follower_id BIGINT NOT NULL,
    PRIMARY KEY (user_id, follower_id)
);
CREATE TABLE IF NOT EXISTS publications (
    id BIGSERIAL PRIMARY KEY,
    author BIGINT NOT NULL,
    txt TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL
);
CREATE INDEX IF NOT EXISTS publications_author_idx ON publications (author);
";

fn ssl_mode(mode: config::PgSslInner) -> SslMode {
    match mode {
        config::PgSslInner::Disable => SslMode::Disable,
        config::PgSslInner::Prefer => SslMode::Prefer,
        config::PgSslInner::Require => SslMode::Require,
    }
}

#[derive(Clone, Debug)]
pub struct PgStore {
    pool: Pool,
}

impl PgStore {
    /// Connect to Postgres.  Blocks; call this before the async runtime starts.
    pub fn new(pg_cfg: &config::Postgres) -> Result<Self> {
        let mut cfg = postgres::Config::new();
        cfg.user(pg_cfg.user.as_str())
            .host(pg_cfg.host.as_str())
            .port(*pg_cfg.port)
            .dbname(pg_cfg.database.as_str())
            .ssl_mode(ssl_mode(*pg_cfg.ssl_mode));
        if let Some(password) = &*pg_cfg.password {
            cfg.password(password);
        };

        cfg.connect(postgres::NoTls)?; // Test connection, letting us immediately exit with an error
                                       // when Postgres isn't running instead of timing out below
        let manager = PostgresConnectionManager::new(cfg, postgres::NoTls);
        let pool = r2d2::Pool::builder()
            .max_size(*pg_cfg.pool_size)
            .build(manager)?;
        log::info!("Connected to Postgres at {}:{}", *pg_cfg.host, *pg_cfg.port);
        Ok(Self { pool })
    }

    /// Create the tables if they do not exist yet
    pub fn migrate(&self) -> Result<()> {
        self.pool.get()?.batch_execute(SCHEMA)?;
        Ok(())
    }

    async fn with_conn<T, F>(&self, query: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PooledConn) -> Result<T> + Send + 'static,
    {
        let pool = self.pool.clone();
        task::spawn_blocking(move || query(&mut pool.get()?)).await?
    }
}

#[async_trait]
impl Store for PgStore {
    async fn add_user(&self, login: &str) -> Result<Id> {
        let login = login.to_string();
        self.with_conn(move |conn| {
            let mut tx = conn.transaction()?;
            let row = tx.query_one("INSERT INTO users (login) VALUES ($1) RETURNING id", &[&login])?;
            tx.commit()?;
            Ok(Id(row.get(0)))
        })
        .await
    }

    async fn add_follower(&self, edge: Follower) -> Result<u64> {
        self.with_conn(move |conn| {
            Ok(conn.execute(
                "INSERT INTO followers (user_id, follower_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
                &[&*edge.user_id, &*edge.follower_id],
            )?)
        })
        .await
    }

    async fn remove_follower(&self, edge: Follower) -> Result<u64> {
        self.with_conn(move |conn| {
            Ok(conn.execute(
                "DELETE FROM followers WHERE user_id = $1 AND follower_id = $2",
                &[&*edge.user_id, &*edge.follower_id],
            )?)
        })
        .await
    }

    async fn add_publication(&self, author: Id, text: &str, at: DateTime<Utc>) -> Result<Publication> {
        let text = text.to_string();
        self.with_conn(move |conn| {
            let mut tx = conn.transaction()?;
            let row = tx.query_one(
                "INSERT INTO publications (author, txt, created_at) VALUES ($1, $2, $3) RETURNING id",
                &[&*author, &text, &at],
            )?;
            tx.commit()?;
            Ok(Publication {
                id: Id(row.get(0)),
                author,
                text,
                at,
            })
        })
        .await
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use hashbrown::HashMap;

    #[test]
    fn ssl_mode_follows_the_configuration() -> std::result::Result<(), crate::err::FatalErr> {
        let (pg, ..) = config::from_env(HashMap::new())?;
        assert_eq!(ssl_mode(*pg.ssl_mode), SslMode::Disable);

        let mut env = HashMap::new();
        env.insert("DB_SSLMODE".to_string(), "require".to_string());
        let (pg, ..) = config::from_env(env)?;
        assert_eq!(ssl_mode(*pg.ssl_mode), SslMode::Require);
        assert_eq!(ssl_mode(config::PgSslInner::Prefer), SslMode::Prefer);
        Ok(())
    }
}
