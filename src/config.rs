//! Configuration read from the environment.  Every setting has a default that can be
//! overridden by an environmental variable (either set at runtime or in the `.env` file).
pub use {
    deployment_cfg::Deployment, feed_cfg::Feed, postgres_cfg::Postgres, redis_cfg::Redis,
};

use self::environmental_variables::EnvVar;
use super::err::FatalErr;
use hashbrown::HashMap;
use std::{env, io};

mod deployment_cfg;
mod deployment_cfg_types;
mod environmental_variables;
mod feed_cfg;
mod feed_cfg_types;
mod postgres_cfg;
mod postgres_cfg_types;
mod redis_cfg;
mod redis_cfg_types;

pub use deployment_cfg_types::EnvInner;
pub use postgres_cfg_types::PgSslInner;

/// Load `.env` (or `.env.production`) into the process environment.  A missing file is
/// not an error; variables already set in the environment take precedence.
pub fn merge_dotenv() -> Result<(), FatalErr> {
    let env_mode = env::var("RUST_ENV").or_else(|_| env::var("NODE_ENV")).ok();
    let file_name = match env_mode.as_deref() {
        Some("production") => ".env.production",
        Some("development") | None => ".env",
        Some(unsupported) => Err(FatalErr::config(
            "RUST_ENV",
            unsupported,
            "one of: [\"production\", \"development\"]",
        ))?,
    };

    match dotenv::from_filename(file_name) {
        Ok(_) => Ok(()),
        Err(dotenv::Error::Io(e)) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(FatalErr::Dotenv(e)),
    }
}

pub fn from_env<'a>(
    env_vars: HashMap<String, String>,
) -> Result<(Postgres, Redis, Feed, Deployment<'a>), FatalErr> {
    let env_vars = EnvVar::new(env_vars);
    log::info!("Environmental variables received: {}", &env_vars);
    Ok((
        Postgres::from_env(env_vars.clone())?,
        Redis::from_env(env_vars.clone())?,
        Feed::from_env(&env_vars)?,
        Deployment::from_env(&env_vars)?,
    ))
}

#[cfg(test)]
mod test;
