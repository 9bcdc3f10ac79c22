use super::{redis_cfg_types::*, EnvVar};
use crate::err::FatalErr;

#[derive(Debug, Clone, Default)]
pub struct Redis {
    pub user: RedisUser,
    pub password: RedisPass,
    pub port: RedisPort,
    pub host: RedisHost,
    pub db: RedisDb,
    pub namespace: RedisNamespace,
}

impl Redis {
    const USER_SET_WARNING: &'static str =
        "Redis user specified, but Redis did not ask for a username.  Ignoring it.";

    pub(crate) fn from_env(env: EnvVar) -> Result<Self, FatalErr> {
        let env = match env.get("REDIS_URL").cloned() {
            Some(url_str) => env.update_with_redis_url(&url_str)?,
            None => env,
        };

        let cfg = Redis {
            user: RedisUser::default().maybe_update(env.get("REDIS_USER"))?,
            password: RedisPass::default().maybe_update(env.get("REDIS_PASSWORD"))?,
            port: RedisPort::default().maybe_update(env.get("REDIS_PORT"))?,
            host: RedisHost::default().maybe_update(env.get("REDIS_HOST"))?,
            db: RedisDb::default().maybe_update(env.get("REDIS_DB"))?,
            namespace: RedisNamespace::default().maybe_update(env.get("REDIS_NAMESPACE"))?,
        };

        if cfg.user.is_some() {
            log::warn!("{}", Self::USER_SET_WARNING);
        }
        log::info!("Redis configuration:\n{:#?},", &cfg);
        Ok(cfg)
    }

    pub fn addr(&self) -> String {
        [&*self.host, ":", &*self.port.to_string()].concat()
    }

    /// Prefix a key or channel with the configured namespace, if any
    pub fn namespaced(&self, key: &str) -> String {
        match &*self.namespace {
            Some(ns) => [ns, ":", key].concat(),
            None => key.to_string(),
        }
    }
}
