use crate::err::FatalErr;
use hashbrown::HashMap;
use std::fmt;
use url::Url;

#[derive(Debug, Clone)]
pub(crate) struct EnvVar(pub HashMap<String, String>);
impl std::ops::Deref for EnvVar {
    type Target = HashMap<String, String>;
    fn deref(&self) -> &HashMap<String, String> {
        &self.0
    }
}

impl EnvVar {
    pub(crate) fn new(vars: HashMap<String, String>) -> Self {
        Self(vars)
    }

    /// Adds the value unless the variable was already set explicitly
    pub(crate) fn maybe_add_env_var(&mut self, key: &str, maybe_value: Option<impl ToString>) {
        if let Some(value) = maybe_value {
            self.0
                .entry(key.to_string())
                .or_insert_with(|| value.to_string());
        }
    }

    pub(crate) fn update_with_postgres_url(mut self, url_str: &str) -> Result<Self, FatalErr> {
        let url = Url::parse(url_str)?;

        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "password" => self.maybe_add_env_var("DB_PASS", Some(value)),
                "user" => self.maybe_add_env_var("DB_USER", Some(value)),
                "host" => self.maybe_add_env_var("DB_HOST", Some(value)),
                "sslmode" => self.maybe_add_env_var("DB_SSLMODE", Some(value)),
                _ => Err(FatalErr::config(
                    "DATABASE_URL",
                    &key,
                    "a URL with parameters `password`, `user`, `host`, and `sslmode` only",
                ))?,
            }
        }

        let password = match url.password() {
            Some(encoded) => Some(urlencoding::decode(encoded)?.into_owned()),
            None => None,
        };
        self.maybe_add_env_var("DB_PASS", password);
        self.maybe_add_env_var("DB_USER", none_if_empty(url.username()));
        self.maybe_add_env_var("DB_HOST", url.host_str());
        self.maybe_add_env_var("DB_PORT", url.port());
        self.maybe_add_env_var("DB_NAME", none_if_empty(url.path().trim_start_matches('/')));
        Ok(self)
    }

    pub(crate) fn update_with_redis_url(mut self, url_str: &str) -> Result<Self, FatalErr> {
        let url = Url::parse(url_str)?;
        if url.scheme() != "redis" {
            Err(FatalErr::config("REDIS_URL", url_str, "a URL starting with `redis://`"))?
        }

        let password = match url.password() {
            Some(encoded) => Some(urlencoding::decode(encoded)?.into_owned()),
            None => None,
        };
        self.maybe_add_env_var("REDIS_PASSWORD", password);
        self.maybe_add_env_var("REDIS_USER", none_if_empty(url.username()));
        self.maybe_add_env_var("REDIS_HOST", url.host_str());
        self.maybe_add_env_var("REDIS_PORT", url.port());
        self.maybe_add_env_var("REDIS_DB", none_if_empty(url.path().trim_start_matches('/')));
        Ok(self)
    }
}

fn none_if_empty(item: &str) -> Option<String> {
    Some(item).filter(|i| !i.is_empty()).map(String::from)
}

impl fmt::Display for EnvVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut result = String::new();
        for env_var in &[
            "RUST_ENV",
            "NODE_ENV",
            "RUST_LOG",
            "BIND",
            "PORT",
            "WS_PING_FREQ",
            "DATABASE_URL",
            "DB_USER",
            "DB_PORT",
            "DB_HOST",
            "DB_NAME",
            "DB_SSLMODE",
            "DB_POOL_SIZE",
            "REDIS_URL",
            "REDIS_HOST",
            "REDIS_USER",
            "REDIS_PORT",
            "REDIS_DB",
            "REDIS_NAMESPACE",
            "FEED_MAX_SIZE",
            "FANOUT_QUEUE",
            "LIVE_EXCHANGE",
            "BROKER_RETRY_LIMIT",
            "BROKER_RETRY_DELAY",
            "DEQUEUE_TIMEOUT",
        ] {
            if let Some(value) = self.get(&(*env_var).to_string()) {
                result = format!("{}\n    {}: {}", result, env_var, value)
            }
        }
        write!(f, "{}", result)
    }
}

#[macro_export]
macro_rules! from_env_var {
    ($(#[$outer:meta])*
     let name = $name:ident;
     let default: $type:ty = $inner:expr;
     let (env_var, allowed_values) = ($env_var:tt, $allowed_values:expr);
     let from_str = |$arg:ident| $body:expr;
    ) => {
        $(#[$outer])*
        #[derive(Clone)]
        pub struct $name(pub $type);
        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(f, "{:?}", self.0)
            }
        }
        impl std::ops::Deref for $name {
            type Target = $type;
            fn deref(&self) -> &$type {
                &self.0
            }
        }
        impl std::default::Default for $name {
            fn default() -> Self {
                $name($inner)
            }
        }
        impl $name {
            fn inner_from_str($arg: &str) -> Option<$type> {
                $body
            }
            pub(crate) fn maybe_update(
                self,
                var: Option<&String>,
            ) -> Result<Self, $crate::err::FatalErr> {
                Ok(match var {
                    Some(empty_string) if empty_string.is_empty() => Self::default(),
                    Some(value) => Self(Self::inner_from_str(value).ok_or_else(|| {
                        $crate::err::FatalErr::config($env_var, value, $allowed_values)
                    })?),
                    None => self,
                })
            }
        }
    };
}
