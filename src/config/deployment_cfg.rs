use super::{deployment_cfg_types::*, EnvVar};
use crate::err::FatalErr;

#[derive(Debug, Default)]
pub struct Deployment<'a> {
    pub env: Env,
    pub address: BindAddr,
    pub port: Port,
    pub ws_ping_freq: WsPingFreq,
    pub cors: Cors<'a>,
}

impl Deployment<'_> {
    pub(crate) fn from_env(env: &EnvVar) -> Result<Self, FatalErr> {
        let mut cfg = Self {
            env: Env::default().maybe_update(env.get("NODE_ENV"))?,
            address: BindAddr::default().maybe_update(env.get("BIND"))?,
            port: Port::default().maybe_update(env.get("PORT"))?,
            ws_ping_freq: WsPingFreq::default().maybe_update(env.get("WS_PING_FREQ"))?,
            cors: Cors::default(),
        };
        cfg.env = cfg.env.maybe_update(env.get("RUST_ENV"))?;
        log::info!("Using deployment configuration:\n {:#?}", &cfg);
        Ok(cfg)
    }
}
