use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use crate::{
    auth::{Authenticator, CredentialStore, InMemoryStore, TokenService},
    clock::{Clock, SystemClock},
    config::AppConfig,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub auth: Arc<Authenticator>,
}

impl AppState {
    pub fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        Self::from_config(config, Arc::new(SystemClock))
    }

    pub fn from_config(config: Arc<AppConfig>, clock: Arc<dyn Clock>) -> anyhow::Result<Self> {
        let store = Arc::new(InMemoryStore::new()) as Arc<dyn CredentialStore>;
        let tokens = TokenService::try_from(&config.jwt)?;
        let auth = Arc::new(Authenticator::new(store, tokens, clock));

        if let Some(seed) = &config.seed_admin {
            auth.register(&seed.username, &seed.email, &seed.password)
                .with_context(|| format!("seed user `{}`", seed.username))?;
            info!(username = %seed.username, "seed user registered");
        }

        Ok(Self { config, auth })
    }

    #[cfg(test)]
    pub fn fake(clock: Arc<dyn Clock>) -> Self {
        use crate::config::JwtConfig;

        let config = Arc::new(AppConfig {
            host: "127.0.0.1".into(),
            port: 0,
            jwt: JwtConfig {
                secret: "test".into(),
                algorithm: jsonwebtoken::Algorithm::HS256,
                ttl_minutes: 1,
            },
            seed_admin: None,
        });
        Self::from_config(config, clock).expect("fake state")
    }
}
