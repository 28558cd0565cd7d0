use std::sync::Arc;

use crate::auth::tokens::TokenCodec;
use crate::config::AppConfig;
use crate::store::{self, Store};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Arc<AppConfig>,
    /// Built once from the secret key; the request path never touches the
    /// raw key material again.
    pub tokens: TokenCodec,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let store = store::connect(&config.database_url).await?;
        Ok(Self::from_parts(store, config))
    }

    pub fn from_parts(store: Arc<dyn Store>, config: Arc<AppConfig>) -> Self {
        let tokens = TokenCodec::new(&config.secret_key, config.session_ttl_secs);
        Self {
            store,
            config,
            tokens,
        }
    }
}

#[cfg(test)]
impl AppState {
    /// In-memory SQLite store with test configuration.
    pub async fn for_tests() -> Self {
        Self::for_tests_with_config(Arc::new(AppConfig::for_tests())).await
    }

    pub async fn for_tests_with_config(config: Arc<AppConfig>) -> Self {
        let store = store::connect("sqlite::memory:")
            .await
            .expect("in-memory store");
        Self::from_parts(store, config)
    }
}
