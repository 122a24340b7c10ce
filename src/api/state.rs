use std::{sync::Arc, time::Duration};

use crate::{
    config::{Config, WatchlistBackend},
    db::{create_redis_client, FileSlot, MemoryListBackend, RedisListBackend},
    services::{GeminiClient, MediaMetadataGateway, Recommender, TmdbGateway},
    store::{LocalWatchlistStore, RemoteWatchlistStore, WatchlistOwner, WatchlistStore},
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn WatchlistStore>,
    pub gateway: Arc<dyn MediaMetadataGateway>,
    pub recommender: Option<Arc<dyn Recommender>>,
    /// Watchlist every request operates on
    pub owner: WatchlistOwner,
}

impl AppState {
    /// Creates state over the shared watchlist with recommendations disabled
    pub fn new(store: Arc<dyn WatchlistStore>, gateway: Arc<dyn MediaMetadataGateway>) -> Self {
        Self {
            store,
            gateway,
            recommender: None,
            owner: WatchlistOwner::Shared,
        }
    }

    pub fn with_recommender(mut self, recommender: Arc<dyn Recommender>) -> Self {
        self.recommender = Some(recommender);
        self
    }

    /// Wires the configured storage backend and upstream clients
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let store: Arc<dyn WatchlistStore> = match config.watchlist_backend {
            WatchlistBackend::Redis => {
                let client = create_redis_client(&config.redis_url)?;
                Arc::new(RemoteWatchlistStore::with_base_key(
                    RedisListBackend::new(client),
                    config.watchlist_key.clone(),
                ))
            }
            WatchlistBackend::Memory => Arc::new(RemoteWatchlistStore::with_base_key(
                MemoryListBackend::new(),
                config.watchlist_key.clone(),
            )),
            WatchlistBackend::Local => Arc::new(LocalWatchlistStore::with_base_key(
                FileSlot::new(&config.local_store_dir),
                config.watchlist_key.clone(),
            )),
        };

        let http_client = reqwest::Client::builder()
            .user_agent(concat!("cineverse-api/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()?;

        let gateway = Arc::new(TmdbGateway::new(
            http_client.clone(),
            config.tmdb_api_key.clone(),
            config.tmdb_api_url.clone(),
        ));

        let mut state = Self::new(store, gateway);

        match config.gemini_key() {
            Some(key) => {
                state = state.with_recommender(Arc::new(GeminiClient::new(
                    http_client,
                    key.to_string(),
                    config.gemini_api_url.clone(),
                    config.gemini_model.clone(),
                )));
            }
            None => tracing::warn!("GEMINI_API_KEY is not set, recommendations are disabled"),
        }

        tracing::info!(
            store = state.store.name(),
            gateway = state.gateway.name(),
            key = %config.watchlist_key,
            "Application state initialized"
        );

        Ok(state)
    }
}
