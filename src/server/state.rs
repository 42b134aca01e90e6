use axum::extract::FromRef;

use crate::storefront_store::StorefrontStore;
use std::sync::Arc;
use std::time::Instant;

use super::ServerConfig;

pub type GuardedStorefrontStore = Arc<dyn StorefrontStore>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub store: GuardedStorefrontStore,
    pub hash: String,
}

impl ServerState {
    pub fn new(config: ServerConfig, store: GuardedStorefrontStore) -> Self {
        Self {
            config,
            start_time: Instant::now(),
            store,
            hash: env!("GIT_HASH").to_string(),
        }
    }
}

impl FromRef<ServerState> for GuardedStorefrontStore {
    fn from_ref(input: &ServerState) -> Self {
        input.store.clone()
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}
