//! Per-request shared state, analogous to the teacher's `HandlerState<B, S>`: constructed
//! once at startup and cloned (cheaply, via `Arc` fields) into each handler, so tests can
//! build an isolated instance without touching module-level statics.

use std::sync::Arc;

use crate::cache::ResultCache;
use crate::config::Config;
use crate::embedding::Encoder;
use crate::llm::{LlmClient, LlmGateway};
use crate::vectordb::VectorDbClient;

/// Shared, cheaply-cloneable handler state.
pub struct AppState<C: LlmClient, V: VectorDbClient> {
    pub encoder: Arc<Encoder>,
    pub gateway: Option<Arc<LlmGateway<C>>>,
    pub store: Arc<V>,
    pub cache: ResultCache,
    pub collection: Arc<str>,
    pub config: Arc<Config>,
}

impl<C: LlmClient, V: VectorDbClient> Clone for AppState<C, V> {
    fn clone(&self) -> Self {
        Self {
            encoder: self.encoder.clone(),
            gateway: self.gateway.clone(),
            store: self.store.clone(),
            cache: self.cache.clone(),
            collection: self.collection.clone(),
            config: self.config.clone(),
        }
    }
}

impl<C: LlmClient, V: VectorDbClient> AppState<C, V> {
    pub fn new(
        encoder: Encoder,
        gateway: Option<LlmGateway<C>>,
        store: V,
        config: Config,
    ) -> Self {
        let cache = ResultCache::new(std::time::Duration::from_secs(config.cache_ttl_seconds));
        let collection: Arc<str> = Arc::from(config.vector_index_name.as_str());
        Self {
            encoder: Arc::new(encoder),
            gateway: gateway.map(Arc::new),
            store: Arc::new(store),
            cache,
            collection,
            config: Arc::new(config),
        }
    }
}
