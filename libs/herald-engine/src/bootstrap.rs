use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use herald_api::Delivery;

use crate::cache::{CorrelationCache, spawn_cache_writer};
use crate::config::HeraldConfig;
use crate::dispatch::Dispatcher;
use crate::error::EngineError;
use crate::ingest::Ingestor;
use crate::query::EventQuery;
use crate::registry::SubscriptionRegistry;

/// The running broker core: registry, cache and the cache writer task.
pub struct Engine {
    registry: Arc<SubscriptionRegistry>,
    cache: Arc<CorrelationCache>,
    ingestor: Ingestor,
    writer: JoinHandle<()>,
    shutdown: CancellationToken,
    config: HeraldConfig,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("registry", &self.registry)
            .field("cache", &self.cache)
            .field("config", &self.config)
            .finish()
    }
}

impl Engine {
    /// Bootstrap the engine from a parsed configuration.
    ///
    /// Spawns the cache writer; cancelling `shutdown` stops it.
    pub async fn bootstrap(
        config: HeraldConfig,
        delivery: Arc<dyn Delivery>,
        shutdown: CancellationToken,
    ) -> Result<Self, EngineError> {
        config.validate()?;

        let registry = Arc::new(SubscriptionRegistry::new());
        let cache = Arc::new(CorrelationCache::new(config.cache.idle()));
        let (cache_writer, writer) = spawn_cache_writer(
            cache.clone(),
            config.cache.queue,
            config.cache.cleanup_interval(),
            shutdown.clone(),
        );
        tracing::info!(
            idle_secs = config.cache.idle_secs,
            cleanup_secs = config.cache.cleanup_secs,
            queue = config.cache.queue,
            "started cache writer"
        );

        let ingestor = Ingestor::new(registry.clone(), cache_writer, Dispatcher::new(delivery));

        Ok(Engine {
            registry,
            cache,
            ingestor,
            writer,
            shutdown,
            config,
        })
    }

    /// Subscription registry (e.g., for the API server).
    pub fn registry(&self) -> &Arc<SubscriptionRegistry> {
        &self.registry
    }

    pub fn ingestor(&self) -> Ingestor {
        self.ingestor.clone()
    }

    pub fn query(&self) -> EventQuery {
        EventQuery::new(self.cache.clone())
    }

    pub fn config(&self) -> &HeraldConfig {
        &self.config
    }

    /// Graceful shutdown: stop the cache writer and wait for it to drain.
    pub async fn shutdown(self) {
        self.shutdown.cancel();
        if let Err(e) = self.writer.await {
            tracing::error!(error = %e, "cache writer task failed");
        }
        tracing::info!("engine shut down");
    }
}
