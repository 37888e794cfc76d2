pub mod bootstrap;
pub mod cache;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod ingest;
pub mod query;
pub mod registry;

#[cfg(test)]
mod testing;

pub use bootstrap::Engine;
pub use cache::{CacheWriter, CorrelationCache, spawn_cache_writer};
pub use config::HeraldConfig;
pub use dispatch::Dispatcher;
pub use error::EngineError;
pub use ingest::{IngestReceipt, Ingestor};
pub use query::EventQuery;
pub use registry::{Subscriber, SubscriptionRegistry};
