use std::sync::Arc;

use herald_api::Event;

use crate::cache::CorrelationCache;

/// Read-only view of the correlation cache.
///
/// Lookups do not refresh an entry's idle clock, so polling a correlation
/// id never extends how long it is retained.
#[derive(Debug, Clone)]
pub struct EventQuery {
    cache: Arc<CorrelationCache>,
}

impl EventQuery {
    pub fn new(cache: Arc<CorrelationCache>) -> Self {
        Self { cache }
    }

    /// Events for `correlation_id` in arrival order; `None` when unknown or
    /// expired.
    pub fn events(&self, correlation_id: &str) -> Option<Vec<Arc<Event>>> {
        self.cache.get(correlation_id)
    }
}
