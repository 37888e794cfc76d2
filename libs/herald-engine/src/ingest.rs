use std::sync::Arc;

use bytes::Bytes;

use herald_api::name::is_valid_topic;
use herald_api::{Event, Headers};

use crate::cache::CacheWriter;
use crate::dispatch::Dispatcher;
use crate::error::EngineError;
use crate::registry::SubscriptionRegistry;

/// What happened to a published event, for logs and tests only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReceipt {
    pub correlation_id: Option<String>,
    /// Delivery attempts started (not completed).
    pub deliveries: usize,
}

/// Entry point for published events.
///
/// Correlated events are queued for the cache writer; every event is fanned
/// out to the topic's current subscribers. Neither outcome is awaited.
#[derive(Clone)]
pub struct Ingestor {
    registry: Arc<SubscriptionRegistry>,
    cache: CacheWriter,
    dispatcher: Dispatcher,
}

impl Ingestor {
    pub fn new(registry: Arc<SubscriptionRegistry>, cache: CacheWriter, dispatcher: Dispatcher) -> Self {
        Self {
            registry,
            cache,
            dispatcher,
        }
    }

    pub async fn ingest(
        &self,
        topic: &str,
        headers: Headers,
        body: Bytes,
    ) -> Result<IngestReceipt, EngineError> {
        if !is_valid_topic(topic) {
            return Err(EngineError::InvalidTopic(topic.to_string()));
        }

        let event = Arc::new(Event::new(topic, headers, body));
        tracing::debug!(
            topic = %event.topic,
            correlation_id = ?event.correlation_id,
            headers = event.headers.len(),
            body_len = event.body.len(),
            "event received"
        );

        if let Some(id) = event.correlation_id.clone() {
            // A stopped writer only costs the cache entry; fan-out still happens.
            if let Err(e) = self.cache.append(id, event.clone()).await {
                tracing::warn!(topic = %event.topic, error = %e, "event not cached");
            }
        }

        let subscribers = self.registry.subscribers_for(topic);
        let deliveries = self.dispatcher.fan_out(&event, subscribers).len();

        Ok(IngestReceipt {
            correlation_id: event.correlation_id.clone(),
            deliveries,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use tokio::task::JoinHandle;
    use tokio_util::sync::CancellationToken;

    use crate::cache::{CorrelationCache, spawn_cache_writer};
    use crate::testing::{RecordingDelivery, headers};

    struct Fixture {
        ingestor: Ingestor,
        registry: Arc<SubscriptionRegistry>,
        cache: Arc<CorrelationCache>,
        delivery: Arc<RecordingDelivery>,
        shutdown: CancellationToken,
        writer: Option<JoinHandle<()>>,
    }

    impl Fixture {
        fn new(delivery: RecordingDelivery) -> Self {
            let shutdown = CancellationToken::new();
            let registry = Arc::new(SubscriptionRegistry::new());
            let cache = Arc::new(CorrelationCache::new(Duration::from_secs(300)));
            let delivery = Arc::new(delivery);
            let (cache_writer, writer) =
                spawn_cache_writer(cache.clone(), 8, Duration::from_secs(600), shutdown.clone());
            let ingestor = Ingestor::new(
                registry.clone(),
                cache_writer,
                Dispatcher::new(delivery.clone()),
            );
            Self {
                ingestor,
                registry,
                cache,
                delivery,
                shutdown,
                writer: Some(writer),
            }
        }

        /// Stop the writer so every queued append has landed.
        async fn settle(&mut self) {
            self.shutdown.cancel();
            if let Some(writer) = self.writer.take() {
                writer.await.unwrap();
            }
        }
    }

    async fn wait_for_attempts(delivery: &RecordingDelivery, n: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while delivery.attempts().len() < n {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("attempts did not arrive");
    }

    #[tokio::test]
    async fn uncorrelated_event_is_only_fanned_out() {
        let mut fx = Fixture::new(RecordingDelivery::default());
        fx.registry.register("orders", "s1", "http://a/hook");

        let receipt = fx
            .ingestor
            .ingest("orders", headers(&[("content-type", "text/plain")]), Bytes::from_static(b"hi"))
            .await
            .unwrap();
        assert_eq!(receipt, IngestReceipt { correlation_id: None, deliveries: 1 });

        wait_for_attempts(&fx.delivery, 1).await;
        fx.settle().await;
        assert!(fx.cache.is_empty());
    }

    #[tokio::test]
    async fn zero_subscribers_still_caches() {
        let mut fx = Fixture::new(RecordingDelivery::default());

        let receipt = fx
            .ingestor
            .ingest("orders.created", headers(&[("x-correlation-id", "tx-42")]), Bytes::from_static(br#"{"id":1}"#))
            .await
            .unwrap();
        assert_eq!(receipt.deliveries, 0);
        assert_eq!(receipt.correlation_id.as_deref(), Some("tx-42"));

        fx.settle().await;
        let events = fx.cache.get("tx-42").unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].topic, "orders.created");
        assert!(fx.delivery.attempts().is_empty());
    }

    #[tokio::test]
    async fn same_correlation_across_topics_keeps_publish_order() {
        let mut fx = Fixture::new(RecordingDelivery::default());
        fx.registry.register("payments", "ledger", "http://ledger/hook");

        for (topic, body) in [("orders", "first"), ("payments", "second")] {
            fx.ingestor
                .ingest(topic, headers(&[("X-Correlation-Id", "tx-7")]), Bytes::from(body))
                .await
                .unwrap();
        }

        wait_for_attempts(&fx.delivery, 1).await;
        fx.settle().await;
        let topics: Vec<_> = fx
            .cache
            .get("tx-7")
            .unwrap()
            .iter()
            .map(|e| e.topic.clone())
            .collect();
        assert_eq!(topics, vec!["orders", "payments"]);
        assert_eq!(fx.delivery.attempts()[0].endpoint, "http://ledger/hook");
    }

    #[tokio::test]
    async fn invalid_topic_is_rejected_before_anything_happens() {
        let mut fx = Fixture::new(RecordingDelivery::default());
        let err = fx
            .ingestor
            .ingest("bad topic", headers(&[("x-correlation-id", "tx")]), Bytes::new())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidTopic(_)));

        fx.settle().await;
        assert!(fx.cache.is_empty());
    }

    #[tokio::test]
    async fn stopped_cache_writer_does_not_fail_publish() {
        let mut fx = Fixture::new(RecordingDelivery::default());
        fx.registry.register("orders", "s1", "http://a/hook");
        fx.settle().await;

        let receipt = fx
            .ingestor
            .ingest("orders", headers(&[("x-correlation-id", "tx")]), Bytes::new())
            .await
            .unwrap();
        assert_eq!(receipt.deliveries, 1);
        wait_for_attempts(&fx.delivery, 1).await;
        assert!(fx.cache.is_empty());
    }
}
