use std::sync::Arc;

use tokio::task::JoinHandle;

use herald_api::{Delivery, Event, Headers};

use crate::registry::Subscriber;

/// Routing header added to every outbound copy, naming the subscription.
pub const SUBSCRIPTION_HEADER: &str = "x-herald-subscription";

/// Connection-level headers that describe the inbound hop only.
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "content-length",
    "host",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "proxy-connection",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Fans events out to subscribers, one detached task per attempt.
#[derive(Clone)]
pub struct Dispatcher {
    delivery: Arc<dyn Delivery>,
}

impl Dispatcher {
    pub fn new(delivery: Arc<dyn Delivery>) -> Self {
        Self { delivery }
    }

    /// Start one delivery attempt per subscriber and return immediately.
    ///
    /// Each attempt gets its own copy of the outbound headers. Outcomes are
    /// logged by the attempt's task; the handles may be dropped.
    pub fn fan_out(&self, event: &Event, subscribers: Vec<Subscriber>) -> Vec<JoinHandle<()>> {
        if subscribers.is_empty() {
            return Vec::new();
        }

        let base = outbound_headers(&event.headers);
        subscribers
            .into_iter()
            .map(|sub| {
                let mut headers = base.clone();
                headers.insert(SUBSCRIPTION_HEADER.to_string(), vec![sub.name.clone()]);

                let delivery = self.delivery.clone();
                let body = event.body.clone();
                let topic = event.topic.clone();
                tokio::spawn(async move {
                    match delivery.attempt(&sub.endpoint, body, headers).await {
                        Ok(receipt) => tracing::debug!(
                            topic = %topic,
                            subscription = %sub.name,
                            endpoint = %sub.endpoint,
                            status = receipt.status,
                            "event delivered"
                        ),
                        Err(e) => tracing::warn!(
                            topic = %topic,
                            subscription = %sub.name,
                            endpoint = %sub.endpoint,
                            kind = %e.kind,
                            error = %e.message,
                            "delivery failed"
                        ),
                    }
                })
            })
            .collect()
    }
}

/// Inbound headers minus hop-by-hop ones and any spoofed routing header.
pub fn outbound_headers(headers: &Headers) -> Headers {
    headers
        .iter()
        .filter(|(name, _)| {
            !HOP_BY_HOP.iter().any(|h| name.eq_ignore_ascii_case(h))
                && !name.eq_ignore_ascii_case(SUBSCRIPTION_HEADER)
        })
        .map(|(name, values)| (name.clone(), values.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    use bytes::Bytes;
    use herald_api::DeliveryErrorKind;

    use crate::testing::{RecordingDelivery, headers};

    fn subscriber(name: &str, endpoint: &str) -> Subscriber {
        Subscriber {
            name: name.into(),
            endpoint: endpoint.into(),
        }
    }

    #[tokio::test]
    async fn no_subscribers_means_no_attempts() {
        let delivery = Arc::new(RecordingDelivery::default());
        let dispatcher = Dispatcher::new(delivery.clone());
        let event = Event::new("orders", Headers::new(), Bytes::from_static(b"{}"));

        assert!(dispatcher.fan_out(&event, Vec::new()).is_empty());
        assert!(delivery.attempts().is_empty());
    }

    #[tokio::test]
    async fn each_attempt_gets_its_own_routing_header() {
        let delivery = Arc::new(RecordingDelivery::default());
        let dispatcher = Dispatcher::new(delivery.clone());
        let event = Event::new(
            "orders",
            headers(&[
                ("host", "broker:8080"),
                ("content-length", "8"),
                ("content-type", "application/json"),
                ("x-herald-subscription", "spoofed"),
            ]),
            Bytes::from_static(br#"{"id":1}"#),
        );

        let handles = dispatcher.fan_out(
            &event,
            vec![subscriber("s1", "http://a/hook"), subscriber("s2", "http://b/hook")],
        );
        for h in handles {
            h.await.unwrap();
        }

        let mut attempts = delivery.attempts();
        attempts.sort_by(|a, b| a.endpoint.cmp(&b.endpoint));
        assert_eq!(attempts.len(), 2);
        for (attempt, name) in attempts.iter().zip(["s1", "s2"]) {
            assert_eq!(attempt.body, Bytes::from_static(br#"{"id":1}"#));
            assert_eq!(attempt.headers[SUBSCRIPTION_HEADER], vec![name.to_string()]);
            assert_eq!(attempt.headers["content-type"], vec!["application/json".to_string()]);
            assert!(!attempt.headers.contains_key("host"));
            assert!(!attempt.headers.contains_key("content-length"));
        }
        // The event itself is untouched.
        assert_eq!(event.headers["x-herald-subscription"], vec!["spoofed".to_string()]);
    }

    #[tokio::test]
    async fn failing_subscriber_does_not_block_the_others() {
        let delivery = Arc::new(
            RecordingDelivery::default()
                .failing("http://unreachable/hook", DeliveryErrorKind::Connect)
                .stalling("http://slow/hook"),
        );
        let dispatcher = Dispatcher::new(delivery.clone());
        let event = Event::new("orders", Headers::new(), Bytes::from_static(b"x"));

        let mut handles = dispatcher.fan_out(
            &event,
            vec![
                subscriber("a-slow", "http://slow/hook"),
                subscriber("b-down", "http://unreachable/hook"),
                subscriber("c-up", "http://reachable/hook"),
            ],
        );

        let slow = handles.remove(0);
        for h in handles {
            h.await.unwrap();
        }

        let delivered = delivery.delivered();
        assert_eq!(delivered, vec!["http://reachable/hook".to_string()]);
        assert!(!slow.is_finished());
        slow.abort();
    }
}
