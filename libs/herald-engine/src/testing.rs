//! Test doubles shared by the engine's unit tests.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;

use bytes::Bytes;
use herald_api::{Delivery, DeliveryError, DeliveryErrorKind, DeliveryReceipt, Headers};

#[derive(Debug, Clone)]
pub struct Attempt {
    pub endpoint: String,
    pub body: Bytes,
    pub headers: Headers,
}

/// Records every attempt; endpoints can be scripted to fail or hang.
#[derive(Default)]
pub struct RecordingDelivery {
    attempts: Mutex<Vec<Attempt>>,
    delivered: Mutex<Vec<String>>,
    failing: HashMap<String, DeliveryErrorKind>,
    stalling: HashSet<String>,
}

impl RecordingDelivery {
    pub fn failing(mut self, endpoint: &str, kind: DeliveryErrorKind) -> Self {
        self.failing.insert(endpoint.to_string(), kind);
        self
    }

    pub fn stalling(mut self, endpoint: &str) -> Self {
        self.stalling.insert(endpoint.to_string());
        self
    }

    pub fn attempts(&self) -> Vec<Attempt> {
        self.attempts.lock().unwrap().clone()
    }

    pub fn delivered(&self) -> Vec<String> {
        self.delivered.lock().unwrap().clone()
    }
}

impl Delivery for RecordingDelivery {
    fn attempt(
        &self,
        endpoint: &str,
        body: Bytes,
        headers: Headers,
    ) -> Pin<Box<dyn Future<Output = Result<DeliveryReceipt, DeliveryError>> + Send + '_>> {
        let endpoint = endpoint.to_string();
        Box::pin(async move {
            self.attempts.lock().unwrap().push(Attempt {
                endpoint: endpoint.clone(),
                body,
                headers,
            });
            if self.stalling.contains(&endpoint) {
                std::future::pending::<()>().await;
            }
            if let Some(kind) = self.failing.get(&endpoint) {
                return Err(DeliveryError {
                    kind: *kind,
                    message: format!("scripted failure for {endpoint}"),
                });
            }
            self.delivered.lock().unwrap().push(endpoint);
            Ok(DeliveryReceipt { status: 200 })
        })
    }
}

pub fn headers(pairs: &[(&str, &str)]) -> Headers {
    let mut map = Headers::new();
    for (k, v) in pairs {
        map.entry(k.to_string()).or_default().push(v.to_string());
    }
    map
}
