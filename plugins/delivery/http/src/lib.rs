use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use bytes::Bytes;
use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use herald_api::{Delivery, DeliveryError, DeliveryReceipt, Headers};

// ═══════════════════════════════════════════════════════════════
//  HttpDeliveryConfig
// ═══════════════════════════════════════════════════════════════

fn default_timeout() -> Duration {
    Duration::from_secs(60)
}

#[derive(Debug, Clone)]
pub struct HttpDeliveryConfig {
    /// Overall timeout of one attempt: connect, send, and response headers.
    pub timeout: Duration,
}

impl Default for HttpDeliveryConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  HttpDelivery
// ═══════════════════════════════════════════════════════════════

/// Delivers an event as a single `POST` of the original body and headers.
///
/// The underlying client is shared by all attempts. Nothing is retried.
#[derive(Debug, Clone)]
pub struct HttpDelivery {
    client: Client,
}

impl HttpDelivery {
    pub fn new(config: HttpDeliveryConfig) -> Result<Self, DeliveryError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| DeliveryError::other(format!("build http client: {e}")))?;
        Ok(Self { client })
    }
}

impl Delivery for HttpDelivery {
    fn attempt(
        &self,
        endpoint: &str,
        body: Bytes,
        headers: Headers,
    ) -> Pin<Box<dyn Future<Output = Result<DeliveryReceipt, DeliveryError>> + Send + '_>> {
        let endpoint = endpoint.to_string();
        Box::pin(async move {
            let url = reqwest::Url::parse(&endpoint)
                .map_err(|e| DeliveryError::endpoint(format!("'{endpoint}': {e}")))?;

            let response = self
                .client
                .post(url)
                .headers(header_map(&headers))
                .body(body)
                .send()
                .await
                .map_err(|e| classify(e).with_context(format!("POST {endpoint}")))?;

            let status = response.status();
            if !status.is_success() {
                return Err(
                    DeliveryError::status(status.as_u16()).with_context(format!("POST {endpoint}"))
                );
            }
            Ok(DeliveryReceipt {
                status: status.as_u16(),
            })
        })
    }
}

/// Convert to a wire header map, skipping names or values HTTP cannot carry.
fn header_map(headers: &Headers) -> HeaderMap {
    let mut map = HeaderMap::new();
    for (name, values) in headers {
        let Ok(name) = HeaderName::from_bytes(name.as_bytes()) else {
            tracing::debug!(header = %name, "skipping invalid header name");
            continue;
        };
        for value in values {
            match HeaderValue::from_str(value) {
                Ok(v) => {
                    map.append(name.clone(), v);
                }
                Err(_) => tracing::debug!(header = %name, "skipping invalid header value"),
            }
        }
    }
    map
}

fn classify(e: reqwest::Error) -> DeliveryError {
    if e.is_timeout() {
        DeliveryError::timeout(e.to_string())
    } else if e.is_connect() {
        DeliveryError::connect(e.to_string())
    } else if e.is_builder() {
        DeliveryError::endpoint(e.to_string())
    } else {
        DeliveryError::other(e.to_string())
    }
}
