use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;

use crate::error::DeliveryError;
use crate::event::Headers;

/// What a subscriber answered to a successful attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryReceipt {
    pub status: u16,
}

/// Delivery plugin trait.
///
/// One call is one attempt: implementations must not retry. The engine
/// runs every attempt in its own task and only logs the outcome.
pub trait Delivery: Send + Sync {
    fn attempt(
        &self,
        endpoint: &str,
        body: Bytes,
        headers: Headers,
    ) -> Pin<Box<dyn Future<Output = Result<DeliveryReceipt, DeliveryError>> + Send + '_>>;
}
