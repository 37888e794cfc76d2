use std::collections::BTreeMap;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Header carrying the caller-supplied correlation id.
pub const CORRELATION_HEADER: &str = "X-Correlation-Id";

/// Header name → values, in the order the transport presented them.
pub type Headers = BTreeMap<String, Vec<String>>;

/// One published message. Immutable once ingested.
///
/// The body is opaque bytes; in JSON it travels as a base64 string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "correlationId")]
    pub correlation_id: Option<String>,
    pub topic: String,
    pub headers: Headers,
    #[serde(serialize_with = "body_to_base64", deserialize_with = "body_from_base64")]
    pub body: Bytes,
}

impl Event {
    /// Build an event, taking the correlation id from the headers.
    pub fn new(topic: impl Into<String>, headers: Headers, body: Bytes) -> Self {
        let correlation_id = correlation_id(&headers).map(str::to_owned);
        Self {
            correlation_id,
            topic: topic.into(),
            headers,
            body,
        }
    }
}

/// First `X-Correlation-Id` value. An empty first value counts as absent.
pub fn correlation_id(headers: &Headers) -> Option<&str> {
    header_values(headers, CORRELATION_HEADER)
        .next()
        .filter(|v| !v.is_empty())
}

fn header_values<'a>(headers: &'a Headers, name: &str) -> impl Iterator<Item = &'a str> {
    headers
        .iter()
        .filter(move |(k, _)| k.eq_ignore_ascii_case(name))
        .flat_map(|(_, values)| values.iter().map(String::as_str))
}

fn body_to_base64<S: Serializer>(body: &Bytes, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&STANDARD.encode(body))
}

fn body_from_base64<'de, D: Deserializer<'de>>(d: D) -> Result<Bytes, D::Error> {
    let encoded = String::deserialize(d)?;
    STANDARD
        .decode(encoded.as_bytes())
        .map(Bytes::from)
        .map_err(serde::de::Error::custom)
}
