use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use bytes::Bytes;

use herald_api::Headers;
use herald_api::name::{is_valid_correlation_id, is_valid_topic};
use herald_api::registration::{GroupRegistration, SubscriptionRegistration, TopicRegistration};

use crate::AppState;
use crate::error::ApiError;

// ═══════════════════════════════════════════════════════════════
//  POST /topics/{topic}
// ═══════════════════════════════════════════════════════════════

/// Accept the event and answer at once; delivery and caching are never
/// reflected in the response.
pub(crate) async fn handle_publish(
    State(state): State<AppState>,
    Path(topic): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    if !is_valid_topic(&topic) {
        return Ok(StatusCode::NOT_FOUND);
    }
    let receipt = state.ingestor.ingest(&topic, event_headers(&headers), body).await?;
    tracing::debug!(
        topic = %topic,
        correlation_id = ?receipt.correlation_id,
        deliveries = receipt.deliveries,
        "event accepted"
    );
    Ok(StatusCode::OK)
}

fn event_headers(headers: &HeaderMap) -> Headers {
    let mut out = Headers::new();
    for name in headers.keys() {
        let values = headers
            .get_all(name)
            .iter()
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
            .collect();
        out.insert(name.as_str().to_string(), values);
    }
    out
}

// ═══════════════════════════════════════════════════════════════
//  POST /groups, POST /topics
// ═══════════════════════════════════════════════════════════════

/// Groups are acknowledged and logged; they do not affect routing.
pub(crate) async fn handle_register_group(
    payload: Result<Json<GroupRegistration>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(group) = payload?;
    group.validate()?;
    tracing::info!(group = %group.group_name, "registered group");
    Ok(StatusCode::OK)
}

/// Topics are acknowledged and logged; publishing does not require them.
pub(crate) async fn handle_register_topic(
    payload: Result<Json<TopicRegistration>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(topic) = payload?;
    topic.validate()?;
    tracing::info!(topic = %topic.name, "registered topic");
    Ok(StatusCode::OK)
}

// ═══════════════════════════════════════════════════════════════
//  POST /topics/{topic}/subscriptions
// ═══════════════════════════════════════════════════════════════

pub(crate) async fn handle_register_subscription(
    State(state): State<AppState>,
    Path(path_topic): Path<String>,
    payload: Result<Json<SubscriptionRegistration>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    if !is_valid_topic(&path_topic) {
        return Ok(StatusCode::NOT_FOUND);
    }
    let Json(sub) = payload?;
    let topic = sub.resolve_topic(&path_topic)?;

    let replaced = state.registry.register(topic, &sub.name, &sub.endpoint);
    tracing::info!(
        topic = %topic,
        subscription = %sub.name,
        endpoint = %sub.endpoint,
        replaced = ?replaced,
        "registered subscription"
    );
    Ok(StatusCode::OK)
}

// ═══════════════════════════════════════════════════════════════
//  GET /events/{correlation_id}
// ═══════════════════════════════════════════════════════════════

pub(crate) async fn handle_query_events(
    State(state): State<AppState>,
    Path(correlation_id): Path<String>,
) -> Response {
    if !is_valid_correlation_id(&correlation_id) {
        return StatusCode::NOT_FOUND.into_response();
    }
    match state.query.events(&correlation_id) {
        Some(events) => Json(events).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
