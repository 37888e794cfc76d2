mod error;
mod http;

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use herald_engine::{Engine, EventQuery, Ingestor, SubscriptionRegistry};

pub use error::{ApiError, ServeError};

/// What every handler can reach. Each component guards its own state.
#[derive(Clone)]
pub struct AppState {
    pub(crate) registry: Arc<SubscriptionRegistry>,
    pub(crate) ingestor: Ingestor,
    pub(crate) query: EventQuery,
}

impl AppState {
    pub fn new(registry: Arc<SubscriptionRegistry>, ingestor: Ingestor, query: EventQuery) -> Self {
        Self {
            registry,
            ingestor,
            query,
        }
    }

    pub fn from_engine(engine: &Engine) -> Self {
        Self::new(engine.registry().clone(), engine.ingestor(), engine.query())
    }
}

/// Broker HTTP surface.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/groups", post(http::handle_register_group))
        .route("/topics", post(http::handle_register_topic))
        // Published bodies are opaque and unbounded.
        .route(
            "/topics/{topic}",
            post(http::handle_publish).layer(DefaultBodyLimit::disable()),
        )
        .route("/topics/{topic}/subscriptions", post(http::handle_register_subscription))
        .route("/events/{correlation_id}", get(http::handle_query_events))
        .with_state(state)
}

/// Bind `0.0.0.0:port` and serve until `shutdown` is cancelled.
pub async fn run(port: u16, state: AppState, shutdown: CancellationToken) -> Result<(), ServeError> {
    let listener = TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .map_err(|source| ServeError::Bind { port, source })?;
    serve(listener, state, shutdown).await
}

/// Serve on an already bound listener until `shutdown` is cancelled.
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    shutdown: CancellationToken,
) -> Result<(), ServeError> {
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .map_err(ServeError::Serve)
}
