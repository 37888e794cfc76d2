use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use herald_api::RegistrationError;
use herald_engine::EngineError;

/// Request-level failure, rendered as `{"error": "..."}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Payload(#[from] JsonRejection),

    #[error("invalid registration: {0}")]
    Registration(#[from] RegistrationError),

    #[error("{0}")]
    Engine(#[from] EngineError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Payload(rejection) => rejection.status(),
            ApiError::Registration(_) => StatusCode::BAD_REQUEST,
            ApiError::Engine(EngineError::InvalidTopic(_)) => StatusCode::NOT_FOUND,
            ApiError::Engine(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, axum::Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Failure to run the listener itself.
#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    #[error("bind api :{port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("axum serve: {0}")]
    Serve(#[source] std::io::Error),
}
