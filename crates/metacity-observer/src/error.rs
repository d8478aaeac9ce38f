//! Error types for the API server.
//!
//! [`ObserverError`] unifies all failure modes into a single enum that
//! converts into an Axum HTTP response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use metacity_core::RunnerError;
use metacity_flavor::{DESCRIPTION_FAILED, FlavorError};

/// Errors that can occur in the API layer.
#[derive(Debug, thiserror::Error)]
pub enum ObserverError {
    /// The requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// A serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A UUID could not be parsed from the request path.
    #[error("invalid UUID: {0}")]
    InvalidUuid(String),

    /// The simulation loop is not running.
    #[error("simulation unavailable: {0}")]
    Unavailable(#[from] RunnerError),

    /// A building description could not be generated.
    #[error("description failed: {0}")]
    Description(FlavorError),
}

impl IntoResponse for ObserverError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Self::Serialization(e) => {
                (StatusCode::INTERNAL_SERVER_ERROR, format!("JSON error: {e}"))
            }
            Self::InvalidUuid(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::Unavailable(e) => (StatusCode::SERVICE_UNAVAILABLE, e.to_string()),
            Self::Description(FlavorError::Disabled) => (
                StatusCode::SERVICE_UNAVAILABLE,
                DESCRIPTION_FAILED.to_owned(),
            ),
            Self::Description(_) => (StatusCode::BAD_GATEWAY, DESCRIPTION_FAILED.to_owned()),
        };

        let body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}
