use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::lookup::LookupError;

/// JSON error body returned by every endpoint.
#[derive(Debug, Serialize)]
pub struct ApiErrorType {
    #[serde(skip)]
    status: StatusCode,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    context: Option<String>,
}

impl From<(StatusCode, &str, Option<String>)> for ApiErrorType {
    fn from((status, error, context): (StatusCode, &str, Option<String>)) -> Self {
        Self {
            status,
            error: error.to_string(),
            context,
        }
    }
}

impl From<&LookupError> for ApiErrorType {
    fn from(error: &LookupError) -> Self {
        let (status, message) = match error {
            LookupError::InvalidRequest { .. } => (StatusCode::BAD_REQUEST, "Invalid request"),
            LookupError::NotConfigured { .. } => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Lookup service is not configured",
            ),
            LookupError::CircuitBreakerOpen => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Service temporarily unavailable due to repeated failures",
            ),
            LookupError::Timeout { .. } => {
                (StatusCode::GATEWAY_TIMEOUT, "Upstream service timed out")
            }
            _ => (StatusCode::BAD_GATEWAY, "Upstream service request failed"),
        };

        Self::from((status, message, Some(error.to_string())))
    }
}

impl IntoResponse for ApiErrorType {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

/// Session id not found or expired.
pub fn session_not_found(session_id: &str) -> Response {
    ApiErrorType::from((
        StatusCode::NOT_FOUND,
        "Session not found",
        Some(format!("No active session with ID: {}", session_id)),
    ))
    .into_response()
}
