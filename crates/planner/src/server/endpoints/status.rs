use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use tracing::info;

use crate::types::AppState;

/// GET /health
pub async fn get_health() -> Response {
    (StatusCode::OK, Json(json!({ "status": "ok" }))).into_response()
}

/// GET /sessions/stats
pub async fn get_session_stats(State(s): State<Arc<AppState>>) -> Response {
    info!("GET /sessions/stats");

    let stats = s.sessions.stats();
    (
        StatusCode::OK,
        Json(json!({
            "sessions": stats,
            "cached_ratings": s.rating_client.cached_entries(),
        })),
    )
        .into_response()
}
