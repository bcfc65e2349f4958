use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::server::types::ApiErrorType;
use crate::types::AppState;

#[derive(Debug, Deserialize)]
pub struct RatingQuery {
    #[serde(default)]
    pub professor_name: String,
}

/// GET /professor/rating?professor_name=...
///
/// A professor the rating service doesn't know is a successful response with
/// `found: false`.
pub async fn get_professor_rating(
    Query(query): Query<RatingQuery>,
    State(s): State<Arc<AppState>>,
) -> Response {
    info!("GET /professor/rating ({})", query.professor_name);

    match s.rating_client.rating(&query.professor_name).await {
        Ok(rating) => (StatusCode::OK, Json(rating)).into_response(),
        Err(e) => {
            warn!("Rating lookup failed for '{}': {}", query.professor_name, e);
            ApiErrorType::from(&e).into_response()
        }
    }
}
