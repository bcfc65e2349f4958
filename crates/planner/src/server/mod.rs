use std::sync::Arc;

use axum::routing::{delete, get, post};
use axum::Router;

use crate::server::endpoints::{professor, schedule, status};
use crate::types::AppState;

mod endpoints;
mod types;

/// Creates a router that can be used by `axum`.
///
/// # Parameters
/// - `app_state`: The app server state.
///
/// # Returns
/// The router.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    let schedule_router = Router::new()
        .route("/schedule/generate", post(schedule::post_generate))
        .route(
            "/schedule/from_audit",
            post(schedule::post_generate_from_audit),
        )
        .route(
            "/schedule/:session_id",
            get(schedule::get_schedule).delete(schedule::delete_session),
        )
        .route(
            "/schedule/:session_id/regenerate",
            post(schedule::post_regenerate),
        )
        .route(
            "/schedule/:session_id/sections",
            post(schedule::post_add_section),
        )
        .route(
            "/schedule/:session_id/sections/:index",
            delete(schedule::delete_section),
        )
        .route(
            "/schedule/:session_id/alternatives",
            get(schedule::get_alternatives),
        );

    Router::new()
        .route("/health", get(status::get_health))
        .route("/sessions/stats", get(status::get_session_stats))
        .route(
            "/professor/rating",
            get(professor::get_professor_rating),
        )
        .merge(schedule_router)
        .with_state(app_state)
}
