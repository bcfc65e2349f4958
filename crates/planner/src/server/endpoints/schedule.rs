//! Schedule generation and manual editing endpoints.
//!
//! Each generation creates a session that owns the resulting schedule; the
//! add/remove endpoints edit that schedule one request at a time.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, warn};

use crate::audit::{self, DegreeAudit};
use crate::schedule::{AdjustError, ClassSection, Preferences, ScheduleResult};
use crate::server::types::{session_not_found, ApiErrorType};
use crate::session::{PlanSession, SessionKey};
use crate::types::AppState;

/// Body of `POST /schedule/generate`.
#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub pool: Vec<ClassSection>,
    #[serde(default)]
    pub preferences: Option<Value>,
}

/// Body of `POST /schedule/from_audit`.
#[derive(Debug, Deserialize)]
pub struct AuditGenerateRequest {
    pub audit: DegreeAudit,
    #[serde(default)]
    pub preferences: Option<Value>,
    /// Fetched from the open-sections service when absent
    #[serde(default)]
    pub open_sections: Option<Vec<ClassSection>>,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub session_id: SessionKey,
    pub schedule: ScheduleResult,
}

/// Parses preferences, filling in the configured unit target when the client
/// leaves `preferredUnits` out.
fn resolve_preferences(
    raw: Option<Value>,
    default_units: u32,
) -> Result<Preferences, serde_json::Error> {
    let mut raw = match raw {
        Some(Value::Null) | None => json!({}),
        Some(value) => value,
    };

    if let Value::Object(map) = &mut raw {
        if map.get("preferredUnits").map_or(true, Value::is_null) {
            map.insert("preferredUnits".to_string(), json!(default_units));
        }
    }

    serde_json::from_value(raw)
}

fn invalid_preferences(e: serde_json::Error) -> Response {
    ApiErrorType::from((
        StatusCode::BAD_REQUEST,
        "Invalid preferences",
        Some(e.to_string()),
    ))
    .into_response()
}

fn generate_session(s: &AppState, pool: &[ClassSection], preferences: Preferences) -> Response {
    let schedule = s.builder.build(pool, &preferences);
    let session_id = s.sessions.create(PlanSession::new(preferences, schedule.clone()));

    info!(
        session = %session_id,
        planned = schedule.planned_courses.len(),
        remaining = schedule.remaining_needed.len(),
        "Created planning session"
    );

    (
        StatusCode::OK,
        Json(GenerateResponse {
            session_id,
            schedule,
        }),
    )
        .into_response()
}

/// POST /schedule/generate
///
/// Builds a schedule from the supplied pool and opens a session for it.
pub async fn post_generate(
    State(s): State<Arc<AppState>>,
    Json(req): Json<GenerateRequest>,
) -> Response {
    info!("POST /schedule/generate ({} sections)", req.pool.len());

    match resolve_preferences(req.preferences, s.config.default_preferred_units) {
        Ok(preferences) => generate_session(&s, &req.pool, preferences),
        Err(e) => invalid_preferences(e),
    }
}

/// POST /schedule/from_audit
///
/// Matches the audit's requirements against open sections and schedules the
/// result.
pub async fn post_generate_from_audit(
    State(s): State<Arc<AppState>>,
    Json(req): Json<AuditGenerateRequest>,
) -> Response {
    info!(
        "POST /schedule/from_audit ({} requirements)",
        req.audit.requirements.len()
    );

    let preferences = match resolve_preferences(req.preferences, s.config.default_preferred_units)
    {
        Ok(preferences) => preferences,
        Err(e) => return invalid_preferences(e),
    };

    let open_sections = match req.open_sections {
        Some(sections) => sections,
        None => match s.sections_client.fetch_all().await {
            Ok(sections) => sections,
            Err(e) => {
                warn!("Failed to fetch open sections: {}", e);
                return ApiErrorType::from(&e).into_response();
            }
        },
    };

    let pool = audit::candidate_pool(&req.audit, &open_sections);
    generate_session(&s, &pool, preferences)
}

/// GET /schedule/:session_id
pub async fn get_schedule(
    Path(session_id): Path<String>,
    State(s): State<Arc<AppState>>,
) -> Response {
    info!("GET /schedule/{}", session_id);

    match s.sessions.get(&SessionKey::from_client(&session_id)) {
        Some(session) => (StatusCode::OK, Json(session)).into_response(),
        None => session_not_found(&session_id),
    }
}

/// POST /schedule/:session_id/regenerate
///
/// Rebuilds the session's schedule from a new pool, discarding manual edits.
pub async fn post_regenerate(
    Path(session_id): Path<String>,
    State(s): State<Arc<AppState>>,
    Json(req): Json<GenerateRequest>,
) -> Response {
    info!("POST /schedule/{}/regenerate", session_id);

    let preferences = match resolve_preferences(req.preferences, s.config.default_preferred_units)
    {
        Ok(preferences) => preferences,
        Err(e) => return invalid_preferences(e),
    };

    let key = SessionKey::from_client(&session_id);
    let schedule = s.builder.build(&req.pool, &preferences);

    if s.sessions.replace(&key, PlanSession::new(preferences, schedule.clone())) {
        (
            StatusCode::OK,
            Json(GenerateResponse {
                session_id: key,
                schedule,
            }),
        )
            .into_response()
    } else {
        session_not_found(&session_id)
    }
}

/// POST /schedule/:session_id/sections
///
/// Adds a section chosen by the user. Only duplicate courses are rejected;
/// unit cap, time and sequence problems are reported as warnings.
pub async fn post_add_section(
    Path(session_id): Path<String>,
    State(s): State<Arc<AppState>>,
    Json(section): Json<ClassSection>,
) -> Response {
    info!(
        "POST /schedule/{}/sections ({})",
        session_id, section.course_id
    );

    let result = s
        .sessions
        .update(&SessionKey::from_client(&session_id), |session| {
            let outcome = session.schedule.add_section(section)?;
            session.updated_at = Utc::now();
            let exceeds_cap = outcome.exceeds_cap(session.preferences.preferred_units);
            Ok::<_, AdjustError>((outcome, exceeds_cap, session.schedule.clone()))
        });

    match result {
        Some(Ok((outcome, exceeds_cap, schedule))) => (
            StatusCode::OK,
            Json(json!({
                "outcome": outcome,
                "exceeds_unit_cap": exceeds_cap,
                "schedule": schedule,
            })),
        )
            .into_response(),
        Some(Err(e)) => {
            warn!("Rejected manual addition: {}", e);
            adjust_error_to_response(e)
        }
        None => session_not_found(&session_id),
    }
}

/// DELETE /schedule/:session_id/sections/:index
pub async fn delete_section(
    Path((session_id, index)): Path<(String, usize)>,
    State(s): State<Arc<AppState>>,
) -> Response {
    info!("DELETE /schedule/{}/sections/{}", session_id, index);

    let result = s
        .sessions
        .update(&SessionKey::from_client(&session_id), |session| {
            let removed = session.schedule.remove_section(index)?;
            session.updated_at = Utc::now();
            Ok::<_, AdjustError>((removed, session.schedule.clone()))
        });

    match result {
        Some(Ok((removed, schedule))) => (
            StatusCode::OK,
            Json(json!({
                "removed": removed,
                "schedule": schedule,
            })),
        )
            .into_response(),
        Some(Err(e)) => adjust_error_to_response(e),
        None => session_not_found(&session_id),
    }
}

/// DELETE /schedule/:session_id
pub async fn delete_session(
    Path(session_id): Path<String>,
    State(s): State<Arc<AppState>>,
) -> Response {
    info!("DELETE /schedule/{}", session_id);

    if s.sessions.remove(&SessionKey::from_client(&session_id)) {
        StatusCode::NO_CONTENT.into_response()
    } else {
        session_not_found(&session_id)
    }
}

/// GET /schedule/:session_id/alternatives
///
/// Looks up open sections for every course still needed.
pub async fn get_alternatives(
    Path(session_id): Path<String>,
    State(s): State<Arc<AppState>>,
) -> Response {
    info!("GET /schedule/{}/alternatives", session_id);

    let Some(session) = s.sessions.get(&SessionKey::from_client(&session_id)) else {
        return session_not_found(&session_id);
    };

    let alternatives = s
        .sections_client
        .alternatives_for(&session.schedule.remaining_needed)
        .await;

    (StatusCode::OK, Json(alternatives)).into_response()
}

fn adjust_error_to_response(error: AdjustError) -> Response {
    let (status, message) = match &error {
        AdjustError::DuplicateCourse { .. } => {
            (StatusCode::CONFLICT, "Course is already in the schedule")
        }
        AdjustError::IndexOutOfRange { .. } => {
            (StatusCode::NOT_FOUND, "No planned course at that position")
        }
    };

    ApiErrorType::from((status, message, Some(error.to_string()))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlannerConfig;
    use axum::body::to_bytes;

    fn state() -> Arc<AppState> {
        Arc::new(AppState::new(PlannerConfig::default()).unwrap())
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn generate_request() -> GenerateRequest {
        serde_json::from_value(json!({
            "pool": [
                { "course_id": "CPSC 131", "units": 3, "meetings": [{ "day": "Mon", "start": 480, "end": 540 }] },
                { "course_id": "MATH 150", "units": 4, "meetings": [{ "day": "Mon", "start": 500, "end": 560 }] }
            ],
            "preferences": { "preferredUnits": 10 }
        }))
        .unwrap()
    }

    #[test]
    fn test_resolve_preferences_default_units() {
        let prefs = resolve_preferences(None, 15).unwrap();
        assert_eq!(prefs.preferred_units, 15);

        let prefs = resolve_preferences(Some(json!({ "preferredUnits": 0 })), 15).unwrap();
        assert_eq!(prefs.preferred_units, 0);

        assert!(resolve_preferences(Some(json!({ "preferredUnits": "lots" })), 15).is_err());
    }

    #[tokio::test]
    async fn test_generate_then_edit() {
        let s = state();

        let response = post_generate(State(s.clone()), Json(generate_request())).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let session_id = body["session_id"].as_str().unwrap().to_string();
        assert_eq!(body["schedule"]["planned_units"], 3);
        assert_eq!(body["schedule"]["remaining_needed"], json!(["MATH 150"]));

        let duplicate: ClassSection =
            serde_json::from_value(json!({ "course_id": "CPSC 131", "section": "02" })).unwrap();
        let response = post_add_section(
            Path(session_id.clone()),
            State(s.clone()),
            Json(duplicate),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let extra: ClassSection =
            serde_json::from_value(json!({ "course_id": "MATH 150", "units": 8 })).unwrap();
        let response =
            post_add_section(Path(session_id.clone()), State(s.clone()), Json(extra)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["exceeds_unit_cap"], true);
        assert_eq!(body["schedule"]["planned_units"], 11);

        let response = delete_section(Path((session_id.clone(), 0)), State(s.clone())).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["removed"]["course_id"], "CPSC 131");
        assert_eq!(body["schedule"]["planned_units"], 8);

        let response = delete_section(Path((session_id.clone(), 7)), State(s.clone())).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unknown_session() {
        let s = state();
        let response = get_schedule(Path("nope".to_string()), State(s.clone())).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = delete_session(Path("nope".to_string()), State(s)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_generate_from_audit_with_supplied_sections() {
        let s = state();
        let req: AuditGenerateRequest = serde_json::from_value(json!({
            "audit": {
                "completed_courses": [
                    { "subject": "CPSC", "number": "120", "grade": "B", "status": "completed" }
                ],
                "requirements": [
                    { "requirement_id": "R1", "courses_allowed": ["CPSC 120", "CPSC 131", "HIST 180"] }
                ]
            },
            "preferences": { "preferredUnits": 6 },
            "open_sections": [
                { "crn": 1, "course_id": "CPSC 120" },
                { "crn": 2, "course_id": "CPSC 131" },
                { "crn": 3, "course_id": "HIST 180" }
            ]
        }))
        .unwrap();

        let response = post_generate_from_audit(State(s), Json(req)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let planned: Vec<&str> = body["schedule"]["planned_courses"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["course_id"].as_str().unwrap())
            .collect();
        assert_eq!(planned, vec!["CPSC 131", "HIST 180"]);
    }
}
