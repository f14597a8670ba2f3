//! Session HTTP handlers.
//!
//! Endpoints:
//! - POST /api/v1/sessions      - Start a new interview session
//! - GET  /api/v1/sessions      - List sessions (optionally by handle)
//! - GET  /api/v1/sessions/{id} - Get a session with its full transcript

use std::time::Instant;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use keepsake_types::error::SessionError;
use keepsake_types::session::{InterviewSession, SessionWithTurns};

use crate::http::error::AppError;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// Request body for session creation.
#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    #[serde(default)]
    pub handle: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

/// Query parameters for session listing.
#[derive(Debug, Deserialize)]
pub struct SessionListQuery {
    #[serde(default)]
    pub handle: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

/// Parse a UUID from a path parameter, returning a 400 error on invalid format.
pub(crate) fn parse_uuid(s: &str) -> Result<Uuid, AppError> {
    s.parse::<Uuid>()
        .map_err(|_| AppError::Validation(format!("Invalid UUID: {s}")))
}

/// POST /api/v1/sessions - Start a new interview session.
pub async fn create_session(
    State(state): State<AppState>,
    Json(body): Json<CreateSessionRequest>,
) -> Result<Json<ApiResponse<InterviewSession>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let session = state
        .session_service
        .create_session(body.handle.as_deref(), body.title)
        .await?;

    let elapsed = start.elapsed().as_millis() as u64;
    let link = format!("/api/v1/sessions/{}", session.id);
    let resp = ApiResponse::success(session, request_id, elapsed).with_link("self", &link);

    Ok(Json(resp))
}

/// GET /api/v1/sessions - List sessions, newest first.
pub async fn list_sessions(
    State(state): State<AppState>,
    Query(query): Query<SessionListQuery>,
) -> Result<Json<ApiResponse<Vec<InterviewSession>>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let sessions = state
        .session_service
        .list_sessions(query.handle.as_deref(), Some(query.limit), Some(query.offset))
        .await?;

    let elapsed = start.elapsed().as_millis() as u64;
    let resp = ApiResponse::success(sessions, request_id, elapsed)
        .with_link("self", "/api/v1/sessions");

    Ok(Json(resp))
}

/// GET /api/v1/sessions/{id} - Get a session with its full transcript.
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<ApiResponse<SessionWithTurns>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let sid = parse_uuid(&session_id)?;

    let hydrated = state
        .session_service
        .get_session_with_turns(&sid)
        .await?
        .ok_or(AppError::Session(SessionError::NotFound))?;

    let elapsed = start.elapsed().as_millis() as u64;
    let link = format!("/api/v1/sessions/{sid}");
    let resp = ApiResponse::success(hydrated, request_id, elapsed).with_link("self", &link);

    Ok(Json(resp))
}
