//! Live interview HTTP handlers.
//!
//! Endpoints:
//! - POST /api/v1/sessions/{id}/ask      - Submit one utterance, get the reply
//! - POST /api/v1/sessions/{id}/finalize - Complete a session, rebuild its primer

use std::time::Instant;

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use tracing::Instrument;
use uuid::Uuid;

use keepsake_observe::genai_attrs::{GEN_AI_OPERATION_NAME, OP_CHAT};
use keepsake_types::provider::ReconciledReply;
use keepsake_types::session::InterviewSession;

use crate::http::error::AppError;
use crate::http::handlers::session::parse_uuid;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// Request body for one ask turn.
#[derive(Debug, Deserialize)]
pub struct AskRequest {
    /// The transcribed utterance.
    pub text: String,
    /// Opaque reference to the recorded audio for this utterance.
    #[serde(default)]
    pub audio_ref: Option<String>,
}

/// Request body for session finalization.
#[derive(Debug, Deserialize)]
pub struct FinalizeRequest {
    #[serde(default)]
    pub handle: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

/// POST /api/v1/sessions/{id}/ask - Submit one utterance and get the reply.
pub async fn ask(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(body): Json<AskRequest>,
) -> Result<Json<ApiResponse<ReconciledReply>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let sid = parse_uuid(&session_id)?;
    if body.text.trim().is_empty() {
        return Err(AppError::Validation("text must not be empty".to_string()));
    }

    let span = tracing::info_span!(
        "ask",
        { GEN_AI_OPERATION_NAME } = OP_CHAT,
        session_id = %sid,
        reason = tracing::field::Empty,
    );
    let reply = state
        .ask_service
        .ask(&sid, &body.text, body.audio_ref)
        .instrument(span.clone())
        .await?;
    span.record("reason", reply.reason.to_string().as_str());

    let elapsed = start.elapsed().as_millis() as u64;
    let link = format!("/api/v1/sessions/{sid}");
    let resp = ApiResponse::success(reply, request_id, elapsed).with_link("session", &link);

    Ok(Json(resp))
}

/// POST /api/v1/sessions/{id}/finalize - Complete a session and rebuild its primer.
pub async fn finalize(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(body): Json<FinalizeRequest>,
) -> Result<Json<ApiResponse<InterviewSession>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let sid = parse_uuid(&session_id)?;

    let session = state
        .finalize_service
        .finalize(&sid, body.handle.as_deref(), body.title)
        .await?;

    let elapsed = start.elapsed().as_millis() as u64;
    let primer_link = format!("/api/v1/primers/{}", session.handle.as_str());
    let resp = ApiResponse::success(session, request_id, elapsed)
        .with_link("primer", &primer_link);

    Ok(Json(resp))
}
