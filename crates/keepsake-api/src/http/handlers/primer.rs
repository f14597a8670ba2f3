//! Memory primer HTTP handlers.
//!
//! Endpoints:
//! - GET  /api/v1/primers/{handle}         - Get the stored primer for a handle
//! - POST /api/v1/primers/{handle}/rebuild - Rebuild the primer from history

use std::time::Instant;

use axum::extract::{Path, State};
use axum::Json;
use uuid::Uuid;

use keepsake_types::handle::Handle;
use keepsake_types::memory::MemoryPrimer;

use crate::http::error::AppError;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// GET /api/v1/primers/{handle} - Get the stored primer for a handle.
pub async fn get_primer(
    State(state): State<AppState>,
    Path(handle): Path<String>,
) -> Result<Json<ApiResponse<MemoryPrimer>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let primer = state
        .finalize_service
        .primer(&handle)
        .await?
        .ok_or_else(|| AppError::PrimerNotFound(handle.clone()))?;

    let elapsed = start.elapsed().as_millis() as u64;
    let link = format!("/api/v1/primers/{}", primer.handle.as_str());
    let resp = ApiResponse::success(primer, request_id, elapsed).with_link("self", &link);

    Ok(Json(resp))
}

/// POST /api/v1/primers/{handle}/rebuild - Rebuild the primer from history.
pub async fn rebuild_primer(
    State(state): State<AppState>,
    Path(handle): Path<String>,
) -> Result<Json<ApiResponse<MemoryPrimer>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let handle = Handle::normalize(Some(&handle));
    let primer = state.finalize_service.rebuild_primer(&handle).await?;

    let elapsed = start.elapsed().as_millis() as u64;
    let link = format!("/api/v1/primers/{}", handle.as_str());
    let resp = ApiResponse::success(primer, request_id, elapsed).with_link("self", &link);

    Ok(Json(resp))
}
