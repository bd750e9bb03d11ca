use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

use crate::errors::AppError;
use crate::preview::scaler::check_width;
use crate::preview::{compute_scale, render_document, RenderedDocument};
use crate::resume::model::ResumeValues;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct PreviewRequest {
    pub resume: ResumeValues,
    /// Measured container width in CSS pixels. Omitted while unmeasured.
    pub width: Option<f64>,
}

/// POST /api/v1/preview
///
/// Stateless render of arbitrary values. Only an already stored photo can be
/// shown here; uploads go through an editor session.
pub async fn handle_preview(
    State(state): State<AppState>,
    Json(req): Json<PreviewRequest>,
) -> Result<Json<RenderedDocument>, AppError> {
    let width = req.width.map(check_width).transpose()?;
    let scale = compute_scale(width, state.config.reference_width_px);
    Ok(Json(render_document(&req.resume, scale, req.resume.photo.persisted_url())))
}

/// GET /api/v1/photos/:token
///
/// Serves a pending photo while its object URL is live.
pub async fn handle_object_url(
    State(state): State<AppState>,
    Path(token): Path<Uuid>,
) -> Result<Response, AppError> {
    let photo = state
        .object_urls
        .get(token)
        .ok_or_else(|| AppError::NotFound(format!("Photo {token} not found")))?;
    debug!("Serving object URL {token} ({} bytes)", photo.bytes.len());
    Ok((
        [
            (header::CONTENT_TYPE, photo.content_type),
            (header::CACHE_CONTROL, "no-store".to_string()),
        ],
        photo.bytes,
    )
        .into_response())
}
