use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Html,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::preview::scaler::check_width;
use crate::preview::{compute_scale, render_document, render_print_page, RenderedDocument};
use crate::resume::model::ResumeValues;
use crate::resume::persistence::{delete_resume, list_resumes, load_resume};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct UserIdQuery {
    pub user_id: String,
}

#[derive(Deserialize)]
pub struct SavedPreviewQuery {
    pub user_id: String,
    pub width: Option<f64>,
}

#[derive(Serialize)]
pub struct ResumeListResponse {
    pub total: usize,
    pub resumes: Vec<ResumeValues>,
}

/// GET /api/v1/resumes
pub async fn handle_list_resumes(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<ResumeListResponse>, AppError> {
    let resumes = list_resumes(&state.db, &params.user_id).await?;
    Ok(Json(ResumeListResponse {
        total: resumes.len(),
        resumes,
    }))
}

/// GET /api/v1/resumes/:id
pub async fn handle_get_resume(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<ResumeValues>, AppError> {
    Ok(Json(load_resume(&state.db, &params.user_id, id).await?))
}

/// DELETE /api/v1/resumes/:id
pub async fn handle_delete_resume(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<StatusCode, AppError> {
    delete_resume(&state.db, state.photos.as_ref(), &params.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/resumes/:id/preview
///
/// Thumbnail-style render of a saved resume at the given width.
pub async fn handle_saved_preview(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<SavedPreviewQuery>,
) -> Result<Json<RenderedDocument>, AppError> {
    let width = params.width.map(check_width).transpose()?;
    let values = load_resume(&state.db, &params.user_id, id).await?;
    let scale = compute_scale(width, state.config.reference_width_px);
    Ok(Json(render_document(&values, scale, values.photo.persisted_url())))
}

/// GET /api/v1/resumes/:id/print
pub async fn handle_saved_print(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Html<String>, AppError> {
    let values = load_resume(&state.db, &params.user_id, id).await?;
    let reference = state.config.reference_width_px;
    let scale = compute_scale(Some(reference), reference);
    let document = render_document(&values, scale, values.photo.persisted_url());
    Ok(Html(render_print_page(&values, &document)))
}
