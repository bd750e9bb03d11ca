use std::time::Duration;

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::Html,
    Json,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::editor::session::{EditorSession, SessionView};
use crate::editor::steps::EditorStep;
use crate::errors::AppError;
use crate::preview::scaler::check_width;
use crate::preview::{render_print_page, RenderedDocument, ScaleState};
use crate::resume::handlers::UserIdQuery;
use crate::resume::model::{PendingPhoto, PhotoValue, ResumeValues};
use crate::resume::persistence::{load_resume, save_resume};
use crate::resume::validation::validate_photo;
use crate::state::AppState;

/// Multipart field carrying the photo file.
pub const PHOTO_FIELD: &str = "photo";

/// How long a scale long-poll waits for the next width change.
const SCALE_POLL_TIMEOUT: Duration = Duration::from_secs(25);

#[derive(Deserialize)]
pub struct OpenSessionRequest {
    pub user_id: String,
    /// Saved resume to edit. A blank draft when omitted.
    pub resume_id: Option<Uuid>,
}

#[derive(Deserialize)]
pub struct StepRequest {
    pub step: EditorStep,
}

#[derive(Deserialize)]
pub struct WidthRequest {
    pub width: f64,
}

/// POST /api/v1/editor/sessions
pub async fn handle_open_session(
    State(state): State<AppState>,
    Json(req): Json<OpenSessionRequest>,
) -> Result<(StatusCode, Json<SessionView>), AppError> {
    let values = match req.resume_id {
        Some(id) => load_resume(&state.db, &req.user_id, id).await?,
        None => ResumeValues::default(),
    };
    let session = EditorSession::new(
        req.user_id,
        values,
        state.object_urls.clone(),
        state.config.reference_width_px,
    );
    let view = state.sessions.insert(session).await;
    Ok((StatusCode::CREATED, Json(view)))
}

/// GET /api/v1/editor/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<SessionView>, AppError> {
    let view = state
        .sessions
        .with_session(id, &params.user_id, |s| Ok(s.view()))
        .await?;
    Ok(Json(view))
}

/// DELETE /api/v1/editor/sessions/:id
pub async fn handle_close_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<StatusCode, AppError> {
    state.sessions.remove(id, &params.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/v1/editor/sessions/:id/values
pub async fn handle_update_values(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
    Json(values): Json<ResumeValues>,
) -> Result<Json<SessionView>, AppError> {
    let view = state
        .sessions
        .with_session(id, &params.user_id, |s| {
            s.set_values(values);
            Ok(s.view())
        })
        .await?;
    Ok(Json(view))
}

/// PUT /api/v1/editor/sessions/:id/step
pub async fn handle_set_step(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
    Json(req): Json<StepRequest>,
) -> Result<Json<SessionView>, AppError> {
    let view = state
        .sessions
        .with_session(id, &params.user_id, |s| {
            s.set_step(req.step);
            Ok(s.view())
        })
        .await?;
    Ok(Json(view))
}

/// PUT /api/v1/editor/sessions/:id/width
///
/// Reports a new measurement of the preview container. Zero resets it to unmeasured.
pub async fn handle_resize(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
    Json(req): Json<WidthRequest>,
) -> Result<Json<RenderedDocument>, AppError> {
    let width = check_width(req.width)?;
    let document = state
        .sessions
        .with_session(id, &params.user_id, |s| {
            s.resize(width)?;
            Ok(s.render())
        })
        .await?;
    Ok(Json(document))
}

/// GET /api/v1/editor/sessions/:id/scale
///
/// Long-poll: answers with the scale after the next width change, or the
/// current one if nothing changes within the poll window.
pub async fn handle_watch_scale(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<ScaleState>, AppError> {
    let mut scaler = state
        .sessions
        .with_session(id, &params.user_id, |s| Ok(s.watch_scale()))
        .await?;
    match tokio::time::timeout(SCALE_POLL_TIMEOUT, scaler.changed()).await {
        Ok(Some(scale)) => Ok(Json(scale)),
        Ok(None) => Err(AppError::NotFound(format!("Editor session {id} was closed"))),
        Err(_) => Ok(Json(scaler.current())),
    }
}

/// PUT /api/v1/editor/sessions/:id/photo
///
/// Multipart upload. The photo stays in memory, shown through an object URL,
/// until the resume is saved.
pub async fn handle_upload_photo(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
    mut multipart: Multipart,
) -> Result<Json<SessionView>, AppError> {
    let photo = read_photo_field(&mut multipart).await?;
    validate_photo(&photo)?;
    info!(
        "Photo selected in session {id}: {} ({} bytes)",
        photo.content_type,
        photo.bytes.len()
    );
    let view = state
        .sessions
        .with_session(id, &params.user_id, |s| {
            s.set_photo(PhotoValue::Pending(photo));
            Ok(s.view())
        })
        .await?;
    Ok(Json(view))
}

/// DELETE /api/v1/editor/sessions/:id/photo
///
/// Marks the photo for removal; the stored file is deleted on save.
pub async fn handle_remove_photo(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<SessionView>, AppError> {
    let view = state
        .sessions
        .with_session(id, &params.user_id, |s| {
            s.set_photo(PhotoValue::Removed);
            Ok(s.view())
        })
        .await?;
    Ok(Json(view))
}

/// GET /api/v1/editor/sessions/:id/preview
pub async fn handle_session_preview(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<RenderedDocument>, AppError> {
    let document = state
        .sessions
        .with_session(id, &params.user_id, |s| Ok(s.render()))
        .await?;
    Ok(Json(document))
}

/// GET /api/v1/editor/sessions/:id/print
pub async fn handle_session_print(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Html<String>, AppError> {
    let page = state
        .sessions
        .with_session(id, &params.user_id, |s| {
            Ok(render_print_page(s.values(), &s.render()))
        })
        .await?;
    Ok(Html(page))
}

/// POST /api/v1/editor/sessions/:id/save
pub async fn handle_save(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<SessionView>, AppError> {
    // The session lock is not held across storage and database calls; the
    // saving flag keeps a second save from racing this one.
    let values = state
        .sessions
        .with_session(id, &params.user_id, |s| s.begin_save())
        .await?;

    // Runs detached so the flag is cleared even if the client goes away mid-save.
    let task = tokio::spawn(async move {
        let user_id = params.user_id;
        let submitted_photo = values.photo.clone();
        let result = save_resume(&state.db, state.photos.as_ref(), &user_id, values).await;
        state
            .sessions
            .with_session(id, &user_id, |s| {
                s.end_save();
                s.mark_saved(&submitted_photo, result?);
                Ok(s.view())
            })
            .await
    });
    let view = task
        .await
        .map_err(|e| AppError::Internal(format!("Save task failed: {e}")))??;
    Ok(Json(view))
}

async fn read_photo_field(multipart: &mut Multipart) -> Result<PendingPhoto, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {e}")))?
    {
        if field.name() != Some(PHOTO_FIELD) {
            continue;
        }
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let file_name = field.file_name().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Could not read photo: {e}")))?;
        return Ok(PendingPhoto::new(bytes, content_type, file_name));
    }
    Err(AppError::Validation(format!(
        "multipart field '{PHOTO_FIELD}' is required"
    )))
}
