//! Editing sessions.
//!
//! A session is one open editor: the values being edited, the current form
//! step, the measured preview container and the photo on screen. Removing a
//! session tears it down; dropping it releases the photo's object URL and the
//! width subscription.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::info;
use uuid::Uuid;

use crate::editor::steps::EditorStep;
use crate::errors::AppError;
use crate::preview::{
    render_document, ContainerHandle, LayoutScaler, ObjectUrlRegistry, PhotoResolver,
    RenderedDocument, ScaleState,
};
use crate::resume::model::{PhotoValue, ResumeValues};

#[derive(Debug)]
pub struct EditorSession {
    id: Uuid,
    user_id: String,
    values: ResumeValues,
    step: EditorStep,
    container: ContainerHandle,
    scaler: LayoutScaler,
    photo: PhotoResolver,
    created_at: DateTime<Utc>,
    last_touched: Instant,
    saving: bool,
}

/// What clients see of a session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub id: Uuid,
    pub user_id: String,
    pub step: EditorStep,
    pub step_title: &'static str,
    pub previous_step: Option<EditorStep>,
    pub next_step: Option<EditorStep>,
    pub values: ResumeValues,
    /// Source of the photo currently displayed, if any.
    pub photo_src: Option<String>,
    pub scale: ScaleState,
    pub created_at: DateTime<Utc>,
}

impl EditorSession {
    pub fn new(
        user_id: String,
        values: ResumeValues,
        registry: ObjectUrlRegistry,
        reference_width: f64,
    ) -> Self {
        let container = ContainerHandle::new();
        let scaler = container.observe(reference_width);
        let mut photo = PhotoResolver::new(registry);
        photo.resolve(&values.photo);
        Self {
            id: Uuid::new_v4(),
            user_id,
            values,
            step: EditorStep::default(),
            container,
            scaler,
            photo,
            created_at: Utc::now(),
            last_touched: Instant::now(),
            saving: false,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn values(&self) -> &ResumeValues {
        &self.values
    }

    /// Replaces the edited values. A missing photo in `incoming` keeps the
    /// current photo, since clients never resend an uploaded file.
    pub fn set_values(&mut self, mut incoming: ResumeValues) {
        if incoming.photo.is_absent() {
            incoming.photo = std::mem::take(&mut self.values.photo);
        }
        incoming.id = self.values.id;
        self.values = incoming;
        self.photo.resolve(&self.values.photo);
    }

    pub fn set_photo(&mut self, photo: PhotoValue) {
        self.values.photo = photo;
        self.photo.resolve(&self.values.photo);
    }

    pub fn set_step(&mut self, step: EditorStep) {
        self.step = step;
    }

    pub fn resize(&self, width: f64) -> Result<ScaleState, AppError> {
        self.container.resize(width)?;
        Ok(self.scaler.current())
    }

    /// A fresh subscription to this session's container width. It ends when
    /// the session is torn down.
    pub fn watch_scale(&self) -> LayoutScaler {
        self.container.observe(self.scaler.reference_width())
    }

    /// Marks a save as in flight and hands out the values to persist.
    /// Only one save per session may run at a time.
    pub fn begin_save(&mut self) -> Result<ResumeValues, AppError> {
        if self.saving {
            return Err(AppError::Conflict(format!(
                "Editor session {} is already saving",
                self.id
            )));
        }
        self.saving = true;
        Ok(self.values.clone())
    }

    /// Clears the in-flight flag, whether the save succeeded or not.
    pub fn end_save(&mut self) {
        self.saving = false;
    }

    /// Adopts the values returned by a successful save (id and stored photo URL).
    /// A pending photo becomes the persisted one, releasing its object URL.
    /// If the photo changed while the save was in flight, the newer one stays.
    pub fn mark_saved(&mut self, submitted_photo: &PhotoValue, saved: ResumeValues) {
        self.values.id = saved.id;
        if &self.values.photo == submitted_photo {
            self.values.photo = saved.photo;
            self.photo.resolve(&self.values.photo);
        }
    }

    pub fn render(&self) -> RenderedDocument {
        render_document(&self.values, self.scaler.current(), self.photo.src().as_deref())
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            id: self.id,
            user_id: self.user_id.clone(),
            step: self.step,
            step_title: self.step.title(),
            previous_step: self.step.previous(),
            next_step: self.step.next(),
            values: self.values.clone(),
            photo_src: self.photo.src(),
            scale: self.scaler.current(),
            created_at: self.created_at,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Session store
// ────────────────────────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<Mutex<HashMap<Uuid, EditorSession>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, session: EditorSession) -> SessionView {
        let view = session.view();
        self.sessions.lock().await.insert(session.id(), session);
        info!("Opened editor session {} for user {}", view.id, view.user_id);
        view
    }

    /// Runs `f` against a session owned by `user_id`.
    pub async fn with_session<T>(
        &self,
        id: Uuid,
        user_id: &str,
        f: impl FnOnce(&mut EditorSession) -> Result<T, AppError>,
    ) -> Result<T, AppError> {
        let mut sessions = self.sessions.lock().await;
        let session = sessions
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Editor session {id} not found")))?;
        if session.user_id != user_id {
            return Err(AppError::Forbidden);
        }
        session.last_touched = Instant::now();
        f(session)
    }

    /// Tears a session down. Its resources are released when it drops here.
    pub async fn remove(&self, id: Uuid, user_id: &str) -> Result<(), AppError> {
        let mut sessions = self.sessions.lock().await;
        match sessions.get(&id) {
            None => return Err(AppError::NotFound(format!("Editor session {id} not found"))),
            Some(session) if session.user_id != user_id => return Err(AppError::Forbidden),
            Some(_) => {}
        }
        sessions.remove(&id);
        info!("Closed editor session {id}");
        Ok(())
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    /// Tears down every session untouched for at least `max_idle`. Returns how many went.
    pub async fn evict_idle(&self, max_idle: Duration) -> usize {
        let now = Instant::now();
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|id, session| {
            let keep = session.saving || now.duration_since(session.last_touched) < max_idle;
            if !keep {
                info!(
                    "Evicting idle editor session {id} (opened {})",
                    session.created_at
                );
            }
            keep
        });
        before - sessions.len()
    }
}

/// Runs [`SessionStore::evict_idle`] every `every` for the lifetime of the process.
pub fn spawn_idle_sweeper(store: SessionStore, max_idle: Duration, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            let evicted = store.evict_idle(max_idle).await;
            if evicted > 0 {
                info!("Evicted {evicted} idle editor sessions");
            }
        }
    })
}
