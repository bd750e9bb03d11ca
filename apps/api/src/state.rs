use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::editor::session::SessionStore;
use crate::preview::ObjectUrlRegistry;
use crate::storage::PhotoStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    /// Pluggable photo storage. Default: S3PhotoStore.
    pub photos: Arc<dyn PhotoStore>,
    /// Pending photos reachable through object URLs while they are on screen.
    pub object_urls: ObjectUrlRegistry,
    /// Open editor sessions.
    pub sessions: SessionStore,
}
