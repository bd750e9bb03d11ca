mod config;
mod db;
mod editor;
mod errors;
mod models;
mod preview;
mod resume;
mod routes;
mod state;
mod storage;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use std::net::SocketAddr;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::sync::Arc;

use crate::config::Config;
use crate::db::create_pool;
use crate::editor::session::{spawn_idle_sweeper, SessionStore};
use crate::preview::ObjectUrlRegistry;
use crate::routes::build_router;
use crate::state::AppState;
use crate::storage::S3PhotoStore;

const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Resume Studio API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL (runs pending migrations)
    let db = create_pool(&config.database_url).await?;

    // Initialize S3 / MinIO photo storage
    let s3 = build_s3_client(&config).await;
    let photos = Arc::new(S3PhotoStore::new(
        s3,
        config.s3_bucket.clone(),
        config.photo_public_base_url.clone(),
    ));
    info!("Photo storage initialized (bucket: {})", config.s3_bucket);

    info!(
        "Preview reference width: {}px",
        config.reference_width_px
    );

    // Tear down editor sessions whose client went away without closing them
    let sessions = SessionStore::new();
    spawn_idle_sweeper(
        sessions.clone(),
        config.session_idle_timeout,
        SESSION_SWEEP_INTERVAL,
    );
    info!(
        "Editor sessions expire after {}s idle",
        config.session_idle_timeout.as_secs()
    );

    let state = AppState {
        db,
        config: config.clone(),
        photos,
        object_urls: ObjectUrlRegistry::new(),
        sessions,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict allowed origins once the web client has a fixed domain

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(config: &Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
        None,
        None,
        "resume-studio-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&config.s3_endpoint)
        .load()
        .await;

    // MinIO serves buckets by path, not by virtual host.
    let s3_config = aws_sdk_s3::config::Builder::from(&s3_config)
        .force_path_style(true)
        .build();

    aws_sdk_s3::Client::from_conf(s3_config)
}
