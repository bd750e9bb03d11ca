use std::time::Duration;

use anyhow::{Context, Result};

use crate::preview::scaler::A4_REFERENCE_WIDTH_PX;

const DEFAULT_SESSION_IDLE_MINUTES: u64 = 60;

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub s3_bucket: String,
    pub s3_endpoint: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    /// Base URL persisted photo URLs are built from. Defaults to `{S3_ENDPOINT}/{S3_BUCKET}`.
    pub photo_public_base_url: String,
    /// Canonical pixel width resumes are authored against (A4 at 96 dpi).
    pub reference_width_px: f64,
    /// Editor sessions untouched for this long are torn down.
    pub session_idle_timeout: Duration,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let s3_bucket = require_env("S3_BUCKET")?;
        let s3_endpoint = require_env("S3_ENDPOINT")?;
        let photo_public_base_url = std::env::var("PHOTO_PUBLIC_BASE_URL").unwrap_or_else(|_| {
            format!("{}/{}", s3_endpoint.trim_end_matches('/'), s3_bucket)
        });

        let reference_width_px = match std::env::var("PREVIEW_REFERENCE_WIDTH_PX") {
            Ok(raw) => parse_reference_width(&raw)?,
            Err(_) => A4_REFERENCE_WIDTH_PX,
        };

        let session_idle_timeout = match std::env::var("EDITOR_SESSION_IDLE_MINUTES") {
            Ok(raw) => parse_idle_minutes(&raw)?,
            Err(_) => Duration::from_secs(DEFAULT_SESSION_IDLE_MINUTES * 60),
        };

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            s3_bucket,
            s3_endpoint,
            aws_access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            photo_public_base_url,
            reference_width_px,
            session_idle_timeout,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_idle_minutes(raw: &str) -> Result<Duration> {
    let minutes = raw
        .trim()
        .parse::<u64>()
        .context("EDITOR_SESSION_IDLE_MINUTES must be a whole number of minutes")?;
    if minutes == 0 {
        anyhow::bail!("EDITOR_SESSION_IDLE_MINUTES must be at least 1");
    }
    Ok(Duration::from_secs(minutes * 60))
}

fn parse_reference_width(raw: &str) -> Result<f64> {
    let width = raw
        .trim()
        .parse::<f64>()
        .context("PREVIEW_REFERENCE_WIDTH_PX must be a number")?;
    if !width.is_finite() || width <= 0.0 {
        anyhow::bail!("PREVIEW_REFERENCE_WIDTH_PX must be a positive number, got {width}");
    }
    Ok(width)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_width_accepts_positive_number() {
        assert_eq!(parse_reference_width(" 816 ").unwrap(), 816.0);
    }

    #[test]
    fn test_reference_width_rejects_zero_and_garbage() {
        assert!(parse_reference_width("0").is_err());
        assert!(parse_reference_width("-10").is_err());
        assert!(parse_reference_width("wide").is_err());
    }

    #[test]
    fn test_idle_minutes_parse_to_duration() {
        assert_eq!(parse_idle_minutes("30").unwrap(), Duration::from_secs(1800));
        assert!(parse_idle_minutes("0").is_err());
        assert!(parse_idle_minutes("soon").is_err());
    }
}
