use aws_sdk_s3::Client as S3Client;
use sqlx::PgPool;

use crate::config::Config;
use crate::email::EmailNotifier;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub s3: S3Client,
    /// Absent when SMTP is not configured; scheduling then reports
    /// `emailSent=false` instead of failing.
    pub email: Option<EmailNotifier>,
    pub config: Config,
}
