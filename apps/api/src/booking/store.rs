//! Booking persistence and resume object storage.

use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::config::Config;
use crate::errors::AppError;
use crate::models::booking::BookingRow;

pub struct NewBooking<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub phone: &'a str,
    pub scheduled_at: DateTime<Utc>,
    pub resume_text: Option<&'a str>,
    pub resume_url: Option<&'a str>,
}

/// Inserts a booking and returns its opaque lookup token.
///
/// Tokens are hyphenless UUIDv4s: opaque, URL-safe, and unique without a
/// collision check.
pub async fn create_booking(pool: &PgPool, booking: NewBooking<'_>) -> Result<String, AppError> {
    let token = Uuid::new_v4().simple().to_string();

    sqlx::query(
        r#"
        INSERT INTO bookings (id, token, name, email, phone, scheduled_at, resume_text, resume_url)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&token)
    .bind(booking.name)
    .bind(booking.email)
    .bind(booking.phone)
    .bind(booking.scheduled_at)
    .bind(booking.resume_text)
    .bind(booking.resume_url)
    .execute(pool)
    .await?;

    info!("Created booking {token} for {}", booking.email);
    Ok(token)
}

/// Direct keyed lookup; `None` when the token is unknown.
pub async fn get_booking(pool: &PgPool, token: &str) -> Result<Option<BookingRow>, AppError> {
    let booking = sqlx::query_as::<_, BookingRow>("SELECT * FROM bookings WHERE token = $1")
        .bind(token)
        .fetch_optional(pool)
        .await?;
    Ok(booking)
}

/// Uploads resume bytes to object storage and returns a public URL.
pub async fn upload_resume_to_storage(
    s3: &S3Client,
    config: &Config,
    bytes: Vec<u8>,
    filename: &str,
) -> Result<String, AppError> {
    let ext = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_else(|| "pdf".to_string());
    let key = format!("resumes/{}.{ext}", Uuid::new_v4());

    s3.put_object()
        .bucket(&config.s3_bucket)
        .key(&key)
        .body(ByteStream::from(bytes))
        .content_type(content_type_for(&ext))
        .send()
        .await
        .map_err(|e| AppError::Storage(format!("S3 upload failed: {e}")))?;

    info!("Uploaded resume to s3://{}/{}", config.s3_bucket, key);

    let base = config
        .s3_public_url
        .as_deref()
        .unwrap_or(&config.s3_endpoint)
        .trim_end_matches('/');
    Ok(format!("{base}/{}/{key}", config.s3_bucket))
}

fn content_type_for(ext: &str) -> &'static str {
    match ext {
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        _ => "application/octet-stream",
    }
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
pub async fn build_s3_client(config: &Config) -> S3Client {
    let credentials = Credentials::new(
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
        None,
        None,
        "interview-api-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&config.s3_endpoint)
        .load()
        .await;

    S3Client::new(&s3_config)
}

#[cfg(test)]
mod tests {
    use super::content_type_for;

    #[test]
    fn test_content_type_covers_accepted_extensions() {
        assert_eq!(content_type_for("pdf"), "application/pdf");
        assert_eq!(content_type_for("doc"), "application/msword");
        assert!(content_type_for("docx").contains("wordprocessingml"));
        assert_eq!(content_type_for("bin"), "application/octet-stream");
    }
}
