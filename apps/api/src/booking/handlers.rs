use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::booking::schedule::parse_scheduled_at;
use crate::booking::store::{create_booking, get_booking, upload_resume_to_storage, NewBooking};
use crate::errors::AppError;
use crate::models::booking::BookingRow;
use crate::resume;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadApplicationResponse {
    pub resume_url: String,
    pub resume_text: Option<String>,
    pub extraction_error: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleInterviewRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub datetime: String,
    #[serde(default)]
    pub resume_text: Option<String>,
    #[serde(default)]
    pub resume_url: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleInterviewResponse {
    pub ok: bool,
    pub interview_url: String,
    pub email_sent: bool,
    pub email_error: Option<String>,
}

/// Booking lookups deliberately keep the stored snake_case field names.
#[derive(Debug, Serialize)]
pub struct BookingResponse {
    pub token: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub scheduled_at: String,
    pub created_at: String,
    pub resume_text: Option<String>,
    pub resume_url: Option<String>,
}

impl From<BookingRow> for BookingResponse {
    fn from(row: BookingRow) -> Self {
        BookingResponse {
            token: row.token,
            name: row.name,
            email: row.email,
            phone: row.phone,
            scheduled_at: row.scheduled_at.to_rfc3339(),
            created_at: row.created_at.to_rfc3339(),
            resume_text: row.resume_text,
            resume_url: row.resume_url,
        }
    }
}

/// POST /api/upload-application
///
/// Validates the multipart file, stores it, and attempts text extraction.
/// Extraction failure is reported in the response, never as a request error.
pub async fn handle_upload_application(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadApplicationResponse>, AppError> {
    let mut file: Option<(String, Option<String>, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart payload: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| AppError::Validation("File field must include a filename".to_string()))?;
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read uploaded file: {e}")))?;
        file = Some((filename, content_type, bytes.to_vec()));
        break;
    }

    let (filename, content_type, bytes) =
        file.ok_or_else(|| AppError::Validation("Missing required field: file".to_string()))?;

    info!(
        "Received application upload: {filename} ({})",
        content_type.as_deref().unwrap_or("unknown content type")
    );

    resume::validate_file(&bytes, &filename, content_type.as_deref())
        .map_err(AppError::Validation)?;

    let (resume_text, extraction_error) = resume::extract_text(&bytes, &filename);
    let resume_url = upload_resume_to_storage(&state.s3, &state.config, bytes, &filename).await?;

    match &resume_text {
        Some(text) => info!("Application processed: {} characters extracted", text.len()),
        None => warn!(
            "Application uploaded but text extraction failed: {}",
            extraction_error.as_deref().unwrap_or("unknown reason")
        ),
    }

    Ok(Json(UploadApplicationResponse {
        resume_url,
        resume_text,
        extraction_error,
    }))
}

/// POST /api/schedule-interview
///
/// Creates a booking and sends the confirmation email. Email failure
/// degrades to `emailSent=false` in the response.
pub async fn handle_schedule_interview(
    State(state): State<AppState>,
    Json(req): Json<ScheduleInterviewRequest>,
) -> Result<Json<ScheduleInterviewResponse>, AppError> {
    if req.name.trim().is_empty()
        || req.email.trim().is_empty()
        || req.phone.trim().is_empty()
        || req.datetime.trim().is_empty()
    {
        return Err(AppError::Validation(
            "Missing required fields: name, email, phone, datetime".to_string(),
        ));
    }
    if !req.email.contains('@') || req.email.contains(char::is_whitespace) {
        return Err(AppError::Validation("Invalid email address".to_string()));
    }

    info!("Received schedule request: {} at {}", req.email, req.datetime);

    let scheduled_at = parse_scheduled_at(&req.datetime)?;

    let token = create_booking(
        &state.db,
        NewBooking {
            name: req.name.trim(),
            email: req.email.trim(),
            phone: req.phone.trim(),
            scheduled_at,
            resume_text: req.resume_text.as_deref(),
            resume_url: req.resume_url.as_deref(),
        },
    )
    .await?;

    let interview_url = format!(
        "{}/interview/{token}",
        state.config.frontend_url.trim_end_matches('/')
    );

    let (email_sent, email_error) = match &state.email {
        Some(notifier) => {
            notifier
                .send_interview_email(&req.email, &req.name, &interview_url, scheduled_at)
                .await
        }
        None => (
            false,
            Some("Email notifications are not configured".to_string()),
        ),
    };

    info!("Interview scheduled: {interview_url}");

    Ok(Json(ScheduleInterviewResponse {
        ok: true,
        interview_url,
        email_sent,
        email_error,
    }))
}

/// GET /api/booking/:token
pub async fn handle_get_booking(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<BookingResponse>, AppError> {
    let booking = get_booking(&state.db, &token)
        .await?
        .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;

    Ok(Json(booking.into()))
}
