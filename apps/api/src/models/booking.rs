use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A persisted interview booking. Rows are written once by the scheduling
/// endpoint and never mutated afterwards; `token` is the public lookup key.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BookingRow {
    pub id: Uuid,
    pub token: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub scheduled_at: DateTime<Utc>,
    pub resume_text: Option<String>,
    pub resume_url: Option<String>,
    pub created_at: DateTime<Utc>,
}
