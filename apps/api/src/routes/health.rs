use axum::Json;
use serde_json::{json, Value};

/// GET /
/// Returns a simple status object with the service identity.
pub async fn root_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "interview-scheduling-api"
    }))
}
