use axum::{extract::State, Json};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::booking::store::get_booking;
use crate::errors::AppError;
use crate::session::token::{build_session_token, SessionTokenParams};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ConnectionDetailsRequest {
    /// Client-proposed room configuration; only `agents[0].agent_name` is
    /// honored, everything else is server-controlled.
    #[serde(default)]
    pub room_config: Option<serde_json::Value>,
    /// Booking token; when it resolves to a booking with resume text, that
    /// text is forwarded to the agent as interview context.
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionDetailsResponse {
    pub server_url: String,
    pub room_name: String,
    pub participant_name: String,
    pub participant_token: String,
}

/// POST /api/connection-details
///
/// Issues a signed LiveKit join token for a fresh interview room, with the
/// interviewer agent attached via dispatch.
pub async fn handle_connection_details(
    State(state): State<AppState>,
    Json(req): Json<ConnectionDetailsRequest>,
) -> Result<Json<ConnectionDetailsResponse>, AppError> {
    let server_url = required_credential(&state.config.livekit_url, "LIVEKIT_URL")?;
    let api_key = required_credential(&state.config.livekit_api_key, "LIVEKIT_API_KEY")?;
    let api_secret = required_credential(&state.config.livekit_api_secret, "LIVEKIT_API_SECRET")?;

    let agent_name = agent_name_from_request(req.room_config.as_ref())
        .unwrap_or_else(|| state.config.livekit_agent_name.clone());

    let resume_text = match &req.token {
        Some(token) => match get_booking(&state.db, token).await {
            Ok(Some(booking)) => {
                if let Some(text) = &booking.resume_text {
                    info!(
                        "Found resume text for booking {token} ({} chars)",
                        text.len()
                    );
                }
                booking.resume_text
            }
            Ok(None) => None,
            Err(e) => {
                // Context is best-effort; the session still starts without it.
                warn!("Failed to fetch booking for resume context: {e}");
                None
            }
        },
        None => None,
    };

    let (user_suffix, room_suffix) = {
        let mut rng = rand::thread_rng();
        (rng.gen_range(1..=99999u32), rng.gen_range(1..=99999u32))
    };
    let participant_name = "user".to_string();
    let participant_identity = format!("voice_assistant_user_{user_suffix}");
    let room_name = format!("voice_assistant_room_{room_suffix}");

    let participant_token = build_session_token(SessionTokenParams {
        api_key,
        api_secret,
        identity: &participant_identity,
        display_name: &participant_name,
        room_name: &room_name,
        agent_name: Some(&agent_name),
        resume_text: resume_text.as_deref(),
    })?;

    info!(
        "Issued connection details: room={room_name} identity={participant_identity} agent={agent_name}"
    );

    Ok(Json(ConnectionDetailsResponse {
        server_url: server_url.to_string(),
        room_name,
        participant_name,
        participant_token,
    }))
}

fn required_credential<'a>(value: &'a Option<String>, var: &str) -> Result<&'a str, AppError> {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::Config(format!("{var} is not configured")))
}

/// Pulls `agents[0].agent_name` out of the client's room configuration.
fn agent_name_from_request(room_config: Option<&serde_json::Value>) -> Option<String> {
    room_config?
        .get("agents")?
        .as_array()?
        .first()?
        .get("agent_name")?
        .as_str()
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_agent_name_extracted_from_room_config() {
        let rc = json!({ "agents": [{ "agent_name": "custom-interviewer" }] });
        assert_eq!(
            agent_name_from_request(Some(&rc)),
            Some("custom-interviewer".to_string())
        );
    }

    #[test]
    fn test_agent_name_absent_for_empty_or_malformed_config() {
        assert_eq!(agent_name_from_request(None), None);
        assert_eq!(agent_name_from_request(Some(&json!({}))), None);
        assert_eq!(
            agent_name_from_request(Some(&json!({ "agents": [] }))),
            None
        );
        assert_eq!(
            agent_name_from_request(Some(&json!({ "agents": [{ "agent_name": "" }] }))),
            None
        );
        assert_eq!(
            agent_name_from_request(Some(&json!({ "agents": "oops" }))),
            None
        );
    }

    #[test]
    fn test_missing_credentials_are_config_errors() {
        let err = required_credential(&None, "LIVEKIT_URL").unwrap_err();
        match err {
            AppError::Config(msg) => assert_eq!(msg, "LIVEKIT_URL is not configured"),
            other => panic!("expected Config error, got {other:?}"),
        }
    }
}
