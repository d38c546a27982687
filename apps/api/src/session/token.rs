//! LiveKit access-token construction for interview sessions.

use std::time::Duration;

use livekit_api::access_token::{AccessToken, AccessTokenError, VideoGrants};
use livekit_protocol as proto;
use serde_json::json;

/// Session tokens are short-lived; the candidate joins right after fetching
/// connection details.
pub const SESSION_TOKEN_TTL: Duration = Duration::from_secs(15 * 60);

pub struct SessionTokenParams<'a> {
    pub api_key: &'a str,
    pub api_secret: &'a str,
    pub identity: &'a str,
    pub display_name: &'a str,
    pub room_name: &'a str,
    /// Agent invited into the room via dispatch; `None` issues a plain
    /// participant token with no agent.
    pub agent_name: Option<&'a str>,
    /// Resume context forwarded to the dispatched agent as metadata.
    pub resume_text: Option<&'a str>,
}

/// Signs a join token scoped to a single room: join, publish, publish-data
/// and subscribe, with an agent dispatch entry when an agent is named.
pub fn build_session_token(params: SessionTokenParams<'_>) -> Result<String, AccessTokenError> {
    let mut token = AccessToken::with_api_key(params.api_key, params.api_secret)
        .with_identity(params.identity)
        .with_name(params.display_name)
        .with_ttl(SESSION_TOKEN_TTL)
        .with_grants(VideoGrants {
            room_join: true,
            room: params.room_name.to_string(),
            can_publish: true,
            can_subscribe: true,
            can_publish_data: true,
            ..Default::default()
        });

    if let Some(agent_name) = params.agent_name {
        let metadata = params
            .resume_text
            .map(|text| json!({ "resume_text": text }).to_string())
            .unwrap_or_default();
        token = token.with_room_config(proto::RoomConfiguration {
            agents: vec![proto::RoomAgentDispatch {
                agent_name: agent_name.to_string(),
                metadata,
            }],
            ..Default::default()
        });
    }

    token.to_jwt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
    use serde::Deserialize;

    const API_KEY: &str = "APItest1234567890";
    const API_SECRET: &str = "secretsecretsecretsecretsecretsecret";

    #[derive(Debug, Deserialize)]
    struct Claims {
        sub: String,
        name: String,
        exp: usize,
        video: VideoClaims,
        #[serde(rename = "roomConfig", alias = "room_config")]
        room_config: Option<serde_json::Value>,
    }

    #[derive(Debug, Default, Deserialize)]
    #[serde(rename_all = "camelCase", default)]
    struct VideoClaims {
        room: String,
        room_join: bool,
        can_publish: bool,
        can_subscribe: bool,
        can_publish_data: bool,
    }

    fn decode_claims(jwt: &str) -> Claims {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        decode::<Claims>(
            jwt,
            &DecodingKey::from_secret(API_SECRET.as_bytes()),
            &validation,
        )
        .expect("token should decode with the issuing secret")
        .claims
    }

    fn params<'a>(agent: Option<&'a str>, resume: Option<&'a str>) -> SessionTokenParams<'a> {
        SessionTokenParams {
            api_key: API_KEY,
            api_secret: API_SECRET,
            identity: "voice_assistant_user_42",
            display_name: "user",
            room_name: "voice_assistant_room_42",
            agent_name: agent,
            resume_text: resume,
        }
    }

    #[test]
    fn test_token_carries_room_scoped_grants() {
        let jwt = build_session_token(params(None, None)).unwrap();
        let claims = decode_claims(&jwt);

        assert_eq!(claims.sub, "voice_assistant_user_42");
        assert_eq!(claims.name, "user");
        assert_eq!(claims.video.room, "voice_assistant_room_42");
        assert!(claims.video.room_join);
        assert!(claims.video.can_publish);
        assert!(claims.video.can_subscribe);
        assert!(claims.video.can_publish_data);
    }

    #[test]
    fn test_token_expires_in_about_fifteen_minutes() {
        let jwt = build_session_token(params(None, None)).unwrap();
        let claims = decode_claims(&jwt);

        let now = chrono::Utc::now().timestamp() as usize;
        let ttl = claims.exp.saturating_sub(now);
        assert!(
            (13 * 60..=16 * 60).contains(&ttl),
            "expected ~15 minute ttl, got {ttl}s"
        );
    }

    #[test]
    fn test_plain_token_has_no_room_config() {
        let jwt = build_session_token(params(None, None)).unwrap();
        let claims = decode_claims(&jwt);
        assert!(claims.room_config.is_none());
    }

    #[test]
    fn test_agent_dispatch_is_attached_without_resume_metadata() {
        let jwt = build_session_token(params(Some("interview-agent"), None)).unwrap();
        let claims = decode_claims(&jwt);

        let rc = claims.room_config.expect("room config should be present");
        let agents = rc["agents"].as_array().expect("agents array");
        assert_eq!(agents.len(), 1);
        let agent = &agents[0];
        let name = agent
            .get("agentName")
            .or_else(|| agent.get("agent_name"))
            .and_then(|v| v.as_str());
        assert_eq!(name, Some("interview-agent"));
        let metadata = agent.get("metadata").and_then(|v| v.as_str()).unwrap_or("");
        assert!(metadata.is_empty(), "no resume metadata expected: {metadata}");
    }

    #[test]
    fn test_resume_text_rides_along_as_dispatch_metadata() {
        let jwt = build_session_token(params(
            Some("interview-agent"),
            Some("10 years of Rust experience"),
        ))
        .unwrap();
        let claims = decode_claims(&jwt);

        let rc = claims.room_config.expect("room config should be present");
        let metadata = rc["agents"][0]["metadata"]
            .as_str()
            .expect("dispatch metadata");
        let parsed: serde_json::Value = serde_json::from_str(metadata).expect("metadata is JSON");
        assert_eq!(
            parsed["resume_text"].as_str(),
            Some("10 years of Rust experience")
        );
    }
}
