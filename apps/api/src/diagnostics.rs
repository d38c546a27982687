//! Outbound credential probes for the `check-keys` diagnostic binary.
//!
//! Every probe is a single lightweight authenticated request (or, for
//! LiveKit, a local token construction) classified into a
//! `CredentialStatus`. Probes never propagate errors: a provider that
//! cannot be reached is reported, and the remaining probes still run.

use std::time::Duration;

use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::Client as S3Client;
use livekit_api::access_token::{AccessToken, VideoGrants};
use sqlx::postgres::PgPoolOptions;
use tokio::time::timeout;

use crate::email::EmailNotifier;

pub const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

const GEMINI_MODELS_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const DEEPGRAM_PROJECTS_URL: &str = "https://api.deepgram.com/v1/projects";
const ELEVENLABS_USER_URL: &str = "https://api.elevenlabs.io/v1/user";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialStatus {
    Valid,
    Invalid(String),
    /// The key is accepted but the account is out of quota.
    QuotaExceeded,
    NotConfigured,
    /// The probe response was ambiguous; treated as valid, with a note.
    AssumedValid(String),
}

#[derive(Debug, Clone)]
pub struct CredentialReport {
    pub provider: &'static str,
    pub required: bool,
    pub status: CredentialStatus,
}

impl CredentialReport {
    /// A report passes unless the credential is invalid, or required but
    /// absent. Quota exhaustion is a warning, not a failure.
    pub fn passed(&self) -> bool {
        match &self.status {
            CredentialStatus::Valid
            | CredentialStatus::AssumedValid(_)
            | CredentialStatus::QuotaExceeded => true,
            CredentialStatus::NotConfigured => !self.required,
            CredentialStatus::Invalid(_) => false,
        }
    }
}

fn report(provider: &'static str, required: bool, status: CredentialStatus) -> CredentialReport {
    CredentialReport {
        provider,
        required,
        status,
    }
}

fn classify_http(status: reqwest::StatusCode) -> CredentialStatus {
    match status.as_u16() {
        200..=299 => CredentialStatus::Valid,
        400 | 401 | 403 => {
            CredentialStatus::Invalid(format!("invalid or expired key (status {status})"))
        }
        429 => CredentialStatus::QuotaExceeded,
        _ => CredentialStatus::AssumedValid(format!("unexpected status {status}")),
    }
}

pub async fn check_gemini(client: &reqwest::Client, api_key: Option<&str>) -> CredentialReport {
    let provider = "Google Gemini (LLM)";
    let Some(key) = api_key else {
        return report(provider, true, CredentialStatus::NotConfigured);
    };
    let status = match client
        .get(GEMINI_MODELS_URL)
        .header("x-goog-api-key", key)
        .send()
        .await
    {
        Ok(resp) => classify_http(resp.status()),
        Err(e) => CredentialStatus::Invalid(format!("request failed: {e}")),
    };
    report(provider, true, status)
}

pub async fn check_deepgram(client: &reqwest::Client, api_key: Option<&str>) -> CredentialReport {
    let provider = "Deepgram (STT)";
    let Some(key) = api_key else {
        return report(provider, true, CredentialStatus::NotConfigured);
    };
    let status = match client
        .get(DEEPGRAM_PROJECTS_URL)
        .header("Authorization", format!("Token {key}"))
        .send()
        .await
    {
        Ok(resp) => classify_http(resp.status()),
        Err(e) => CredentialStatus::Invalid(format!("request failed: {e}")),
    };
    report(provider, true, status)
}

pub async fn check_elevenlabs(client: &reqwest::Client, api_key: Option<&str>) -> CredentialReport {
    let provider = "ElevenLabs (TTS)";
    let Some(key) = api_key else {
        return report(provider, true, CredentialStatus::NotConfigured);
    };
    let status = match client
        .get(ELEVENLABS_USER_URL)
        .header("xi-api-key", key)
        .send()
        .await
    {
        Ok(resp) => classify_http(resp.status()),
        Err(e) => CredentialStatus::Invalid(format!("request failed: {e}")),
    };
    report(provider, true, status)
}

/// LiveKit credentials are validated locally: signing a token exercises the
/// key/secret pair without a network round-trip.
pub fn check_livekit(
    url: Option<&str>,
    api_key: Option<&str>,
    api_secret: Option<&str>,
) -> CredentialReport {
    let provider = "LiveKit";
    let (Some(_), Some(key), Some(secret)) = (url, api_key, api_secret) else {
        return report(provider, true, CredentialStatus::NotConfigured);
    };
    let status = match AccessToken::with_api_key(key, secret)
        .with_identity("diagnostic-probe")
        .with_name("Diagnostic Probe")
        .with_grants(VideoGrants {
            room_join: true,
            room: "diagnostic".to_string(),
            ..Default::default()
        })
        .to_jwt()
    {
        Ok(_) => CredentialStatus::Valid,
        Err(e) => CredentialStatus::Invalid(format!("token construction failed: {e}")),
    };
    report(provider, true, status)
}

pub async fn check_database(database_url: &str) -> CredentialReport {
    let provider = "PostgreSQL";
    let probe = async {
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .connect(database_url)
            .await?;
        sqlx::query("SELECT 1").execute(&pool).await?;
        Ok::<_, sqlx::Error>(())
    };
    let status = match timeout(PROBE_TIMEOUT, probe).await {
        Ok(Ok(())) => CredentialStatus::Valid,
        Ok(Err(e)) => CredentialStatus::Invalid(format!("database probe failed: {e}")),
        Err(_) => CredentialStatus::Invalid("database probe timed out".to_string()),
    };
    report(provider, true, status)
}

pub async fn check_storage(s3: &S3Client, bucket: &str) -> CredentialReport {
    let provider = "S3 storage";
    let status = match timeout(PROBE_TIMEOUT, s3.head_bucket().bucket(bucket).send()).await {
        Ok(Ok(_)) => CredentialStatus::Valid,
        Ok(Err(e)) => {
            let msg = format!("{}", DisplayErrorContext(&e));
            if ["403", "Forbidden", "InvalidAccessKeyId", "SignatureDoesNotMatch", "404", "NotFound"]
                .iter()
                .any(|needle| msg.contains(needle))
            {
                CredentialStatus::Invalid(format!("bucket probe rejected: {msg}"))
            } else {
                CredentialStatus::AssumedValid(format!("bucket probe inconclusive: {msg}"))
            }
        }
        Err(_) => CredentialStatus::Invalid("bucket probe timed out".to_string()),
    };
    report(provider, true, status)
}

/// Email is the one optional provider: scheduling degrades gracefully
/// without it, so absence is not a failure.
pub async fn check_smtp(notifier: Option<&EmailNotifier>) -> CredentialReport {
    let provider = "SMTP email";
    let Some(notifier) = notifier else {
        return report(provider, false, CredentialStatus::NotConfigured);
    };
    let status = match timeout(PROBE_TIMEOUT, notifier.transport().test_connection()).await {
        Ok(Ok(true)) => CredentialStatus::Valid,
        Ok(Ok(false)) => CredentialStatus::Invalid("SMTP server rejected the connection".to_string()),
        Ok(Err(e)) => CredentialStatus::Invalid(format!("SMTP probe failed: {e}")),
        Err(_) => CredentialStatus::Invalid("SMTP probe timed out".to_string()),
    };
    report(provider, false, status)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: u16) -> reqwest::StatusCode {
        reqwest::StatusCode::from_u16(code).unwrap()
    }

    #[test]
    fn test_http_classification() {
        assert_eq!(classify_http(status(200)), CredentialStatus::Valid);
        assert!(matches!(
            classify_http(status(401)),
            CredentialStatus::Invalid(_)
        ));
        assert!(matches!(
            classify_http(status(403)),
            CredentialStatus::Invalid(_)
        ));
        assert_eq!(classify_http(status(429)), CredentialStatus::QuotaExceeded);
        assert!(matches!(
            classify_http(status(503)),
            CredentialStatus::AssumedValid(_)
        ));
    }

    #[test]
    fn test_required_provider_fails_when_invalid_or_missing() {
        assert!(!report("x", true, CredentialStatus::Invalid("bad".into())).passed());
        assert!(!report("x", true, CredentialStatus::NotConfigured).passed());
        assert!(report("x", true, CredentialStatus::Valid).passed());
    }

    #[test]
    fn test_optional_provider_may_be_unconfigured() {
        assert!(report("x", false, CredentialStatus::NotConfigured).passed());
        assert!(!report("x", false, CredentialStatus::Invalid("bad".into())).passed());
    }

    #[test]
    fn test_quota_exhaustion_is_a_pass() {
        assert!(report("x", true, CredentialStatus::QuotaExceeded).passed());
    }

    #[test]
    fn test_livekit_check_requires_all_three_values() {
        let r = check_livekit(Some("wss://lk.example"), Some("key"), None);
        assert_eq!(r.status, CredentialStatus::NotConfigured);
        assert!(!r.passed());
    }

    #[test]
    fn test_livekit_check_signs_a_token_locally() {
        let r = check_livekit(
            Some("wss://lk.example"),
            Some("APIdiagnostic"),
            Some("secretsecretsecretsecretsecret"),
        );
        assert_eq!(r.status, CredentialStatus::Valid);
    }
}
