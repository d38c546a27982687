//! Registration client for the LiveKit agent-dispatch endpoint.
//!
//! The worker opens the platform's `/agent` websocket, registers under the
//! configured agent name, answers availability checks, and hands each job
//! assignment to the entrypoint callback. There is no retry or backoff
//! here; restart policy belongs to the process supervisor.

use std::future::Future;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use futures_util::{SinkExt, StreamExt};
use livekit_api::access_token::{AccessToken, VideoGrants};
use livekit_protocol as proto;
use prost::Message as _;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::AUTHORIZATION;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{error, info, warn};
use uuid::Uuid;

pub struct WorkerOptions {
    pub url: String,
    pub api_key: String,
    pub api_secret: String,
    pub agent_name: String,
}

/// Everything an entrypoint needs to join the session it was assigned.
pub struct JobContext {
    pub job: proto::Job,
    pub room_url: String,
    pub room_token: String,
}

/// Registers with agent dispatch and serves jobs until the socket closes.
/// Each assignment runs the entrypoint on its own task.
pub async fn run<F, Fut>(opts: WorkerOptions, entrypoint: F) -> Result<()>
where
    F: Fn(JobContext) -> Fut,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    let jwt = worker_token(&opts)?;
    let endpoint = agent_endpoint(&opts.url)?;

    let mut request = endpoint
        .as_str()
        .into_client_request()
        .with_context(|| format!("Invalid agent dispatch endpoint '{endpoint}'"))?;
    request
        .headers_mut()
        .insert(AUTHORIZATION, format!("Bearer {jwt}").parse()?);

    info!("Connecting to agent dispatch at {endpoint}");
    let (mut ws, _response) = tokio_tungstenite::connect_async(request)
        .await
        .with_context(|| format!("Failed to connect to {endpoint}"))?;

    let register = proto::WorkerMessage {
        message: Some(proto::worker_message::Message::Register(
            proto::RegisterWorkerRequest {
                r#type: proto::JobType::JtRoom as i32,
                agent_name: opts.agent_name.clone(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Default::default()
            },
        )),
    };
    ws.send(WsMessage::Binary(register.encode_to_vec().into()))
        .await?;
    info!(
        "Registration sent (agent: '{}'), waiting for job dispatch...",
        opts.agent_name
    );

    while let Some(frame) = ws.next().await {
        let frame = frame.context("Agent dispatch socket error")?;
        match frame {
            WsMessage::Binary(data) => {
                let server_message = match proto::ServerMessage::decode(data.as_ref()) {
                    Ok(m) => m,
                    Err(e) => {
                        warn!("Undecodable dispatch frame ({} bytes): {e}", data.len());
                        continue;
                    }
                };
                if let Some(reply) = handle_server_message(server_message, &opts, &entrypoint) {
                    ws.send(WsMessage::Binary(reply.encode_to_vec().into()))
                        .await?;
                }
            }
            WsMessage::Close(_) => {
                info!("Agent dispatch closed the connection");
                break;
            }
            _ => {}
        }
    }

    Ok(())
}

fn handle_server_message<F, Fut>(
    message: proto::ServerMessage,
    opts: &WorkerOptions,
    entrypoint: &F,
) -> Option<proto::WorkerMessage>
where
    F: Fn(JobContext) -> Fut,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    match message.message? {
        proto::server_message::Message::Register(resp) => {
            info!("Registered with agent dispatch (worker id: {})", resp.worker_id);
            None
        }
        proto::server_message::Message::Availability(availability) => {
            let job = availability.job.unwrap_or_default();
            info!("Availability check for job {}", job.id);
            Some(proto::WorkerMessage {
                message: Some(proto::worker_message::Message::Availability(
                    proto::AvailabilityResponse {
                        job_id: job.id.clone(),
                        available: true,
                        supports_resume: false,
                        participant_identity: format!("agent-{}", job.id),
                        participant_name: opts.agent_name.clone(),
                        ..Default::default()
                    },
                )),
            })
        }
        proto::server_message::Message::Assignment(assignment) => {
            let job = assignment.job.unwrap_or_default();
            let room = job.room.as_ref().map(|r| r.name.clone()).unwrap_or_default();
            info!("Job {} assigned (room '{room}')", job.id);

            let job_id = job.id.clone();
            let ctx = JobContext {
                room_url: assignment
                    .url
                    .filter(|u| !u.is_empty())
                    .unwrap_or_else(|| opts.url.clone()),
                room_token: assignment.token,
                job,
            };
            let session = entrypoint(ctx);
            let spawned_job_id = job_id.clone();
            tokio::spawn(async move {
                if let Err(e) = session.await {
                    error!("Session for job {spawned_job_id} failed: {e:#}");
                }
            });

            Some(proto::WorkerMessage {
                message: Some(proto::worker_message::Message::UpdateJob(
                    proto::UpdateJobStatus {
                        job_id,
                        status: proto::JobStatus::JsRunning as i32,
                        ..Default::default()
                    },
                )),
            })
        }
        proto::server_message::Message::Termination(termination) => {
            info!("Job {} terminated by the server", termination.job_id);
            None
        }
        _ => None,
    }
}

fn worker_token(opts: &WorkerOptions) -> Result<String> {
    let identity = format!("{}-worker-{}", opts.agent_name, Uuid::new_v4().simple());
    AccessToken::with_api_key(&opts.api_key, &opts.api_secret)
        .with_identity(&identity)
        .with_ttl(Duration::from_secs(3600))
        .with_grants(VideoGrants {
            agent: true,
            ..Default::default()
        })
        .to_jwt()
        .map_err(|e| anyhow!("Failed to sign worker token: {e}"))
}

/// Maps the configured server URL onto the websocket dispatch endpoint.
fn agent_endpoint(base: &str) -> Result<String> {
    let base = base.trim_end_matches('/');
    let ws_base = if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{rest}")
    } else if base.starts_with("wss://") || base.starts_with("ws://") {
        base.to_string()
    } else {
        return Err(anyhow!(
            "Unsupported LiveKit URL '{base}': expected ws(s):// or http(s)://"
        ));
    };
    let endpoint = format!("{ws_base}/agent");
    url::Url::parse(&endpoint).with_context(|| format!("Invalid LiveKit URL '{base}'"))?;
    Ok(endpoint)
}

#[cfg(test)]
mod tests {
    use super::agent_endpoint;

    #[test]
    fn test_agent_endpoint_maps_http_schemes_to_websocket() {
        assert_eq!(
            agent_endpoint("https://cloud.livekit.example").unwrap(),
            "wss://cloud.livekit.example/agent"
        );
        assert_eq!(
            agent_endpoint("http://localhost:7880/").unwrap(),
            "ws://localhost:7880/agent"
        );
    }

    #[test]
    fn test_agent_endpoint_keeps_websocket_schemes() {
        assert_eq!(
            agent_endpoint("wss://cloud.livekit.example").unwrap(),
            "wss://cloud.livekit.example/agent"
        );
    }

    #[test]
    fn test_agent_endpoint_rejects_other_schemes() {
        assert!(agent_endpoint("ftp://cloud.livekit.example").is_err());
    }
}
