//! Interview agent worker.
//!
//! Registers with LiveKit agent dispatch under the configured agent name
//! and accepts interview jobs as they are assigned. Provider keys for the
//! voice pipeline are checked up front so a misconfigured worker fails at
//! startup, not mid-interview.

use anyhow::{bail, Context, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use interview_api::config::Config;
use interview_api::worker::{self, JobContext, WorkerOptions};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let url = config
        .livekit_url
        .clone()
        .context("LIVEKIT_URL is required for the agent worker")?;
    let api_key = config
        .livekit_api_key
        .clone()
        .context("LIVEKIT_API_KEY is required for the agent worker")?;
    let api_secret = config
        .livekit_api_secret
        .clone()
        .context("LIVEKIT_API_SECRET is required for the agent worker")?;

    // The voice pipeline needs all three providers; refuse to register
    // without them.
    for (value, name) in [
        (&config.google_api_key, "GOOGLE_API_KEY"),
        (&config.deepgram_api_key, "DEEPGRAM_API_KEY"),
        (&config.elevenlabs_api_key, "ELEVENLABS_API_KEY"),
    ] {
        if value.is_none() {
            bail!("{name} is required before the agent can serve interviews");
        }
    }

    info!(
        "Agent worker starting (agent: '{}', server: {url})",
        config.livekit_agent_name
    );

    worker::run(
        WorkerOptions {
            url,
            api_key,
            api_secret,
            agent_name: config.livekit_agent_name.clone(),
        },
        entrypoint,
    )
    .await
}

/// Per-job entry callback: logs the session context handed over by
/// dispatch. The realtime media session runs on the platform against the
/// room credentials in the assignment.
async fn entrypoint(ctx: JobContext) -> Result<()> {
    let room = ctx
        .job
        .room
        .as_ref()
        .map(|r| r.name.clone())
        .unwrap_or_default();

    let resume_chars = serde_json::from_str::<serde_json::Value>(&ctx.job.metadata)
        .ok()
        .and_then(|v| {
            v.get("resume_text")
                .and_then(|t| t.as_str())
                .map(str::len)
        });
    match resume_chars {
        Some(chars) => info!("Interview context loaded ({chars} resume chars)"),
        None => info!("No resume context attached to this session"),
    }

    info!(
        "Session starting in room '{room}' at {} (credential: {} chars)",
        ctx.room_url,
        ctx.room_token.len()
    );

    Ok(())
}
