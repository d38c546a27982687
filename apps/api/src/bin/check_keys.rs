//! Credential validation CLI.
//!
//! Probes every configured provider with one lightweight authenticated
//! request and prints a pass/fail summary. Exits 0 only when all required
//! providers validate; 1 otherwise, including on interruption.

use std::process;

use anyhow::Result;

use interview_api::booking::store::build_s3_client;
use interview_api::config::Config;
use interview_api::diagnostics::{self, CredentialReport, CredentialStatus};
use interview_api::email::EmailNotifier;

#[tokio::main]
async fn main() {
    let exit_code = tokio::select! {
        code = run() => code.unwrap_or_else(|e| {
            eprintln!("Unexpected error: {e:#}");
            1
        }),
        _ = tokio::signal::ctrl_c() => {
            eprintln!("\nValidation cancelled");
            1
        }
    };
    process::exit(exit_code);
}

async fn run() -> Result<i32> {
    let config = Config::from_env()?;

    println!("Credential validation");
    println!("=====================");

    let http = reqwest::Client::builder()
        .timeout(diagnostics::PROBE_TIMEOUT)
        .build()?;
    let s3 = build_s3_client(&config).await;
    let email = EmailNotifier::from_config(&config);

    // Probes run sequentially and never abort each other.
    let reports = vec![
        diagnostics::check_gemini(&http, config.google_api_key.as_deref()).await,
        diagnostics::check_deepgram(&http, config.deepgram_api_key.as_deref()).await,
        diagnostics::check_elevenlabs(&http, config.elevenlabs_api_key.as_deref()).await,
        diagnostics::check_livekit(
            config.livekit_url.as_deref(),
            config.livekit_api_key.as_deref(),
            config.livekit_api_secret.as_deref(),
        ),
        diagnostics::check_database(&config.database_url).await,
        diagnostics::check_storage(&s3, &config.s3_bucket).await,
        diagnostics::check_smtp(email.as_ref()).await,
    ];

    for r in &reports {
        print_report(r);
    }

    let failed: Vec<&str> = reports
        .iter()
        .filter(|r| !r.passed())
        .map(|r| r.provider)
        .collect();

    println!("---------------------");
    if failed.is_empty() {
        println!("All required provider credentials are valid.");
        Ok(0)
    } else {
        println!("Invalid or missing credentials: {}", failed.join(", "));
        Ok(1)
    }
}

fn print_report(r: &CredentialReport) {
    let (tag, detail) = match &r.status {
        CredentialStatus::Valid => ("ok", String::new()),
        CredentialStatus::AssumedValid(note) => ("ok", format!("assumed valid: {note}")),
        CredentialStatus::QuotaExceeded => ("warn", "valid key, but quota exceeded".to_string()),
        CredentialStatus::NotConfigured if !r.required => {
            ("skip", "not configured (optional)".to_string())
        }
        CredentialStatus::NotConfigured => ("FAIL", "not configured".to_string()),
        CredentialStatus::Invalid(msg) => ("FAIL", msg.clone()),
    };
    if detail.is_empty() {
        println!("  [{tag:>4}] {}", r.provider);
    } else {
        println!("  [{tag:>4}] {} - {detail}", r.provider);
    }
}
