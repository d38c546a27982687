//! Interview confirmation emails over SMTP.
//!
//! Delivery failure is never fatal to scheduling: `send_interview_email`
//! reports `(false, reason)` and the endpoint forwards that to the client.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{info, warn};

use crate::booking::schedule::ist;
use crate::config::Config;

#[derive(Clone)]
pub struct EmailNotifier {
    mailer: Arc<AsyncSmtpTransport<Tokio1Executor>>,
    from: String,
}

impl EmailNotifier {
    /// Builds the notifier from SMTP settings. Returns `None` when SMTP is
    /// not configured, which disables confirmation emails.
    pub fn from_config(config: &Config) -> Option<Self> {
        let host = config.smtp_host.as_deref()?;
        let from = config.smtp_from.as_deref()?.to_string();

        let builder = match AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host) {
            Ok(b) => b.port(config.smtp_port),
            Err(e) => {
                warn!("SMTP relay setup failed for {host}: {e}; emails disabled");
                return None;
            }
        };
        let builder = match (&config.smtp_user, &config.smtp_password) {
            (Some(user), Some(password)) => {
                builder.credentials(Credentials::new(user.clone(), password.clone()))
            }
            _ => builder,
        };

        info!(
            "Email notifier initialized (SMTP {}:{})",
            host, config.smtp_port
        );
        Some(Self {
            mailer: Arc::new(builder.build()),
            from,
        })
    }

    /// Sends the interview confirmation. Returns `(sent, error)`.
    pub async fn send_interview_email(
        &self,
        to: &str,
        name: &str,
        interview_url: &str,
        scheduled_at: DateTime<Utc>,
    ) -> (bool, Option<String>) {
        let message = match self.build_message(to, name, interview_url, scheduled_at) {
            Ok(m) => m,
            Err(reason) => {
                warn!("Failed to build interview email for {to}: {reason}");
                return (false, Some(reason));
            }
        };

        match self.mailer.send(message).await {
            Ok(_) => {
                info!("Interview confirmation sent to {to}");
                (true, None)
            }
            Err(e) => {
                warn!("Interview email to {to} failed: {e}");
                (false, Some(e.to_string()))
            }
        }
    }

    /// Access to the underlying transport for the diagnostic connection probe.
    pub fn transport(&self) -> &AsyncSmtpTransport<Tokio1Executor> {
        &self.mailer
    }

    fn build_message(
        &self,
        to: &str,
        name: &str,
        interview_url: &str,
        scheduled_at: DateTime<Utc>,
    ) -> Result<Message, String> {
        let from: Mailbox = self
            .from
            .parse()
            .map_err(|e| format!("Invalid SMTP_FROM address: {e}"))?;
        let to: Mailbox = to
            .parse()
            .map_err(|e| format!("Invalid recipient address: {e}"))?;

        // Display time in IST, matching the scheduling default.
        let when = scheduled_at
            .with_timezone(&ist())
            .format("%A, %d %B %Y at %H:%M IST");

        let body = format!(
            "Hi {name},\n\n\
             Your interview has been scheduled for {when}.\n\n\
             Join from this link at the scheduled time:\n{interview_url}\n\n\
             The interview is conducted by our AI interviewer and takes about 30 minutes.\n\
             Please keep your resume handy and join from a quiet place.\n\n\
             Good luck!\n"
        );

        Message::builder()
            .from(from)
            .to(to)
            .subject("Your interview is scheduled")
            .header(ContentType::TEXT_PLAIN)
            .body(body)
            .map_err(|e| e.to_string())
    }
}
