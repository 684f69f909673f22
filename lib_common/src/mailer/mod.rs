//! # Mailer Module
//!
//! Queued email dispatch. Callers hand a message to [`MailerHandle::queue`]
//! and move on; a single consumer task owns delivery and logs the outcome of
//! every message, so failures are observable instead of vanishing inside a
//! detached thread. Actual delivery goes to an HTTP mail relay; SMTP is the
//! relay's problem, not ours.

use std::time::Duration;

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// HTML templates for the notification emails.
pub mod templates;

/// Delivery timeout for one relay call.
const RELAY_TIMEOUT: Duration = Duration::from_secs(10);

/// How many messages may wait in the queue before new ones are dropped.
const QUEUE_DEPTH: usize = 64;

/// One outbound email.
#[derive(Debug, Clone, Serialize)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

/// Relay endpoint configuration.
#[derive(Debug, Clone)]
pub struct MailerConfig {
    /// URL the consumer POSTs each message to.
    pub relay_url: String,
    /// Value for the message's `from` field.
    pub sender: String,
}

#[derive(Serialize)]
struct RelayPayload<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html: &'a str,
}

/// Cloneable handle for queuing messages from request handlers.
#[derive(Clone)]
pub struct MailerHandle {
    tx: mpsc::Sender<EmailMessage>,
}

impl MailerHandle {
    /// Fire-and-forget enqueue. A full or closed queue drops the message
    /// with a warning; email must never fail the originating request.
    pub fn queue(&self, message: EmailMessage) {
        if let Err(e) = self.tx.try_send(message) {
            let message = match &e {
                mpsc::error::TrySendError::Full(m) => m,
                mpsc::error::TrySendError::Closed(m) => m,
            };
            warn!("mail queue unavailable, dropping message to {}", message.to);
        }
    }
}

/// # Mailer
///
/// Owns the consumer task. [`Mailer::spawn`] starts it and returns the
/// handle used by the rest of the application.
pub struct Mailer;

impl Mailer {
    /// Starts the consumer task and returns a handle for producers.
    pub fn spawn(config: MailerConfig) -> MailerHandle {
        let (tx, rx) = mpsc::channel(QUEUE_DEPTH);
        tokio::spawn(deliver_loop(config, rx));
        MailerHandle { tx }
    }
}

/// Consumer loop: one relay call per message, outcome logged per message.
async fn deliver_loop(config: MailerConfig, mut rx: mpsc::Receiver<EmailMessage>) {
    let client = reqwest::Client::builder()
        .timeout(RELAY_TIMEOUT)
        .build()
        .unwrap_or_default(); // Fallback to a default client if builder fails.

    while let Some(message) = rx.recv().await {
        let payload = RelayPayload {
            from: &config.sender,
            to: &message.to,
            subject: &message.subject,
            html: &message.html_body,
        };

        match client.post(&config.relay_url).json(&payload).send().await {
            Ok(response) if response.status().is_success() => {
                info!("email '{}' delivered to {}", message.subject, message.to);
            }
            Ok(response) => {
                warn!(
                    "mail relay rejected '{}' for {}: {}",
                    message.subject,
                    message.to,
                    response.status()
                );
            }
            Err(e) => {
                warn!("mail relay call failed for {}: {e}", message.to);
            }
        }
    }

    info!("mail queue closed, consumer exiting");
}
