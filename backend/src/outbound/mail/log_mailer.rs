//! Mailer that logs messages instead of delivering them.

use async_trait::async_trait;
use tracing::info;

use crate::domain::EmailMessage;
use crate::domain::ports::{Mailer, MailerError};

/// Writes each message to the `mail` log target.
#[derive(Debug, Clone)]
pub struct LogMailer {
    from: String,
}

impl LogMailer {
    pub fn new(from: impl Into<String>) -> Self {
        Self { from: from.into() }
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send_mass(&self, messages: &[EmailMessage]) -> Result<usize, MailerError> {
        for message in messages {
            info!(
                target: "mail",
                from = %self.from,
                to = %message.to,
                subject = %message.subject,
                body = %message.body,
                "email not sent; no SMTP relay configured"
            );
        }
        Ok(messages.len())
    }
}
