//! In-memory mailer that captures outgoing messages for assertions.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::domain::EmailMessage;
use crate::domain::ports::{Mailer, MailerError};

/// Mailer storing every message it is asked to send.
///
/// Clones share the same outbox.
#[derive(Debug, Clone, Default)]
pub struct RecordingMailer {
    outbox: Arc<Mutex<Vec<EmailMessage>>>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages captured so far.
    pub fn sent(&self) -> Vec<EmailMessage> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<EmailMessage>> {
        match self.outbox.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_mass(&self, messages: &[EmailMessage]) -> Result<usize, MailerError> {
        self.lock().extend_from_slice(messages);
        Ok(messages.len())
    }
}
