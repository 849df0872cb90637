//! Port for outbound email delivery.
use async_trait::async_trait;

use crate::domain::EmailMessage;

use super::define_port_error;

define_port_error! {
    /// Errors raised by mail adapters.
    pub enum MailerError {
        /// The relay could not be reached or refused the session.
        Transport { message: String } [transient] => "mail transport failed: {message}",
        /// The relay permanently refused a message.
        Rejected { message: String } => "mail relay rejected message: {message}",
        /// A message could not be built from its parts.
        InvalidMessage { message: String } => "mail message is invalid: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Deliver a batch over one connection and return the number sent.
    ///
    /// A [`MailerError::Transport`] failure may arrive after part of the
    /// batch was accepted. The task is then retried whole, so delivery is
    /// at-least-once and earlier recipients can receive a duplicate.
    async fn send_mass(&self, messages: &[EmailMessage]) -> Result<usize, MailerError>;
}
