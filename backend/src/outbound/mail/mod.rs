//! Mail delivery adapters implementing the [`Mailer`] port.
//!
//! - [`SmtpMailer`] relays through an SMTP server with lettre.
//! - [`LogMailer`] writes each message to the log instead of sending it; used
//!   in development when no relay is configured.
//! - [`ConfiguredMailer`] picks one of the two from settings.

mod log_mailer;
#[cfg(any(test, feature = "test-support"))]
mod recording;
mod smtp;

use async_trait::async_trait;

use crate::domain::ports::{Mailer, MailerError};
use crate::domain::{EmailAddress, EmailMessage};

pub use log_mailer::LogMailer;
#[cfg(any(test, feature = "test-support"))]
pub use recording::RecordingMailer;
pub use smtp::{SmtpConfig, SmtpMailer, SmtpSecurity};

/// Mailer selected at startup.
#[derive(Clone)]
pub enum ConfiguredMailer {
    Smtp(SmtpMailer),
    Log(LogMailer),
}

impl ConfiguredMailer {
    /// SMTP when a relay is configured, log-only otherwise.
    pub fn from_settings(
        smtp: Option<SmtpConfig>,
        from: &EmailAddress,
    ) -> Result<Self, MailerError> {
        match smtp {
            Some(config) => Ok(Self::Smtp(SmtpMailer::new(config, from)?)),
            None => Ok(Self::Log(LogMailer::new(from.as_ref()))),
        }
    }
}

#[async_trait]
impl Mailer for ConfiguredMailer {
    async fn send_mass(&self, messages: &[EmailMessage]) -> Result<usize, MailerError> {
        match self {
            Self::Smtp(mailer) => mailer.send_mass(messages).await,
            Self::Log(mailer) => mailer.send_mass(messages).await,
        }
    }
}
