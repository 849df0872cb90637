//! SMTP relay adapter backed by lettre.

use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{debug, warn};
use zeroize::Zeroizing;

use crate::domain::ports::{Mailer, MailerError};
use crate::domain::{EmailAddress, EmailMessage};

/// How the SMTP session is secured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SmtpSecurity {
    /// Implicit TLS (usually port 465).
    #[default]
    Tls,
    /// Plain connection upgraded with STARTTLS (usually port 587).
    StartTls,
    /// Unencrypted; only for local relays such as mail catchers.
    Plain,
}

/// Connection settings for [`SmtpMailer`].
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    /// Overrides the default port for the chosen security mode.
    pub port: Option<u16>,
    pub security: SmtpSecurity,
    pub username: Option<String>,
    pub password: Option<Zeroizing<String>>,
}

/// Sends batches over an async SMTP transport.
#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    /// Build a transport for `config` sending as `from`.
    ///
    /// No connection is opened until the first batch is sent.
    pub fn new(config: SmtpConfig, from: &EmailAddress) -> Result<Self, MailerError> {
        let from: Mailbox = from
            .as_ref()
            .parse()
            .map_err(|err| MailerError::invalid_message(format!("from address: {err}")))?;

        let mut builder = match config.security {
            SmtpSecurity::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
                .map_err(|err| MailerError::transport(err.to_string()))?,
            SmtpSecurity::StartTls => {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                    .map_err(|err| MailerError::transport(err.to_string()))?
            }
            SmtpSecurity::Plain => {
                AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
            }
        };
        if let Some(port) = config.port {
            builder = builder.port(port);
        }
        if let (Some(username), Some(password)) = (config.username, config.password) {
            builder = builder.credentials(Credentials::new(username, password.to_string()));
        }

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }

    /// Messages that build; the rest are logged and left out of the batch.
    fn prepare(&self, messages: &[EmailMessage]) -> Vec<Message> {
        messages
            .iter()
            .filter_map(|message| {
                self.build_message(message)
                    .inspect_err(|err| {
                        warn!(recipient = %message.to, error = %err, "skipping unbuildable message");
                    })
                    .ok()
            })
            .collect()
    }

    fn build_message(&self, message: &EmailMessage) -> Result<Message, MailerError> {
        let to: Mailbox = message
            .to
            .as_ref()
            .parse()
            .map_err(|err| MailerError::invalid_message(format!("recipient: {err}")))?;
        Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(message.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(message.body.clone())
            .map_err(|err| MailerError::invalid_message(err.to_string()))
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_mass(&self, messages: &[EmailMessage]) -> Result<usize, MailerError> {
        let prepared = self.prepare(messages);

        let mut sent = 0;
        for email in prepared {
            match self.transport.send(email).await {
                Ok(response) => {
                    sent += 1;
                    debug!(code = %response.code(), "smtp relay accepted message");
                }
                Err(err) => {
                    warn!(sent, total = messages.len(), error = %err, "smtp delivery failed");
                    return Err(if err.is_permanent() {
                        MailerError::rejected(err.to_string())
                    } else {
                        MailerError::transport(err.to_string())
                    });
                }
            }
        }
        Ok(sent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EMAIL_LOCAL_MAX, EMAIL_MAX};
    use rstest::{fixture, rstest};

    #[fixture]
    fn local_relay() -> SmtpMailer {
        let config = SmtpConfig {
            host: "localhost".to_owned(),
            port: Some(1025),
            security: SmtpSecurity::Plain,
            username: None,
            password: None,
        };
        let from = EmailAddress::new("desk@paper.test").expect("valid from address");
        SmtpMailer::new(config, &from).expect("transport builds")
    }

    #[rstest]
    fn builds_plain_text_messages(local_relay: SmtpMailer) {
        let message = EmailMessage {
            to: EmailAddress::new("reader@paper.test").expect("valid address"),
            subject: "Weekly digest".to_owned(),
            body: "News posts in Science:".to_owned(),
        };

        let built = local_relay.build_message(&message).expect("message builds");
        let raw = String::from_utf8(built.formatted()).expect("utf-8 message");
        assert!(raw.contains("From: desk@paper.test"));
        assert!(raw.contains("To: reader@paper.test"));
        assert!(raw.contains("Subject: Weekly digest"));
    }

    #[rstest]
    #[case("o'brien+news@mail.paper.test")]
    #[case("first.last@desk")]
    #[case("x_y%z@paper-test.example")]
    fn every_valid_address_builds(local_relay: SmtpMailer, #[case] raw: &str) {
        let message = EmailMessage {
            to: EmailAddress::new(raw).expect("valid address"),
            subject: "Weekly digest".to_owned(),
            body: String::new(),
        };

        assert_eq!(local_relay.prepare(std::slice::from_ref(&message)).len(), 1);
    }

    #[rstest]
    fn longest_accepted_address_builds(local_relay: SmtpMailer) {
        let raw = format!(
            "{}@{}.{}.{}",
            "a".repeat(EMAIL_LOCAL_MAX),
            "b".repeat(63),
            "c".repeat(63),
            "d".repeat(61)
        );
        assert_eq!(raw.len(), EMAIL_MAX);
        let message = EmailMessage {
            to: EmailAddress::new(&raw).expect("valid address"),
            subject: "Weekly digest".to_owned(),
            body: String::new(),
        };

        assert!(local_relay.build_message(&message).is_ok());
    }

    #[rstest]
    #[tokio::test]
    async fn empty_batches_send_nothing(local_relay: SmtpMailer) {
        assert_eq!(local_relay.send_mass(&[]).await.expect("no-op succeeds"), 0);
    }
}
