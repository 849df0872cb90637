//! Application settings loaded via OrthoConfig.
//!
//! Every field can come from the command line, a configuration file or a
//! `NEWSPAPER_`-prefixed environment variable. Unset values fall back to the
//! development defaults below.

use std::net::SocketAddr;
use std::time::Duration;

use cron::Schedule;
use ortho_config::OrthoConfig;
use serde::Deserialize;
use zeroize::Zeroizing;

use crate::domain::{DEFAULT_MAX_POSTS_PER_DAY, DailyPostLimit, EmailAddress, SiteUrl};
use crate::inbound::beat::{DEFAULT_DIGEST_CRON, parse_schedule};
use crate::outbound::mail::{SmtpConfig, SmtpSecurity};
use crate::outbound::persistence::{DEFAULT_POOL_SIZE, PoolConfig};
use crate::outbound::queue::RetryPolicy;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_SITE_URL: &str = "http://localhost:8080";
const DEFAULT_MAIL_FROM: &str = "noreply@newspaper.local";

/// Invalid value in [`AppSettings`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid {field}: {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
}

impl ConfigError {
    fn invalid(field: &'static str, message: impl ToString) -> Self {
        Self::Invalid {
            field,
            message: message.to_string(),
        }
    }
}

/// Runtime configuration for the server, worker and management CLI.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "NEWSPAPER")]
pub struct AppSettings {
    /// Socket address the HTTP server binds to.
    #[ortho_config(default = DEFAULT_BIND_ADDR.to_owned())]
    pub bind_addr: String,
    /// PostgreSQL URL; the in-memory store is used when absent.
    pub database_url: Option<String>,
    /// Upper bound on pooled database connections.
    pub db_pool_size: Option<u32>,
    /// Seconds to wait for a free connection.
    pub db_checkout_timeout_secs: Option<u64>,
    /// Public base URL used for links in outgoing mail.
    pub site_url: Option<String>,
    /// Sender address of notification and digest mail.
    pub mail_from: Option<String>,
    /// SMTP relay host; mail is only logged when absent.
    pub smtp_host: Option<String>,
    pub smtp_port: Option<u16>,
    /// `tls`, `starttls` or `plain`.
    pub smtp_security: Option<String>,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    /// Six-field cron expression for the weekly digest.
    pub digest_cron: Option<String>,
    /// Attempts per background task, including the first.
    pub task_max_attempts: Option<u32>,
    /// Delay before the first retry, in milliseconds.
    pub task_initial_backoff_ms: Option<u64>,
    /// Posts an author may create within 24 hours.
    pub max_posts_per_day: Option<u32>,
}

impl AppSettings {
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind_addr
            .parse()
            .map_err(|err| ConfigError::invalid("bind_addr", err))
    }

    /// Pool settings for `database_url`, or `None` to run in memory.
    pub fn pool_config(&self) -> Option<PoolConfig> {
        let url = self.database_url.as_deref()?;
        let config =
            PoolConfig::new(url).with_max_size(self.db_pool_size.unwrap_or(DEFAULT_POOL_SIZE));
        Some(match self.db_checkout_timeout_secs {
            Some(secs) => config.with_checkout_timeout(Duration::from_secs(secs)),
            None => config,
        })
    }

    pub fn site_url(&self) -> Result<SiteUrl, ConfigError> {
        SiteUrl::parse(self.site_url.as_deref().unwrap_or(DEFAULT_SITE_URL))
            .map_err(|err| ConfigError::invalid("site_url", err))
    }

    pub fn mail_from(&self) -> Result<EmailAddress, ConfigError> {
        EmailAddress::new(self.mail_from.as_deref().unwrap_or(DEFAULT_MAIL_FROM))
            .map_err(|err| ConfigError::invalid("mail_from", err))
    }

    /// SMTP relay settings, or `None` when mail should only be logged.
    pub fn smtp(&self) -> Result<Option<SmtpConfig>, ConfigError> {
        let Some(host) = self.smtp_host.as_deref().map(str::trim) else {
            return Ok(None);
        };
        if host.is_empty() {
            return Ok(None);
        }
        let security = match self
            .smtp_security
            .as_deref()
            .map(|raw| raw.trim().to_ascii_lowercase())
            .as_deref()
        {
            None | Some("tls") => SmtpSecurity::Tls,
            Some("starttls") => SmtpSecurity::StartTls,
            Some("plain") => SmtpSecurity::Plain,
            Some(other) => {
                return Err(ConfigError::invalid(
                    "smtp_security",
                    format!("expected tls, starttls or plain, got {other:?}"),
                ));
            }
        };
        Ok(Some(SmtpConfig {
            host: host.to_owned(),
            port: self.smtp_port,
            security,
            username: self.smtp_username.clone(),
            password: self.smtp_password.clone().map(Zeroizing::new),
        }))
    }

    pub fn digest_schedule(&self) -> Result<Schedule, ConfigError> {
        parse_schedule(self.digest_cron.as_deref().unwrap_or(DEFAULT_DIGEST_CRON))
            .map_err(|err| ConfigError::invalid("digest_cron", err))
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        let defaults = RetryPolicy::default();
        RetryPolicy {
            max_attempts: self.task_max_attempts.unwrap_or(defaults.max_attempts).max(1),
            initial_backoff: self
                .task_initial_backoff_ms
                .map_or(defaults.initial_backoff, Duration::from_millis),
            max_backoff: defaults.max_backoff,
        }
    }

    pub fn post_limit(&self) -> DailyPostLimit {
        DailyPostLimit::new(self.max_posts_per_day.unwrap_or(DEFAULT_MAX_POSTS_PER_DAY))
    }
}
