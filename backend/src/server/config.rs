//! HTTP server configuration object and helpers.

use std::net::SocketAddr;

use newspaper::domain::{DailyPostLimit, SiteUrl};
use newspaper::inbound::http::session_config::SessionSettings;
use newspaper::outbound::mail::ConfiguredMailer;
use newspaper::outbound::persistence::DbPool;

#[cfg(feature = "metrics")]
use actix_web_prom::PrometheusMetrics;

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) session: SessionSettings,
    pub(crate) bind_addr: SocketAddr,
    pub(crate) db_pool: Option<DbPool>,
    pub(crate) mailer: ConfiguredMailer,
    pub(crate) site: SiteUrl,
    pub(crate) post_limit: DailyPostLimit,
    #[cfg(feature = "metrics")]
    pub(crate) prometheus: Option<PrometheusMetrics>,
}

impl ServerConfig {
    /// Construct a configuration that serves from the in-memory store.
    #[must_use]
    pub fn new(
        session: SessionSettings,
        bind_addr: SocketAddr,
        mailer: ConfiguredMailer,
        site: SiteUrl,
    ) -> Self {
        Self {
            session,
            bind_addr,
            db_pool: None,
            mailer,
            site,
            post_limit: DailyPostLimit::default(),
            #[cfg(feature = "metrics")]
            prometheus: None,
        }
    }

    /// Attach a database connection pool; repositories switch to Diesel.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    #[must_use]
    pub fn with_post_limit(mut self, limit: DailyPostLimit) -> Self {
        self.post_limit = limit;
        self
    }

    #[cfg(feature = "metrics")]
    /// Attach Prometheus middleware to the configuration.
    #[must_use]
    pub fn with_metrics(mut self, prometheus: Option<PrometheusMetrics>) -> Self {
        self.prometheus = prometheus;
        self
    }
}
