//! Backend entry-point: loads settings, runs migrations, and starts the HTTP
//! server, the task worker and the digest beat.

mod server;

use std::sync::Arc;

use actix_web::web;
#[cfg(feature = "metrics")]
use actix_web_prom::PrometheusMetricsBuilder;
use color_eyre::eyre::{Result, WrapErr, eyre};
use mockable::{DefaultClock, DefaultEnv};
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use newspaper::config::AppSettings;
use newspaper::inbound::beat::{Beat, PeriodicTask};
use newspaper::inbound::http::health::HealthState;
use newspaper::inbound::http::session_config::{BuildMode, session_settings_from_env};
use newspaper::outbound::mail::ConfiguredMailer;
use newspaper::outbound::persistence::{DbPool, run_pending_migrations};
use newspaper::outbound::queue::{DEFAULT_QUEUE_CAPACITY, InProcessTaskQueue, TaskWorker};
use server::{ServerConfig, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = AppSettings::load_from_iter(std::env::args_os())
        .map_err(|err| eyre!("failed to load settings: {err}"))?;
    let session = session_settings_from_env(&DefaultEnv::new(), BuildMode::from_debug_assertions())
        .wrap_err("session configuration")?;
    let mailer = ConfiguredMailer::from_settings(settings.smtp()?, &settings.mail_from()?)
        .wrap_err("mail configuration")?;

    let mut config = ServerConfig::new(session, settings.bind_addr()?, mailer, settings.site_url()?)
        .with_post_limit(settings.post_limit());
    match settings.pool_config() {
        Some(pool_config) => {
            run_pending_migrations(pool_config.database_url()).await?;
            let pool = DbPool::new(pool_config).await?;
            config = config.with_db_pool(pool);
        }
        None => warn!("NEWSPAPER_DATABASE_URL unset; serving from the in-memory store"),
    }
    #[cfg(feature = "metrics")]
    {
        config = config.with_metrics(Some(make_metrics()?));
    }

    let (queue, receiver) = InProcessTaskQueue::channel(DEFAULT_QUEUE_CAPACITY);
    let queue = Arc::new(queue);
    let health_state = web::Data::new(HealthState::new());
    let (server, task_handler) = create_server(health_state.clone(), config, queue.clone())?;

    let worker = TaskWorker::new(task_handler, settings.retry_policy());
    actix_web::rt::spawn(worker.run(receiver));
    let beat = Beat::new(
        vec![PeriodicTask::weekly_digest(settings.digest_schedule()?)],
        queue,
        Arc::new(DefaultClock),
    );
    actix_web::rt::spawn(beat.run());

    health_state.mark_ready();
    info!("newspaper backend ready");
    let result = server.await;
    health_state.mark_unhealthy();
    result.wrap_err("http server failed")
}

#[cfg(feature = "metrics")]
fn make_metrics() -> Result<actix_web_prom::PrometheusMetrics> {
    PrometheusMetricsBuilder::new("newspaper")
        .endpoint("/metrics")
        .build()
        .map_err(|err| eyre!("configure Prometheus metrics: {err}"))
}
