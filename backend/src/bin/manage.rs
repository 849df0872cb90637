//! Management commands run against the configured database.
//!
//! ```text
//! newspaper-manage migrate
//! newspaper-manage create-category "Science"
//! newspaper-manage send-digest
//! ```

use std::ffi::OsString;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr, eyre};
use mockable::DefaultClock;
use ortho_config::OrthoConfig;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

use newspaper::config::AppSettings;
use newspaper::domain::ports::CategoriesCommand;
use newspaper::domain::{CategoriesService, CategoryTitle, NotificationService};
use newspaper::outbound::mail::ConfiguredMailer;
use newspaper::outbound::persistence::{
    DbPool, DieselCategoryRepository, DieselPostRepository, DieselUserRepository,
    run_pending_migrations,
};

#[derive(Debug, Parser)]
#[command(name = "newspaper-manage", about = "Newspaper maintenance commands")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Apply pending database migrations.
    Migrate,
    /// Create a category; titles are unique.
    CreateCategory { title: String },
    /// Send the weekly digest now instead of waiting for the beat.
    SendDigest,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init()
        .map_err(|err| eyre!("tracing init failed: {err}"))?;

    let cli = Cli::parse();
    // Subcommands own the command line; settings come from env and files.
    let settings = AppSettings::load_from_iter([OsString::from("newspaper-manage")])
        .map_err(|err| eyre!("failed to load settings: {err}"))?;
    let pool_config = settings
        .pool_config()
        .ok_or_else(|| eyre!("NEWSPAPER_DATABASE_URL must be set"))?;

    match cli.command {
        Command::Migrate => {
            let applied = run_pending_migrations(pool_config.database_url()).await?;
            info!(applied, "migrations complete");
        }
        Command::CreateCategory { title } => {
            let pool = DbPool::new(pool_config.clone()).await?;
            let service = CategoriesService::new(
                Arc::new(DieselCategoryRepository::new(pool.clone())),
                Arc::new(DieselPostRepository::new(pool.clone())),
                Arc::new(DieselUserRepository::new(pool)),
            );
            let title = CategoryTitle::new(&title).wrap_err("category title")?;
            let category = service
                .create(title)
                .await
                .map_err(|err| eyre!("{}", err.message()))?;
            info!(id = category.id.get(), title = %category.title, "category created");
        }
        Command::SendDigest => {
            let pool = DbPool::new(pool_config.clone()).await?;
            let mailer = ConfiguredMailer::from_settings(settings.smtp()?, &settings.mail_from()?)
                .wrap_err("mail configuration")?;
            let service = NotificationService::new(
                Arc::new(DieselPostRepository::new(pool.clone())),
                Arc::new(DieselCategoryRepository::new(pool)),
                Arc::new(mailer),
                Arc::new(DefaultClock),
                settings.site_url()?,
            );
            let report = service
                .send_weekly_digest()
                .await
                .wrap_err("weekly digest")?;
            info!(emails_sent = report.emails_sent, "weekly digest sent");
        }
    }
    Ok(())
}
