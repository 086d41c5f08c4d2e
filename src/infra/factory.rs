use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use sqlx::{postgres::{PgPoolOptions, PgConnectOptions}, sqlite::{SqlitePoolOptions, SqliteJournalMode, SqliteConnectOptions}};
use sqlx::ConnectOptions;
use tracing::info;
use tracing::log::LevelFilter;

use crate::config::Config;
use crate::error::AppError;
use crate::state::AppState;
use crate::domain::ports::{BookingRepository, EmailService, JobRepository, ListingRepository, UserRepository};
use crate::domain::services::{
    auth_service::AuthService,
    job_queue::JobQueue,
    notification::NotificationDispatcher,
    renderer::{load_templates, NotificationRenderer},
};
use crate::infra::email::{http_email_service::HttpEmailService, log_email_service::LogEmailService};
use crate::infra::repositories::{
    postgres_booking_repo::PostgresBookingRepo, postgres_job_repo::PostgresJobRepo,
    postgres_listing_repo::PostgresListingRepo, postgres_user_repo::PostgresUserRepo,
    sqlite_booking_repo::SqliteBookingRepo, sqlite_job_repo::SqliteJobRepo,
    sqlite_listing_repo::SqliteListingRepo, sqlite_user_repo::SqliteUserRepo,
};

/// Repositories for whichever database backend the URL selects.
pub struct Repositories {
    pub user_repo: Arc<dyn UserRepository>,
    pub listing_repo: Arc<dyn ListingRepository>,
    pub booking_repo: Arc<dyn BookingRepository>,
    pub job_repo: Arc<dyn JobRepository>,
}

impl Repositories {
    pub fn sqlite(pool: sqlx::SqlitePool) -> Self {
        Self {
            user_repo: Arc::new(SqliteUserRepo::new(pool.clone())),
            listing_repo: Arc::new(SqliteListingRepo::new(pool.clone())),
            booking_repo: Arc::new(SqliteBookingRepo::new(pool.clone())),
            job_repo: Arc::new(SqliteJobRepo::new(pool)),
        }
    }

    pub fn postgres(pool: sqlx::PgPool) -> Self {
        Self {
            user_repo: Arc::new(PostgresUserRepo::new(pool.clone())),
            listing_repo: Arc::new(PostgresListingRepo::new(pool.clone())),
            booking_repo: Arc::new(PostgresBookingRepo::new(pool.clone())),
            job_repo: Arc::new(PostgresJobRepo::new(pool)),
        }
    }
}

pub async fn bootstrap_state(config: &Config) -> Result<AppState, AppError> {
    let repos = connect(&config.database_url).await?;

    let email_service: Arc<dyn EmailService> = match &config.mail_service_url {
        Some(url) => {
            info!("Delivering mail through {}", url);
            Arc::new(HttpEmailService::new(url.clone(), config.mail_service_token.clone()))
        }
        None => {
            info!("MAIL_SERVICE_URL not set, outgoing mail will only be logged");
            Arc::new(LogEmailService)
        }
    };

    build_state(config, repos, email_service)
}

/// Wires services on top of already-connected repositories.
pub fn build_state(config: &Config, repos: Repositories, email_service: Arc<dyn EmailService>) -> Result<AppState, AppError> {
    let renderer = NotificationRenderer::new(Arc::new(load_templates()?));
    let dispatcher = NotificationDispatcher::new(
        repos.booking_repo.clone(),
        repos.listing_repo.clone(),
        repos.user_repo.clone(),
        email_service,
        renderer,
        config.default_from_email.clone(),
    );
    let job_queue = Arc::new(JobQueue::new(repos.job_repo.clone()));

    Ok(AppState {
        config: config.clone(),
        user_repo: repos.user_repo,
        listing_repo: repos.listing_repo,
        booking_repo: repos.booking_repo,
        job_repo: repos.job_repo,
        task_queue: job_queue.clone(),
        job_queue,
        dispatcher: Arc::new(dispatcher),
        auth_service: Arc::new(AuthService::new(config)?),
    })
}

async fn connect(database_url: &str) -> Result<Repositories, AppError> {
    if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        info!("Initializing PostgreSQL connection...");

        let opts = PgConnectOptions::from_str(database_url)?
            .log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect_with(opts)
            .await?;

        sqlx::migrate!("./migrations/postgres").run(&pool).await?;
        Ok(Repositories::postgres(pool))
    } else {
        info!("Initializing SQLite connection with WAL Mode...");

        let opts = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5))
            .log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await?;

        sqlx::migrate!("./migrations/sqlite").run(&pool).await?;
        Ok(Repositories::sqlite(pool))
    }
}
