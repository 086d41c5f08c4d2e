use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::AppError;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub default_from_email: String,
    pub mail_service_url: Option<String>,
    pub mail_service_token: String,
    pub jwt_secret_key: String, // Private key (PEM)
    pub jwt_public_key: String, // Public key (PEM)
    pub auth_issuer: String,
    pub worker_poll_interval: Duration,
    pub worker_batch_size: i32,
    /// Jobs running at once in one worker.
    pub worker_concurrency: usize,
    /// How long a claimed job may stay PROCESSING before another poll reclaims it.
    pub job_lease: chrono::Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        Ok(Self {
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://listings.db".to_string()),
            port: parse_var("PORT", 3000)?,
            default_from_email: env::var("DEFAULT_FROM_EMAIL").unwrap_or_else(|_| "noreply@listings.local".to_string()),
            mail_service_url: env::var("MAIL_SERVICE_URL").ok().filter(|url| !url.trim().is_empty()),
            mail_service_token: env::var("MAIL_SERVICE_TOKEN").unwrap_or_default(),
            jwt_secret_key: required_var("JWT_SECRET_KEY")?,
            jwt_public_key: required_var("JWT_PUBLIC_KEY")?,
            auth_issuer: env::var("AUTH_ISSUER").unwrap_or_else(|_| "https://api.listings.local".to_string()),
            worker_poll_interval: Duration::from_millis(parse_var("WORKER_POLL_INTERVAL_MS", 5000)?),
            worker_batch_size: parse_var("WORKER_BATCH_SIZE", 10)?,
            worker_concurrency: parse_var("WORKER_CONCURRENCY", 16)?,
            job_lease: chrono::Duration::seconds(parse_var("JOB_LEASE_SECS", 600)?),
        })
    }
}

fn required_var(name: &str) -> Result<String, AppError> {
    env::var(name).map_err(|_| AppError::Config(format!("{} must be set", name)))
}

fn parse_var<T: FromStr>(name: &str, default: T) -> Result<T, AppError> {
    match env::var(name) {
        Ok(raw) => parse_value(name, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_value<T: FromStr>(name: &str, raw: &str) -> Result<T, AppError> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::Config(format!("{} has an invalid value: {:?}", name, raw)))
}
