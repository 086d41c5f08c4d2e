use std::sync::Arc;
use crate::domain::ports::{
    BookingRepository, JobRepository, ListingRepository, TaskQueue, UserRepository,
};
use crate::domain::services::{
    auth_service::AuthService, job_queue::JobQueue, notification::NotificationDispatcher,
};
use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub user_repo: Arc<dyn UserRepository>,
    pub listing_repo: Arc<dyn ListingRepository>,
    pub booking_repo: Arc<dyn BookingRepository>,
    pub job_repo: Arc<dyn JobRepository>,
    /// Where the booking write path submits notification jobs.
    pub task_queue: Arc<dyn TaskQueue>,
    /// Retry/completion bookkeeping used by the worker.
    pub job_queue: Arc<JobQueue>,
    pub dispatcher: Arc<NotificationDispatcher>,
    pub auth_service: Arc<AuthService>,
}
