use crate::domain::models::{
    booking::Booking, job::{Job, NotificationTask}, listing::Listing, user::User,
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: &User) -> Result<User, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError>;
}

#[async_trait]
pub trait ListingRepository: Send + Sync {
    async fn create(&self, listing: &Listing) -> Result<Listing, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Listing>, AppError>;
    async fn list(&self) -> Result<Vec<Listing>, AppError>;
    async fn update(&self, listing: &Listing) -> Result<Listing, AppError>;
    async fn delete(&self, id: &str) -> Result<(), AppError>;
}

#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn create(&self, booking: &Booking) -> Result<Booking, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Booking>, AppError>;
    async fn find_for_guest(&self, guest_id: &str, id: &str) -> Result<Option<Booking>, AppError>;
    async fn list_by_guest(&self, guest_id: &str) -> Result<Vec<Booking>, AppError>;
    async fn update(&self, booking: &Booking) -> Result<Booking, AppError>;
    async fn delete(&self, guest_id: &str, id: &str) -> Result<(), AppError>;
}

#[async_trait]
pub trait JobRepository: Send + Sync {
    async fn create(&self, job: &Job) -> Result<Job, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Job>, AppError>;
    /// Atomically claims up to `limit` jobs, moving them to PROCESSING and
    /// stamping `claimed_at`. Claimable are due PENDING jobs and PROCESSING
    /// jobs claimed at or before `stale_before`.
    async fn find_pending(&self, limit: i32, stale_before: DateTime<Utc>) -> Result<Vec<Job>, AppError>;
    async fn list_by_booking(&self, booking_id: &str) -> Result<Vec<Job>, AppError>;
    async fn update_status(&self, id: &str, status: &str, result: Option<String>, error_message: Option<String>) -> Result<(), AppError>;
    async fn reschedule(&self, id: &str, execute_at: DateTime<Utc>, retries: i32, error_message: Option<String>) -> Result<(), AppError>;
}

/// Accepts notification jobs for out-of-band execution.
#[async_trait]
pub trait TaskQueue: Send + Sync {
    async fn submit(&self, task: NotificationTask, booking_id: &str) -> Result<(), AppError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmailMessage {
    pub subject: String,
    pub plain_body: String,
    pub from_email: String,
    pub recipients: Vec<String>,
    pub html_body: Option<String>,
}

#[async_trait]
pub trait EmailService: Send + Sync {
    /// Delivers the message or fails; there is no silent mode.
    async fn send(&self, message: &EmailMessage) -> Result<(), AppError>;
}
