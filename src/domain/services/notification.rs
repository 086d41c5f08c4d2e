//! Booking notification jobs.
//!
//! Two jobs run after a booking is created, each given only the booking id:
//! the guest confirmation, which asks the queue to retry on any failure, and
//! the host notification, which reports failure as a string and is never
//! retried. Both re-read the booking when they run.

use std::sync::Arc;
use std::time::Duration;

use tera::Context;
use thiserror::Error;
use tracing::instrument::WithSubscriber;
use tracing::{error, info, Dispatch};

use crate::domain::models::{booking::Booking, job::NotificationTask, listing::Listing, user::User};
use crate::domain::ports::{
    BookingRepository, EmailMessage, EmailService, ListingRepository, TaskQueue, UserRepository,
};
use crate::domain::services::renderer::{
    strip_tags, NotificationRenderer, GUEST_CONFIRMATION_TEMPLATE, HOST_NOTIFICATION_TEMPLATE,
};
use crate::error::AppError;

/// Delay before a failed guest confirmation is attempted again.
pub const RETRY_COUNTDOWN: Duration = Duration::from_secs(300);

/// Request to run the job again after `countdown`, carrying the failure.
#[derive(Debug, Error)]
#[error("retry in {}s: {}", .countdown.as_secs(), .cause)]
pub struct Retry {
    pub countdown: Duration,
    #[source]
    pub cause: AppError,
}

pub fn confirmation_subject(listing_title: &str) -> String {
    format!("Booking Confirmation - {}", listing_title)
}

pub fn host_notification_subject(listing_title: &str) -> String {
    format!("New Booking Notification - {}", listing_title)
}

pub struct NotificationDispatcher {
    booking_repo: Arc<dyn BookingRepository>,
    listing_repo: Arc<dyn ListingRepository>,
    user_repo: Arc<dyn UserRepository>,
    email_service: Arc<dyn EmailService>,
    renderer: NotificationRenderer,
    from_email: String,
    log: Option<Dispatch>,
}

impl NotificationDispatcher {
    pub fn new(
        booking_repo: Arc<dyn BookingRepository>,
        listing_repo: Arc<dyn ListingRepository>,
        user_repo: Arc<dyn UserRepository>,
        email_service: Arc<dyn EmailService>,
        renderer: NotificationRenderer,
        from_email: String,
    ) -> Self {
        Self { booking_repo, listing_repo, user_repo, email_service, renderer, from_email, log: None }
    }

    /// Routes this dispatcher's log events to `log` instead of the ambient subscriber.
    pub fn with_log(mut self, log: Dispatch) -> Self {
        self.log = Some(log);
        self
    }

    /// Emails the booking confirmation to the guest.
    ///
    /// Every failure, including a booking that no longer exists, comes back as
    /// a [`Retry`] with [`RETRY_COUNTDOWN`]; the queue decides whether budget remains.
    pub async fn send_booking_confirmation_email(&self, booking_id: &str) -> Result<String, Retry> {
        let job = self.confirm_guest(booking_id);
        match &self.log {
            Some(log) => job.with_subscriber(log.clone()).await,
            None => job.await,
        }
    }

    /// Emails the new-booking notice to the listing's host. Failures are
    /// logged and returned as a description; this job is never retried.
    pub async fn send_booking_notification_to_host(&self, booking_id: &str) -> Result<String, String> {
        let job = self.notify_host(booking_id);
        match &self.log {
            Some(log) => job.with_subscriber(log.clone()).await,
            None => job.await,
        }
    }

    async fn confirm_guest(&self, booking_id: &str) -> Result<String, Retry> {
        match self.deliver_guest_confirmation(booking_id).await {
            Ok(guest_email) => {
                info!("Booking confirmation email sent successfully to {} for booking #{}", guest_email, booking_id);
                Ok(format!("Email sent successfully to {}", guest_email))
            }
            Err(cause) => {
                match &cause {
                    AppError::NotFound(msg) => error!("{}", msg),
                    other => error!("Failed to send booking confirmation email: {}", other),
                }
                Err(Retry { countdown: RETRY_COUNTDOWN, cause })
            }
        }
    }

    async fn notify_host(&self, booking_id: &str) -> Result<String, String> {
        match self.deliver_host_notification(booking_id).await {
            Ok(host_email) => {
                info!("Booking notification sent to host {} for booking #{}", host_email, booking_id);
                Ok(format!("Notification sent to host {}", host_email))
            }
            Err(e) => {
                error!("Failed to send booking notification to host: {}", e);
                Err(format!("Failed to send notification: {}", e))
            }
        }
    }

    async fn deliver_guest_confirmation(&self, booking_id: &str) -> Result<String, AppError> {
        let (booking, listing) = self.load_booking(booking_id).await?;
        let guest = self.load_user(&booking.guest_id).await?;

        let context = build_context(&booking, &listing, &guest, None);
        let html = self.renderer.render(GUEST_CONFIRMATION_TEMPLATE, &context)?;

        self.send(confirmation_subject(&listing.title), &guest.email, html).await?;
        Ok(guest.email)
    }

    async fn deliver_host_notification(&self, booking_id: &str) -> Result<String, AppError> {
        let (booking, listing) = self.load_booking(booking_id).await?;
        let guest = self.load_user(&booking.guest_id).await?;
        let host = self.load_user(&listing.host_id).await?;

        let context = build_context(&booking, &listing, &guest, Some(&host));
        let html = self.renderer.render(HOST_NOTIFICATION_TEMPLATE, &context)?;

        self.send(host_notification_subject(&listing.title), &host.email, html).await?;
        Ok(host.email)
    }

    async fn send(&self, subject: String, recipient: &str, html: String) -> Result<(), AppError> {
        let message = EmailMessage {
            subject,
            plain_body: strip_tags(&html),
            from_email: self.from_email.clone(),
            recipients: vec![recipient.to_string()],
            html_body: Some(html),
        };
        self.email_service.send(&message).await
    }

    async fn load_booking(&self, booking_id: &str) -> Result<(Booking, Listing), AppError> {
        let booking = self.booking_repo.find_by_id(booking_id).await?
            .ok_or_else(|| AppError::NotFound(format!("Booking with id {} does not exist", booking_id)))?;
        let listing = self.listing_repo.find_by_id(&booking.listing_id).await?
            .ok_or_else(|| AppError::NotFound(format!("Listing {} not found", booking.listing_id)))?;
        Ok((booking, listing))
    }

    async fn load_user(&self, user_id: &str) -> Result<User, AppError> {
        self.user_repo.find_by_id(user_id).await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))
    }
}

/// Submits both notification jobs for a freshly persisted booking.
///
/// Submission failures are logged and swallowed: a booking is never failed by
/// notification infrastructure, and nothing records the missed notifications.
pub async fn enqueue_booking_notifications(queue: &dyn TaskQueue, booking_id: &str) {
    for task in NotificationTask::ALL {
        if let Err(e) = queue.submit(task, booking_id).await {
            error!("Failed to queue {} for booking {}: {}", task, booking_id, e);
        }
    }
}

fn build_context(booking: &Booking, listing: &Listing, guest: &User, host: Option<&User>) -> Context {
    let mut context = Context::new();
    context.insert("booking", booking);
    context.insert("listing", listing);
    context.insert("guest", guest);
    if let Some(host) = host {
        context.insert("host", host);
    }
    context.insert("nights", &booking.nights());
    context
}
