use crate::domain::ports::{EmailMessage, EmailService};
use crate::error::AppError;
use async_trait::async_trait;
use tracing::info;

/// Writes outgoing mail to the log instead of delivering it. Used when no
/// mail service is configured.
pub struct LogEmailService;

#[async_trait]
impl EmailService for LogEmailService {
    async fn send(&self, message: &EmailMessage) -> Result<(), AppError> {
        if message.recipients.is_empty() {
            return Err(AppError::Mail("No recipients".into()));
        }
        info!(
            from = %message.from_email,
            to = ?message.recipients,
            subject = %message.subject,
            "email (not delivered):\n{}",
            message.plain_body
        );
        Ok(())
    }
}
