use crate::domain::ports::{EmailMessage, EmailService};
use crate::error::AppError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, error};

pub struct HttpEmailService {
    client: Client,
    api_url: String,
    api_key: String,
}

impl HttpEmailService {
    pub fn new(api_url: String, api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_url,
            api_key,
        }
    }
}

#[derive(Serialize)]
struct EmailPayload<'a> {
    from: &'a str,
    to: &'a [String],
    subject: &'a str,
    text_body: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    html_body: Option<&'a str>,
}

#[async_trait]
impl EmailService for HttpEmailService {
    async fn send(&self, message: &EmailMessage) -> Result<(), AppError> {
        let payload = EmailPayload {
            from: &message.from_email,
            to: &message.recipients,
            subject: &message.subject,
            text_body: &message.plain_body,
            html_body: message.html_body.as_deref(),
        };

        let res = self.client.post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                let msg = format!("Email service connection error: {}", e);
                error!("{}", msg);
                AppError::Mail(msg)
            })?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            let msg = format!("Email service failed. Status: {}, Body: {}", status, text);
            error!("{}", msg);
            return Err(AppError::Mail(msg));
        }

        debug!(to = ?message.recipients, subject = %message.subject, "email handed to mail service");
        Ok(())
    }
}
