use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, instrument, warn};

/// Errors that can occur while handing a message to the mail transport
#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("Invalid recipient: {0}")]
    InvalidRecipient(String),
    #[error("Mail transport error: {0}")]
    Transport(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl EmailMessage {
    pub fn password_reset(to: &str, reset_link: &str) -> Self {
        Self {
            to: to.to_string(),
            subject: "Reset Password".to_string(),
            body: format!(
                "Please reset your password by clicking here: <a href=\"{}\">link</a>",
                reset_link
            ),
        }
    }
}

/// Outbound mail
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, message: EmailMessage) -> Result<(), NotificationError>;
}

/// Writes each message to the log instead of delivering it
#[derive(Debug, Clone, Default)]
pub struct LoggingEmailSender;

#[async_trait]
impl EmailSender for LoggingEmailSender {
    #[instrument(skip(self, message), fields(subject = %message.subject))]
    async fn send(&self, message: EmailMessage) -> Result<(), NotificationError> {
        if !message.to.contains('@') {
            warn!("Refusing to send email to malformed address");
            return Err(NotificationError::InvalidRecipient(message.to));
        }

        info!(
            to = %message.to,
            body_length = message.body.len(),
            "Email queued for delivery"
        );
        Ok(())
    }
}
