use async_trait::async_trait;
use tracing::info;

use super::error::MailError;
use super::traits::{MailMessage, Mailer};

/// Development backend that logs messages instead of delivering them.
#[derive(Default)]
pub struct ConsoleMailer;

impl ConsoleMailer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Mailer for ConsoleMailer {
    async fn send(&self, message: MailMessage) -> Result<(), MailError> {
        info!(
            to = %message.to,
            subject = %message.subject,
            "mail (console backend): {}",
            message.body
        );
        Ok(())
    }
}
