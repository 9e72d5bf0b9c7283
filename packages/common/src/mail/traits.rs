use async_trait::async_trait;

use super::error::MailError;

/// A plain-text transactional message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Transactional mail delivery.
///
/// Callers treat delivery as fire-and-forget: a send failure is the
/// caller's to log, never to surface to the end user.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: MailMessage) -> Result<(), MailError>;
}
