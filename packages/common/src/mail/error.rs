use thiserror::Error;

/// Errors that can occur while sending mail.
#[derive(Debug, Error)]
pub enum MailError {
    /// A recipient or sender address failed to parse.
    #[error("invalid mail address: {0}")]
    InvalidAddress(String),
    /// The message could not be assembled.
    #[error("failed to build message: {0}")]
    Build(String),
    /// The transport refused or failed to deliver the message.
    #[error("mail transport error: {0}")]
    Transport(String),
}
