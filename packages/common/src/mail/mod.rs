mod error;
mod traits;

pub mod console;
pub mod memory;
#[cfg(feature = "smtp")]
pub mod smtp;

pub use error::MailError;
pub use traits::{MailMessage, Mailer};
