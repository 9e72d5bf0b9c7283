use std::sync::Mutex;

use async_trait::async_trait;

use super::error::MailError;
use super::traits::{MailMessage, Mailer};

/// In-memory backend that records sent messages for test assertions.
#[derive(Default)]
pub struct MemoryMailer {
    sent: Mutex<Vec<MailMessage>>,
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every message sent so far, in send order.
    pub fn sent(&self) -> Vec<MailMessage> {
        self.sent.lock().expect("mailer lock poisoned").clone()
    }
}

#[async_trait]
impl Mailer for MemoryMailer {
    async fn send(&self, message: MailMessage) -> Result<(), MailError> {
        self.sent
            .lock()
            .expect("mailer lock poisoned")
            .push(message);
        Ok(())
    }
}
