use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::error::MailError;
use super::traits::{Email, Mailer};

/// In-process outbox. Used by tests to read back what would have been sent.
#[derive(Default)]
pub struct MemoryMailer {
    outbox: Mutex<Vec<Email>>,
    failing: AtomicBool,
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `send` fail with `MailError::Rejected`.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// All accepted messages, oldest first.
    pub async fn sent(&self) -> Vec<Email> {
        self.outbox.lock().await.clone()
    }

    /// The most recent message addressed to `recipient`.
    pub async fn last_to(&self, recipient: &str) -> Option<Email> {
        self.outbox
            .lock()
            .await
            .iter()
            .rev()
            .find(|email| email.to.iter().any(|to| to == recipient))
            .cloned()
    }
}

#[async_trait]
impl Mailer for MemoryMailer {
    async fn send(&self, email: &Email) -> Result<(), MailError> {
        email.check()?;
        if self.failing.load(Ordering::SeqCst) {
            return Err(MailError::Rejected("memory mailer is set to fail".into()));
        }
        self.outbox.lock().await.push(email.clone());
        Ok(())
    }
}
