use async_trait::async_trait;

use super::error::MailError;
use super::traits::{Email, Mailer};

/// Writes every message to the log instead of delivering it.
pub struct ConsoleMailer;

#[async_trait]
impl Mailer for ConsoleMailer {
    async fn send(&self, email: &Email) -> Result<(), MailError> {
        email.check()?;
        tracing::info!(
            from = %email.from,
            to = ?email.to,
            subject = %email.subject,
            body = %email.body,
            "Email sent to console"
        );
        Ok(())
    }
}
