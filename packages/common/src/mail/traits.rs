use async_trait::async_trait;

use super::error::MailError;

/// A plain-text email.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Email {
    pub subject: String,
    pub body: String,
    pub from: String,
    pub to: Vec<String>,
}

impl Email {
    pub fn new(
        subject: impl Into<String>,
        body: impl Into<String>,
        from: impl Into<String>,
        to: Vec<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
            from: from.into(),
            to,
        }
    }

    /// Reject messages no backend could deliver.
    pub fn check(&self) -> Result<(), MailError> {
        if self.from.trim().is_empty() {
            return Err(MailError::InvalidMessage("sender is empty".into()));
        }
        if self.to.is_empty() || self.to.iter().any(|addr| addr.trim().is_empty()) {
            return Err(MailError::InvalidMessage("recipient list is empty".into()));
        }
        Ok(())
    }

    /// Render the message in RFC 5322 form (headers, blank line, body).
    pub fn to_rfc5322(&self, date: chrono::DateTime<chrono::Utc>) -> String {
        format!(
            "From: {}\r\nTo: {}\r\nSubject: {}\r\nDate: {}\r\nContent-Type: text/plain; charset=utf-8\r\n\r\n{}\r\n",
            self.from,
            self.to.join(", "),
            self.subject,
            date.to_rfc2822(),
            self.body,
        )
    }
}

/// Outbound mail transport.
///
/// `send` resolves only once the backend has accepted the message; failures are
/// returned to the caller rather than swallowed.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &Email) -> Result<(), MailError>;
}
