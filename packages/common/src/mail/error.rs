use thiserror::Error;

/// Errors that can occur while dispatching an email.
#[derive(Debug, Error)]
pub enum MailError {
    /// The message is missing a sender or recipients.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
    /// The backend refused to deliver the message.
    #[error("delivery rejected: {0}")]
    Rejected(String),
    /// An I/O error occurred while writing the message.
    #[error("mail IO error: {0}")]
    Io(#[from] std::io::Error),
}
