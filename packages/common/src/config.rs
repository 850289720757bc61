use std::path::PathBuf;

use serde::Deserialize;

/// Which transport delivers outbound mail.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MailBackend {
    /// Log messages through `tracing`.
    Console,
    /// Write one `.eml` file per message into `dir`.
    File,
}

/// Outbound mail configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct MailConfig {
    /// Default: `console`.
    #[serde(default = "default_mail_backend")]
    pub backend: MailBackend,
    /// Sender address. Default: "noreply@reviews.local".
    #[serde(default = "default_mail_from")]
    pub from: String,
    /// Output directory for the `file` backend. Default: "./sent_emails".
    #[serde(default = "default_mail_dir")]
    pub dir: PathBuf,
}

fn default_mail_backend() -> MailBackend {
    MailBackend::Console
}
fn default_mail_from() -> String {
    "noreply@reviews.local".into()
}
fn default_mail_dir() -> PathBuf {
    PathBuf::from("./sent_emails")
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            backend: default_mail_backend(),
            from: default_mail_from(),
            dir: default_mail_dir(),
        }
    }
}
