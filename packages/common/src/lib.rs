pub mod config;
pub mod mail;

pub use config::{MailBackend, MailConfig};
