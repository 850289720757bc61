mod error;
mod traits;

pub mod console;
pub mod filesystem;
pub mod memory;

use std::sync::Arc;

pub use error::MailError;
pub use traits::{Email, Mailer};

use crate::config::{MailBackend, MailConfig};

/// Build the mailer selected by `config.backend`.
pub async fn build_mailer(config: &MailConfig) -> Result<Arc<dyn Mailer>, MailError> {
    match config.backend {
        MailBackend::Console => Ok(Arc::new(console::ConsoleMailer)),
        MailBackend::File => Ok(Arc::new(
            filesystem::FileMailer::new(config.dir.clone()).await?,
        )),
    }
}
