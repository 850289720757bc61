use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use super::error::MailError;
use super::traits::{Email, Mailer};

/// Directory-backed mailer: each message becomes one `.eml` file.
///
/// Files are named `{utc timestamp}-{uuid}.eml` so a directory listing sorts
/// in send order. Writes go through `{dir}/.tmp` and are renamed into place, so
/// a reader never observes a half-written message.
pub struct FileMailer {
    dir: PathBuf,
}

impl FileMailer {
    /// Create the mailer, making sure the output directory exists.
    pub async fn new(dir: PathBuf) -> Result<Self, MailError> {
        fs::create_dir_all(&dir).await?;
        fs::create_dir_all(dir.join(".tmp")).await?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn temp_path(&self) -> PathBuf {
        self.dir
            .join(".tmp")
            .join(uuid::Uuid::new_v4().to_string())
    }
}

#[async_trait]
impl Mailer for FileMailer {
    async fn send(&self, email: &Email) -> Result<(), MailError> {
        email.check()?;

        let now = chrono::Utc::now();
        let file_name = format!(
            "{}-{}.eml",
            now.format("%Y%m%dT%H%M%S%.6f"),
            uuid::Uuid::new_v4()
        );
        let final_path = self.dir.join(file_name);
        let temp_path = self.temp_path();

        if let Err(e) = fs::write(&temp_path, email.to_rfc5322(now)).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }
        if let Err(e) = fs::rename(&temp_path, &final_path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        tracing::debug!(path = %final_path.display(), "Email written to file");
        Ok(())
    }
}
