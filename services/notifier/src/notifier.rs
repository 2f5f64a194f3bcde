use crate::email::EmailSender;
use crate::object_store::ObjectStore;
use crate::video_records::{VideoRecord, VideoRecordStore};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument};

/// Name shown in the email when the record has no `videoName`
const UNKNOWN_VIDEO_NAME: &str = "desconhecido";

/// Time-limited download link for an archive
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadLink {
    pub url: String,
    pub expires_at: DateTime<Utc>,
}

/// Notifier settings taken from configuration
#[derive(Debug, Clone)]
pub struct NotifierSettings {
    pub sender: String,
    pub subject: String,
    pub link_expiry: Duration,
}

/// Generates download links, emails owners and records links on video records
pub struct Notifier {
    store: Arc<dyn ObjectStore>,
    email: Arc<dyn EmailSender>,
    records: Arc<dyn VideoRecordStore>,
    settings: NotifierSettings,
}

impl Notifier {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        email: Arc<dyn EmailSender>,
        records: Arc<dyn VideoRecordStore>,
        settings: NotifierSettings,
    ) -> Self {
        Self {
            store,
            email,
            records,
            settings,
        }
    }

    /// Presigned GET link for the archive, valid for the configured expiry
    #[instrument(skip(self))]
    pub async fn generate_download_link(&self, archive_key: &str) -> Result<DownloadLink> {
        let url = self
            .store
            .presign_get(archive_key, self.settings.link_expiry)
            .await?;

        let expires_at = Utc::now()
            + chrono::Duration::from_std(self.settings.link_expiry)
                .context("Link expiry out of range")?;

        Ok(DownloadLink { url, expires_at })
    }

    /// Send the completion email to the video owner
    #[instrument(skip(self, link))]
    pub async fn send_completion_email(
        &self,
        to: &str,
        video_name: Option<&str>,
        link: &DownloadLink,
    ) -> Result<()> {
        let html = completion_email_html(video_name.unwrap_or(UNKNOWN_VIDEO_NAME), &link.url);

        self.email
            .send_html(&self.settings.sender, to, &self.settings.subject, &html)
            .await?;

        metrics::counter!("notifier.emails.sent").increment(1);
        info!(expires_at = %link.expires_at, "Completion email sent");

        Ok(())
    }

    /// Record the link on the video and overwrite the stored record
    #[instrument(skip(self, record, link), fields(video_id = ?record.video_id()))]
    pub async fn persist_download_link(
        &self,
        record: &mut VideoRecord,
        link: &DownloadLink,
    ) -> Result<()> {
        record.set_link_download(&link.url);
        self.records.put_record(record).await?;

        metrics::counter!("notifier.links.persisted").increment(1);

        Ok(())
    }
}

/// HTML body of the completion email
pub fn completion_email_html(video_name: &str, url: &str) -> String {
    format!(
        "<html><body><p>Olá, seu vídeo '{video_name}' finalizou o processamento. \
         Clique <a href='{url}'>aqui</a> para baixar.</p></body></html>"
    )
}
