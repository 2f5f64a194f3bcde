use crate::archiver::FrameArchiver;
use crate::error::NotifierError;
use crate::event::TranscodeCompleteEvent;
use crate::notifier::Notifier;
use crate::video_records::{VideoRecord, VideoRecordStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

pub const SUCCESS_MESSAGE: &str = "Processo finalizado com sucesso.";

/// Response returned to the invoker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandlerResponse {
    pub status_code: u16,
    /// JSON-encoded message string
    pub body: String,
}

impl HandlerResponse {
    pub fn new(status_code: u16, message: &str) -> Self {
        Self {
            status_code,
            body: serde_json::Value::from(message).to_string(),
        }
    }

    pub fn success() -> Self {
        Self::new(200, SUCCESS_MESSAGE)
    }
}

impl From<&NotifierError> for HandlerResponse {
    fn from(err: &NotifierError) -> Self {
        Self::new(err.status_code(), err.message())
    }
}

/// Runs the frame archive notification for one "transcoding finished" event
pub struct FramesNotificationHandler {
    archiver: FrameArchiver,
    records: Arc<dyn VideoRecordStore>,
    notifier: Notifier,
}

impl FramesNotificationHandler {
    pub fn new(
        archiver: FrameArchiver,
        records: Arc<dyn VideoRecordStore>,
        notifier: Notifier,
    ) -> Self {
        Self {
            archiver,
            records,
            notifier,
        }
    }

    /// Handle an event and map the outcome to a response
    pub async fn handle(&self, event: &TranscodeCompleteEvent) -> HandlerResponse {
        metrics::counter!("notifier.events.received").increment(1);
        debug!(event = ?event, "Received transcode complete event");

        match self.process(event).await {
            Ok(()) => {
                info!(status_code = 200, "Frame notification finished");
                HandlerResponse::success()
            }
            Err(err) => {
                let response = HandlerResponse::from(&err);
                error!(
                    error = %err,
                    status_code = response.status_code,
                    "Frame notification failed"
                );
                response
            }
        }
    }

    /// Extract, archive, look up, then notify and persist
    #[instrument(skip(self, event), fields(video_id = tracing::field::Empty))]
    pub async fn process(&self, event: &TranscodeCompleteEvent) -> Result<(), NotifierError> {
        let video_id = event.video_id()?;
        tracing::Span::current().record("video_id", video_id.as_str());
        info!(video_id = %video_id, "Processing frames");

        let archive_key = self.archiver.build_frame_archive(&video_id).await?;

        let mut record = self.find_video_record(&video_id).await?;

        let link = self
            .notifier
            .generate_download_link(&archive_key)
            .await
            .map_err(NotifierError::PresignFailed)?;

        match record.owner_email() {
            Some(to) => {
                if let Err(e) = self
                    .notifier
                    .send_completion_email(to, record.video_name(), &link)
                    .await
                {
                    metrics::counter!("notifier.emails.failed").increment(1);
                    error!(error = ?e, to = %to, "Failed to send completion email");
                }
            }
            None => {
                warn!(video_id = %video_id, "Video record has no owner email, skipping email");
            }
        }

        self.notifier
            .persist_download_link(&mut record, &link)
            .await
            .map_err(NotifierError::PersistFailed)?;

        info!(video_id = %video_id, archive_key = %archive_key, "Download link recorded");

        Ok(())
    }

    async fn find_video_record(&self, video_id: &str) -> Result<VideoRecord, NotifierError> {
        match self.records.find_by_video_id(video_id).await {
            Ok(Some(record)) => Ok(record),
            Ok(None) => Err(NotifierError::RecordNotFound {
                video_id: video_id.to_string(),
            }),
            Err(source) => Err(NotifierError::RecordLookup {
                video_id: video_id.to_string(),
                source,
            }),
        }
    }
}
