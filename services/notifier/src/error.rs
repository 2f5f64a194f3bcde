use crate::archiver::ArchiveError;
use crate::event::ExtractError;
use thiserror::Error;

/// Failures that end an invocation early
#[derive(Error, Debug)]
pub enum NotifierError {
    #[error("video identifier not found: {0}")]
    Identifier(#[from] ExtractError),

    #[error("failed to build frame archive: {0}")]
    Archive(#[from] ArchiveError),

    #[error("no video record for video {video_id}")]
    RecordNotFound { video_id: String },

    #[error("failed to look up video {video_id}: {source}")]
    RecordLookup {
        video_id: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to generate download link: {0}")]
    PresignFailed(#[source] anyhow::Error),

    #[error("failed to persist download link: {0}")]
    PersistFailed(#[source] anyhow::Error),
}

impl NotifierError {
    /// HTTP-style status code reported for this failure
    pub fn status_code(&self) -> u16 {
        match self {
            NotifierError::Identifier(_)
            | NotifierError::RecordNotFound { .. }
            | NotifierError::RecordLookup { .. } => 404,
            NotifierError::Archive(_)
            | NotifierError::PresignFailed(_)
            | NotifierError::PersistFailed(_) => 500,
        }
    }

    /// Message reported to the caller
    pub fn message(&self) -> &'static str {
        match self {
            NotifierError::Identifier(ExtractError::FramesNotFound) => "Frames não encontrados.",
            NotifierError::Identifier(ExtractError::TemplateMismatch { .. }) => {
                "Caminho de frames fora do padrão esperado."
            }
            NotifierError::Archive(_) => "Erro ao criar arquivo ZIP.",
            NotifierError::RecordNotFound { .. } | NotifierError::RecordLookup { .. } => {
                "Dados do vídeo não encontrados."
            }
            NotifierError::PresignFailed(_) => "Erro ao gerar link de download.",
            NotifierError::PersistFailed(_) => "Erro ao salvar link de download.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(NotifierError::from(ExtractError::FramesNotFound).status_code(), 404);
        assert_eq!(
            NotifierError::from(ArchiveError::NoFramesFound {
                prefix: "videos/1/frames/".to_string()
            })
            .status_code(),
            500
        );
        assert_eq!(
            NotifierError::RecordLookup {
                video_id: "1".to_string(),
                source: anyhow::anyhow!("throttled"),
            }
            .status_code(),
            404
        );
        assert_eq!(
            NotifierError::PersistFailed(anyhow::anyhow!("denied")).status_code(),
            500
        );
    }

    #[test]
    fn test_lookup_failure_reads_as_not_found() {
        let lookup = NotifierError::RecordLookup {
            video_id: "1".to_string(),
            source: anyhow::anyhow!("throttled"),
        };
        let missing = NotifierError::RecordNotFound {
            video_id: "1".to_string(),
        };
        assert_eq!(lookup.message(), missing.message());
    }
}
