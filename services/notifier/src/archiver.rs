use crate::object_store::{ObjectStore, ObjectSummary};
use anyhow::{Context, Result};
use indexmap::IndexMap;
use std::io::{Cursor, Write};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, instrument};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

const ARCHIVE_CONTENT_TYPE: &str = "application/zip";

/// Errors raised while building a frame archive
#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("no frames found under {prefix}")]
    NoFramesFound { prefix: String },

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Prefix holding the extracted frames of a video
pub fn frames_prefix(video_id: &str) -> String {
    format!("videos/{video_id}/frames/")
}

/// Key of the frame archive of a video
pub fn archive_key(video_id: &str) -> String {
    format!("videos/{video_id}/frames.zip")
}

/// Builds and uploads the ZIP archive of a video's frames
pub struct FrameArchiver {
    store: Arc<dyn ObjectStore>,
}

impl FrameArchiver {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Archive every non-empty frame of a video and upload the result.
    ///
    /// Returns the key of the uploaded archive. Any storage failure aborts the
    /// whole operation; an archive already uploaded by a previous run is left
    /// untouched in that case.
    #[instrument(skip(self))]
    pub async fn build_frame_archive(&self, video_id: &str) -> Result<String, ArchiveError> {
        let prefix = frames_prefix(video_id);
        let objects = self.store.list_objects(&prefix).await?;

        if objects.is_empty() {
            return Err(ArchiveError::NoFramesFound { prefix });
        }

        let frames = latest_frame_keys(&objects);
        let frame_count = frames.len();

        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

        for (name, object_key) in &frames {
            let bytes = self.store.get_object(object_key).await?;
            zip.start_file(name.as_str(), options)
                .with_context(|| format!("Failed to start archive entry {name}"))?;
            zip.write_all(&bytes)
                .with_context(|| format!("Failed to write archive entry {name}"))?;
        }

        let archive = zip
            .finish()
            .context("Failed to finish archive")?
            .into_inner();
        let key = archive_key(video_id);

        debug!(
            archive_key = %key,
            frame_count,
            size_bytes = archive.len(),
            "Uploading frame archive"
        );

        metrics::histogram!("notifier.archive.size_bytes").record(archive.len() as f64);

        self.store
            .put_object(&key, archive, ARCHIVE_CONTENT_TYPE)
            .await?;

        metrics::counter!("notifier.archives.created").increment(1);
        metrics::counter!("notifier.frames.archived").increment(frame_count as u64);

        info!(archive_key = %key, frame_count, "Frame archive uploaded");

        Ok(key)
    }
}

/// Map archive entry names to the object stored under them.
///
/// Zero-byte objects are skipped. Objects sharing a file name collapse into
/// one entry holding the last listed key.
pub fn latest_frame_keys(objects: &[ObjectSummary]) -> IndexMap<String, String> {
    let mut frames = IndexMap::with_capacity(objects.len());
    for object in objects.iter().filter(|o| o.size > 0) {
        frames.insert(object.file_name().to_string(), object.key.clone());
    }
    frames
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object_store::{MockObjectStore, ObjectSummary};
    use std::io::Read;
    use zip::ZipArchive;

    fn read_archive(bytes: Vec<u8>) -> Vec<(String, Vec<u8>)> {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        (0..archive.len())
            .map(|i| {
                let mut file = archive.by_index(i).unwrap();
                let mut content = Vec::new();
                file.read_to_end(&mut content).unwrap();
                (file.name().to_string(), content)
            })
            .collect()
    }

    #[test]
    fn test_keys() {
        assert_eq!(frames_prefix("456"), "videos/456/frames/");
        assert_eq!(archive_key("456"), "videos/456/frames.zip");
    }

    #[test]
    fn test_latest_frame_keys_skip_empty_and_keep_order() {
        let frames = latest_frame_keys(&[
            ObjectSummary::new("videos/7/frames/", 0),
            ObjectSummary::new("videos/7/frames/b.jpg", 4),
            ObjectSummary::new("videos/7/frames/a.jpg", 4),
            ObjectSummary::new("videos/7/frames/empty.jpg", 0),
        ]);

        let names: Vec<&str> = frames.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["b.jpg", "a.jpg"]);
    }

    #[tokio::test]
    async fn test_duplicate_names_fetch_only_last() {
        let mut store = MockObjectStore::new();
        store.expect_list_objects().returning(|_| {
            Ok(vec![
                ObjectSummary::new("videos/9/frames/a.jpg", 1),
                ObjectSummary::new("videos/9/frames/b.jpg", 1),
                ObjectSummary::new("videos/9/frames/retry/a.jpg", 1),
            ])
        });
        store
            .expect_get_object()
            .withf(|key| key == "videos/9/frames/retry/a.jpg")
            .times(1)
            .returning(|_| Ok(vec![3]));
        store
            .expect_get_object()
            .withf(|key| key == "videos/9/frames/b.jpg")
            .times(1)
            .returning(|_| Ok(vec![2]));
        store
            .expect_get_object()
            .withf(|key| key == "videos/9/frames/a.jpg")
            .never();

        let uploaded = Arc::new(std::sync::Mutex::new(None));
        let sink = uploaded.clone();
        store
            .expect_put_object()
            .times(1)
            .returning(move |_, body, _| {
                *sink.lock().unwrap() = Some(body);
                Ok(())
            });

        let archiver = FrameArchiver::new(Arc::new(store));
        archiver.build_frame_archive("9").await.unwrap();

        let files = read_archive(uploaded.lock().unwrap().take().unwrap());
        assert_eq!(
            files,
            vec![
                ("a.jpg".to_string(), vec![3]),
                ("b.jpg".to_string(), vec![2]),
            ]
        );
    }

    #[tokio::test]
    async fn test_build_archive_skips_empty_objects() {
        let mut store = MockObjectStore::new();
        store
            .expect_list_objects()
            .withf(|prefix| prefix == "videos/456/frames/")
            .times(1)
            .returning(|_| {
                Ok(vec![
                    ObjectSummary::new("videos/456/frames/", 0),
                    ObjectSummary::new("videos/456/frames/out.0000001.jpg", 3),
                    ObjectSummary::new("videos/456/frames/out.0000002.jpg", 2),
                    ObjectSummary::new("videos/456/frames/empty.jpg", 0),
                ])
            });
        store
            .expect_get_object()
            .times(2)
            .returning(|key| Ok(key.as_bytes().to_vec()));

        let uploaded = Arc::new(std::sync::Mutex::new(None));
        let sink = uploaded.clone();
        store
            .expect_put_object()
            .withf(|key, _, content_type| {
                key == "videos/456/frames.zip" && content_type == "application/zip"
            })
            .times(1)
            .returning(move |_, body, _| {
                *sink.lock().unwrap() = Some(body);
                Ok(())
            });

        let archiver = FrameArchiver::new(Arc::new(store));
        let key = archiver.build_frame_archive("456").await.unwrap();
        assert_eq!(key, "videos/456/frames.zip");

        let body = uploaded.lock().unwrap().take().unwrap();
        let files = read_archive(body);
        let names: Vec<&str> = files.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, vec!["out.0000001.jpg", "out.0000002.jpg"]);
        assert_eq!(files[0].1, b"videos/456/frames/out.0000001.jpg".to_vec());
    }

    #[tokio::test]
    async fn test_empty_listing_fails_without_upload() {
        let mut store = MockObjectStore::new();
        store.expect_list_objects().times(1).returning(|_| Ok(vec![]));
        store.expect_get_object().never();
        store.expect_put_object().never();

        let archiver = FrameArchiver::new(Arc::new(store));
        let err = archiver.build_frame_archive("456").await.unwrap_err();
        assert!(matches!(err, ArchiveError::NoFramesFound { .. }));
    }

    #[tokio::test]
    async fn test_download_failure_aborts() {
        let mut store = MockObjectStore::new();
        store
            .expect_list_objects()
            .returning(|_| Ok(vec![ObjectSummary::new("videos/1/frames/a.jpg", 5)]));
        store
            .expect_get_object()
            .returning(|_| Err(anyhow::anyhow!("access denied")));
        store.expect_put_object().never();

        let archiver = FrameArchiver::new(Arc::new(store));
        let err = archiver.build_frame_archive("1").await.unwrap_err();
        assert!(matches!(err, ArchiveError::Storage(_)));
    }
}
