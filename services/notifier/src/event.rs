use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Folder marker identifying frame outputs of a transcoding job
pub const FRAMES_MARKER: &str = "/frames/";

/// Position of the video identifier in a frames folder path.
///
/// The folder template is `s3://{bucket}/{folder}/{video_id}/frames`, which
/// splits on `/` into `["s3:", "", bucket, folder, video_id, "frames"]`.
const VIDEO_ID_SEGMENT: usize = 4;
const FRAMES_SEGMENT: usize = VIDEO_ID_SEGMENT + 1;

/// "Transcoding finished" event received by the handler
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranscodeCompleteEvent {
    #[serde(default, deserialize_with = "null_as_default")]
    pub detail: EventDetail,
}

/// Event detail carrying the job outputs
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDetail {
    #[serde(default, deserialize_with = "null_as_default")]
    pub output_group_details: Vec<OutputGroupDetail>,
}

/// One output group of the transcoding job
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputGroupDetail {
    #[serde(default, deserialize_with = "null_as_default")]
    pub output_details: Vec<OutputDetail>,
}

/// Output files produced for one output of a group
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputDetail {
    #[serde(default, deserialize_with = "null_as_default")]
    pub output_file_paths: Vec<String>,
}

/// Read an explicit `null` the same way as a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Errors raised while locating the video identifier
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ExtractError {
    #[error("no output path contains /frames/")]
    FramesNotFound,

    #[error("frames path does not match s3://<bucket>/<folder>/<video_id>/frames/: {path}")]
    TemplateMismatch { path: String },
}

impl TranscodeCompleteEvent {
    /// Iterate over every output file path, in event order
    pub fn output_file_paths(&self) -> impl Iterator<Item = &str> {
        self.detail
            .output_group_details
            .iter()
            .flat_map(|group| group.output_details.iter())
            .flat_map(|detail| detail.output_file_paths.iter())
            .map(String::as_str)
    }

    /// First output path pointing inside a frames folder
    pub fn frames_path(&self) -> Option<&str> {
        self.output_file_paths()
            .find(|path| path.contains(FRAMES_MARKER))
    }

    /// Extract the video identifier from the first frames output path
    pub fn video_id(&self) -> Result<String, ExtractError> {
        let path = self.frames_path().ok_or(ExtractError::FramesNotFound)?;
        video_id_from_frames_path(path)
    }
}

/// Parse `s3://{bucket}/{folder}/{video_id}/frames/{file}` and return `video_id`
pub fn video_id_from_frames_path(path: &str) -> Result<String, ExtractError> {
    let mismatch = || ExtractError::TemplateMismatch {
        path: path.to_string(),
    };

    // Drop the file name, keeping the containing folder
    let folder = path.rsplit_once('/').map(|(dir, _)| dir).ok_or_else(mismatch)?;
    let segments: Vec<&str> = folder.split('/').collect();

    match (segments.get(VIDEO_ID_SEGMENT), segments.get(FRAMES_SEGMENT)) {
        (Some(video_id), Some(&"frames")) if !video_id.is_empty() => Ok(video_id.to_string()),
        _ => Err(mismatch()),
    }
}
