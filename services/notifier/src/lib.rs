//! Frame Notifier
//!
//! Completion step of the video-processing pipeline. When a transcoding job
//! finishes, this service archives the extracted frames of the video, emails
//! the owner a time-limited download link and records that link on the
//! video's record.
//!
//! ## Flow
//!
//! ```text
//! Transcode complete          S3 Bucket                  DynamoDB
//! ┌──────────────┐           ┌──────────────────┐       ┌──────────────┐
//! │ Event        │           │ videos/{id}/     │       │ VideosTable  │
//! │ (frames path)│           │   frames/*       │       │ videoId-index│
//! └──────────────┘           │   frames.zip     │       └──────────────┘
//!        │                   └──────────────────┘              ▲
//!        ▼                      ▲          │                   │
//! ┌──────────────┐              │          │ presigned URL     │
//! │ Extract      │   list/get/put          ▼                   │
//! │ video id     │──────▶ Archiver   ┌──────────────┐          │
//! └──────────────┘                   │ Notifier     │──────────┘
//!                                    │  SES email   │
//!                                    └──────────────┘
//! ```
//!
//! Every external service sits behind a trait ([`ObjectStore`],
//! [`VideoRecordStore`], [`EmailSender`]) so the handler can be driven with
//! fakes in tests.

pub mod archiver;
pub mod config;
pub mod email;
pub mod error;
pub mod event;
pub mod handler;
pub mod notifier;
pub mod object_store;
pub mod video_records;

pub use archiver::{ArchiveError, FrameArchiver};
pub use config::Config;
pub use email::{EmailSender, SesEmailSender};
pub use error::NotifierError;
pub use event::{ExtractError, TranscodeCompleteEvent};
pub use handler::{FramesNotificationHandler, HandlerResponse};
pub use notifier::{DownloadLink, Notifier, NotifierSettings};
pub use object_store::{ObjectStore, ObjectSummary, S3ObjectStore};
pub use video_records::{DynamoVideoRecordStore, VideoRecord, VideoRecordStore};
