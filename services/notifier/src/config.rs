use serde::Deserialize;
use std::time::Duration;

/// Name of the environment variable holding the sender address
pub const EMAIL_SENDER_ENV: &str = "email_sender";

/// Main configuration for the frame notifier
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Service configuration
    #[serde(default)]
    pub service: ServiceConfig,
    /// S3 configuration
    #[serde(default)]
    pub s3: S3Config,
    /// DynamoDB configuration
    #[serde(default)]
    pub dynamodb: DynamoDbConfig,
    /// Email configuration
    pub email: EmailConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Service name for logging
    #[serde(default = "default_service_name")]
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// S3 storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct S3Config {
    /// Bucket holding the video frames and archives
    #[serde(default = "default_bucket")]
    pub bucket: String,
    /// AWS region
    #[serde(default = "default_region")]
    pub region: String,
    /// Custom endpoint URL (for MinIO, LocalStack, etc.)
    pub endpoint_url: Option<String>,
    /// Force path-style access (required for MinIO)
    #[serde(default)]
    pub force_path_style: bool,
    /// Presigned URL expiration in seconds
    #[serde(default = "default_presigned_url_expiry_secs")]
    pub presigned_url_expiry_secs: u64,
}

/// Video records table configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DynamoDbConfig {
    /// Table holding the video records
    #[serde(default = "default_table")]
    pub table: String,
    /// Secondary index keyed on `videoId`
    #[serde(default = "default_video_index")]
    pub video_index: String,
    /// Region override; the shared AWS config region is used when unset
    pub region: Option<String>,
    /// Custom endpoint URL (for DynamoDB Local)
    pub endpoint_url: Option<String>,
}

/// Email delivery configuration
#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    /// Sender address, normally supplied through `email_sender`
    pub sender: String,
    /// AWS region for SES
    #[serde(default = "default_region")]
    pub region: String,
    /// Subject of the completion email
    #[serde(default = "default_subject")]
    pub subject: String,
}

// Default value functions
fn default_service_name() -> String {
    "frame-notifier".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_bucket() -> String {
    "amz.video-upload.bucket".to_string()
}

fn default_region() -> String {
    "us-east-2".to_string()
}

fn default_presigned_url_expiry_secs() -> u64 {
    86_400 // 24 hours
}

fn default_table() -> String {
    "VideosTable".to_string()
}

fn default_video_index() -> String {
    "videoId-index".to_string()
}

fn default_subject() -> String {
    "Notificação de processamento de vídeo".to_string()
}

impl Config {
    /// Load configuration from environment and config files
    pub fn load() -> anyhow::Result<Self> {
        let config = config::Config::builder()
            .set_default("service.name", default_service_name())?
            .set_default("service.log_level", default_log_level())?
            // Add config file if present
            .add_source(config::File::with_name("config/notifier").required(false))
            .add_source(config::File::with_name("/etc/frame-notifier/notifier").required(false))
            // NOTIFIER__S3__BUCKET -> s3.bucket
            .add_source(
                config::Environment::with_prefix("NOTIFIER")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("email.sender", std::env::var(EMAIL_SENDER_ENV).ok())?
            .build()?;

        config.try_deserialize().map_err(Into::into)
    }

    /// Get presigned URL expiry as Duration
    pub fn presigned_url_expiry(&self) -> Duration {
        Duration::from_secs(self.s3.presigned_url_expiry_secs)
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            log_level: default_log_level(),
        }
    }
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            bucket: default_bucket(),
            region: default_region(),
            endpoint_url: None,
            force_path_style: false,
            presigned_url_expiry_secs: default_presigned_url_expiry_secs(),
        }
    }
}

impl Default for DynamoDbConfig {
    fn default() -> Self {
        Self {
            table: default_table(),
            video_index: default_video_index(),
            region: None,
            endpoint_url: None,
        }
    }
}
