use crate::config::S3Config;
use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_sdk_s3::config::Builder as S3ConfigBuilder;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use aws_types::SdkConfig;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Key and size of a listed object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectSummary {
    pub key: String,
    pub size: i64,
}

impl ObjectSummary {
    pub fn new(key: impl Into<String>, size: i64) -> Self {
        Self {
            key: key.into(),
            size,
        }
    }

    /// Final path component of the key
    pub fn file_name(&self) -> &str {
        self.key.rsplit('/').next().unwrap_or(&self.key)
    }
}

/// Object storage operations used by the archiver and the notifier
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// List every object under a prefix
    async fn list_objects(&self, prefix: &str) -> Result<Vec<ObjectSummary>>;

    /// Download an object's bytes
    async fn get_object(&self, key: &str) -> Result<Vec<u8>>;

    /// Upload an object, replacing any existing one
    async fn put_object(&self, key: &str, body: Vec<u8>, content_type: &str) -> Result<()>;

    /// Presigned GET URL for a key
    async fn presign_get(&self, key: &str, expires_in: Duration) -> Result<String>;
}

/// S3-backed object store bound to a single bucket
pub struct S3ObjectStore {
    client: S3Client,
    bucket: String,
}

impl S3ObjectStore {
    /// Create a new S3 object store
    pub fn new(sdk_config: &SdkConfig, config: &S3Config) -> Self {
        let mut s3_config_builder = S3ConfigBuilder::from(sdk_config)
            .region(aws_sdk_s3::config::Region::new(config.region.clone()));

        // Configure custom endpoint for MinIO/LocalStack
        if let Some(ref endpoint_url) = config.endpoint_url {
            s3_config_builder = s3_config_builder.endpoint_url(endpoint_url);
        }

        // Force path-style access for MinIO compatibility
        if config.force_path_style {
            s3_config_builder = s3_config_builder.force_path_style(true);
        }

        let client = S3Client::from_conf(s3_config_builder.build());

        info!(
            bucket = %config.bucket,
            region = %config.region,
            "S3 object store initialized"
        );

        Self {
            client,
            bucket: config.bucket.clone(),
        }
    }

    /// Wrap an already configured client
    pub fn from_client(client: S3Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    #[instrument(skip(self))]
    async fn list_objects(&self, prefix: &str) -> Result<Vec<ObjectSummary>> {
        let mut objects = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let response = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(prefix)
                .set_continuation_token(continuation_token.take())
                .send()
                .await
                .context("Failed to list objects")?;

            objects.extend(response.contents().iter().filter_map(|obj| {
                obj.key()
                    .map(|key| ObjectSummary::new(key, obj.size().unwrap_or_default()))
            }));

            match response.next_continuation_token() {
                Some(token) if response.is_truncated().unwrap_or(false) => {
                    continuation_token = Some(token.to_string());
                }
                _ => break,
            }
        }

        debug!(prefix = %prefix, object_count = objects.len(), "Listed objects");

        Ok(objects)
    }

    #[instrument(skip(self))]
    async fn get_object(&self, key: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .with_context(|| format!("Failed to get object {key}"))?;

        let body = response
            .body
            .collect()
            .await
            .context("Failed to read object body")?;

        Ok(body.into_bytes().to_vec())
    }

    #[instrument(skip(self, body), fields(size_bytes = body.len()))]
    async fn put_object(&self, key: &str, body: Vec<u8>, content_type: &str) -> Result<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .send()
            .await
            .with_context(|| format!("Failed to upload object {key}"))?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn presign_get(&self, key: &str, expires_in: Duration) -> Result<String> {
        let presigning_config =
            PresigningConfig::expires_in(expires_in).context("Failed to create presigning config")?;

        let presigned = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presigning_config)
            .await
            .context("Failed to generate presigned URL")?;

        Ok(presigned.uri().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_s3::operation::list_objects_v2::ListObjectsV2Output;
    use aws_sdk_s3::types::Object;
    use aws_smithy_mocks::{mock, mock_client};

    #[test]
    fn test_file_name() {
        assert_eq!(
            ObjectSummary::new("videos/456/frames/out.0000001.jpg", 10).file_name(),
            "out.0000001.jpg"
        );
        assert_eq!(ObjectSummary::new("plain.jpg", 10).file_name(), "plain.jpg");
        assert_eq!(ObjectSummary::new("videos/456/frames/", 0).file_name(), "");
    }

    #[tokio::test]
    async fn test_list_objects_follows_continuation_token() {
        let first_page = mock!(aws_sdk_s3::Client::list_objects_v2)
            .match_requests(|req| {
                req.prefix() == Some("videos/1/frames/") && req.continuation_token().is_none()
            })
            .then_output(|| {
                ListObjectsV2Output::builder()
                    .contents(Object::builder().key("videos/1/frames/a.jpg").size(3).build())
                    .contents(Object::builder().key("videos/1/frames/b.jpg").size(4).build())
                    .is_truncated(true)
                    .next_continuation_token("page-2")
                    .build()
            });
        let second_page = mock!(aws_sdk_s3::Client::list_objects_v2)
            .match_requests(|req| req.continuation_token() == Some("page-2"))
            .then_output(|| {
                ListObjectsV2Output::builder()
                    .contents(Object::builder().key("videos/1/frames/c.jpg").size(5).build())
                    .is_truncated(false)
                    .build()
            });

        let client = mock_client!(aws_sdk_s3, [&first_page, &second_page]);
        let store = S3ObjectStore::from_client(client, "frames-bucket");

        let objects = store.list_objects("videos/1/frames/").await.unwrap();

        assert_eq!(
            objects,
            vec![
                ObjectSummary::new("videos/1/frames/a.jpg", 3),
                ObjectSummary::new("videos/1/frames/b.jpg", 4),
                ObjectSummary::new("videos/1/frames/c.jpg", 5),
            ]
        );
        assert_eq!(first_page.num_calls(), 1);
        assert_eq!(second_page.num_calls(), 1);
    }

    #[test]
    fn test_bucket_region_ignores_shared_region() {
        let sdk_config = SdkConfig::builder()
            .region(aws_types::region::Region::new("eu-west-1"))
            .behavior_version(aws_config::BehaviorVersion::latest())
            .build();

        let store = S3ObjectStore::new(&sdk_config, &S3Config::default());

        assert_eq!(
            store.client.config().region().map(|r| r.as_ref()),
            Some("us-east-2")
        );
    }
}
