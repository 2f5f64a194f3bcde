use crate::config::DynamoDbConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_sdk_dynamodb::config::Builder as DynamoConfigBuilder;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoClient;
use aws_types::SdkConfig;
use std::collections::HashMap;
use tracing::{debug, info, instrument};

pub const VIDEO_ID_ATTR: &str = "videoId";
pub const VIDEO_NAME_ATTR: &str = "videoName";
pub const USER_DATA_ATTR: &str = "user_data";
pub const EMAIL_ATTR: &str = "email";
pub const LINK_DOWNLOAD_ATTR: &str = "link_download";

/// A video record as stored in the videos table.
///
/// The full item is kept so that writing it back does not drop attributes
/// this service does not know about.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VideoRecord {
    item: HashMap<String, AttributeValue>,
}

impl VideoRecord {
    pub fn from_item(item: HashMap<String, AttributeValue>) -> Self {
        Self { item }
    }

    pub fn into_item(self) -> HashMap<String, AttributeValue> {
        self.item
    }

    pub fn item(&self) -> &HashMap<String, AttributeValue> {
        &self.item
    }

    pub fn video_id(&self) -> Option<&str> {
        self.string_attr(VIDEO_ID_ATTR)
    }

    pub fn video_name(&self) -> Option<&str> {
        self.string_attr(VIDEO_NAME_ATTR)
    }

    /// Owner address stored under `user_data.email`
    pub fn owner_email(&self) -> Option<&str> {
        match self.item.get(USER_DATA_ATTR) {
            Some(AttributeValue::M(user_data)) => match user_data.get(EMAIL_ATTR) {
                Some(AttributeValue::S(email)) => Some(email.as_str()),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn link_download(&self) -> Option<&str> {
        self.string_attr(LINK_DOWNLOAD_ATTR)
    }

    pub fn set_link_download(&mut self, url: &str) {
        self.item.insert(
            LINK_DOWNLOAD_ATTR.to_string(),
            AttributeValue::S(url.to_string()),
        );
    }

    fn string_attr(&self, name: &str) -> Option<&str> {
        match self.item.get(name) {
            Some(AttributeValue::S(value)) => Some(value.as_str()),
            _ => None,
        }
    }
}

/// Read and write access to the video records
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VideoRecordStore: Send + Sync {
    /// First record whose `videoId` equals `video_id`, if any
    async fn find_by_video_id(&self, video_id: &str) -> Result<Option<VideoRecord>>;

    /// Overwrite the full record
    async fn put_record(&self, record: &VideoRecord) -> Result<()>;
}

/// DynamoDB-backed video record store
pub struct DynamoVideoRecordStore {
    client: DynamoClient,
    table: String,
    video_index: String,
}

impl DynamoVideoRecordStore {
    pub fn new(sdk_config: &SdkConfig, config: &DynamoDbConfig) -> Self {
        let mut builder = DynamoConfigBuilder::from(sdk_config);

        if let Some(ref region) = config.region {
            builder = builder.region(aws_sdk_dynamodb::config::Region::new(region.clone()));
        }

        // DynamoDB Local
        if let Some(ref endpoint_url) = config.endpoint_url {
            builder = builder.endpoint_url(endpoint_url);
        }

        info!(
            table = %config.table,
            index = %config.video_index,
            "DynamoDB video record store initialized"
        );

        Self {
            client: DynamoClient::from_conf(builder.build()),
            table: config.table.clone(),
            video_index: config.video_index.clone(),
        }
    }
}

#[async_trait]
impl VideoRecordStore for DynamoVideoRecordStore {
    #[instrument(skip(self))]
    async fn find_by_video_id(&self, video_id: &str) -> Result<Option<VideoRecord>> {
        let output = self
            .client
            .query()
            .table_name(&self.table)
            .index_name(&self.video_index)
            .key_condition_expression("videoId = :videoId")
            .expression_attribute_values(":videoId", AttributeValue::S(video_id.to_string()))
            .send()
            .await
            .context("Failed to query video records")?;

        let record = output
            .items
            .and_then(|items| items.into_iter().next())
            .map(VideoRecord::from_item);

        debug!(found = record.is_some(), "Video record lookup finished");

        Ok(record)
    }

    #[instrument(skip(self, record), fields(video_id = ?record.video_id()))]
    async fn put_record(&self, record: &VideoRecord) -> Result<()> {
        self.client
            .put_item()
            .table_name(&self.table)
            .set_item(Some(record.item().clone()))
            .send()
            .await
            .context("Failed to write video record")?;

        Ok(())
    }
}
