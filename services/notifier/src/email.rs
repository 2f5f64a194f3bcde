use crate::config::EmailConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_sdk_sesv2::config::Builder as SesConfigBuilder;
use aws_sdk_sesv2::types::{Body, Content, Destination, EmailContent, Message};
use aws_sdk_sesv2::Client as SesClient;
use aws_types::SdkConfig;
use tracing::{info, instrument};

const CHARSET: &str = "UTF-8";

/// Outbound HTML email delivery
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send_html(&self, from: &str, to: &str, subject: &str, html: &str) -> Result<()>;
}

/// SES v2 email sender
pub struct SesEmailSender {
    client: SesClient,
}

impl SesEmailSender {
    pub fn new(sdk_config: &SdkConfig, config: &EmailConfig) -> Self {
        let ses_config = SesConfigBuilder::from(sdk_config)
            .region(aws_sdk_sesv2::config::Region::new(config.region.clone()))
            .build();

        info!(region = %config.region, "SES email sender initialized");

        Self {
            client: SesClient::from_conf(ses_config),
        }
    }
}

#[async_trait]
impl EmailSender for SesEmailSender {
    #[instrument(skip(self, subject, html))]
    async fn send_html(&self, from: &str, to: &str, subject: &str, html: &str) -> Result<()> {
        let destination = Destination::builder().to_addresses(to).build();

        let subject = Content::builder()
            .data(subject)
            .charset(CHARSET)
            .build()
            .context("building subject Content")?;

        let body = Content::builder()
            .data(html)
            .charset(CHARSET)
            .build()
            .context("building body Content")?;

        let message = Message::builder()
            .subject(subject)
            .body(Body::builder().html(body).build())
            .build();

        self.client
            .send_email()
            .from_email_address(from)
            .destination(destination)
            .content(EmailContent::builder().simple(message).build())
            .send()
            .await
            .with_context(|| format!("Failed to send email to {to}"))?;

        Ok(())
    }
}
