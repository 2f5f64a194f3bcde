use anyhow::Context;
use aws_config::BehaviorVersion;
use frame_notifier::{
    Config, DynamoVideoRecordStore, EmailSender, FrameArchiver, FramesNotificationHandler,
    HandlerResponse, Notifier, NotifierSettings, ObjectStore, S3ObjectStore,
    SesEmailSender, TranscodeCompleteEvent, VideoRecordStore,
};
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load configuration
    let config = Config::load().context("Failed to load configuration")?;

    // Initialize logging
    init_tracing(&config.service.log_level);

    info!(service = %config.service.name, "Starting frame notifier");

    // Shared config keeps the environment's region; S3 and SES pin their own
    let sdk_config = aws_config::defaults(BehaviorVersion::latest()).load().await;

    // Clients are built once per process and shared across invocations
    let store: Arc<dyn ObjectStore> = Arc::new(S3ObjectStore::new(&sdk_config, &config.s3));
    let records: Arc<dyn VideoRecordStore> =
        Arc::new(DynamoVideoRecordStore::new(&sdk_config, &config.dynamodb));
    let email: Arc<dyn EmailSender> = Arc::new(SesEmailSender::new(&sdk_config, &config.email));

    let notifier = Notifier::new(
        store.clone(),
        email,
        records.clone(),
        NotifierSettings {
            sender: config.email.sender.clone(),
            subject: config.email.subject.clone(),
            link_expiry: config.presigned_url_expiry(),
        },
    );

    let handler = Arc::new(FramesNotificationHandler::new(
        FrameArchiver::new(store),
        records,
        notifier,
    ));

    info!("Frame notifier initialized");

    run(service_fn(move |event: LambdaEvent<TranscodeCompleteEvent>| {
        let handler = handler.clone();
        async move { Ok::<HandlerResponse, Error>(handler.handle(&event.payload).await) }
    }))
    .await
}

/// Initialize tracing/logging
fn init_tracing(log_level: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().json().without_time())
        .init();
}
