use aws_lambda_events::event::dynamodb::Event;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use log::info;
use meetup_shared::config::NotifierConfig;
use meetup_shared::push::FcmPushSender;
use meetup_shared::store::dynamo::DynamoUserStore;
use std::sync::Arc;

mod errors;
mod notifier;
mod stream;


use stream::process_stream_batch;

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Initialize env_logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("Starting Meetup Notification Service Lambda");

    let config = NotifierConfig::from_env()?;

    // Clients are created once and shared by every invocation
    let user_store = Arc::new(
        DynamoUserStore::new(&config.users_table, config.dynamodb_endpoint.as_deref()).await,
    );
    let push_sender = Arc::new(FcmPushSender::from_config(&config.fcm)?);

    lambda_runtime::run(service_fn(|event| {
        handler(event, user_store.clone(), push_sender.clone())
    }))
    .await?;

    Ok(())
}

/// Lambda handler for the `meetups` table stream
async fn handler(
    event: LambdaEvent<Event>,
    user_store: Arc<DynamoUserStore>,
    push_sender: Arc<FcmPushSender>,
) -> Result<(), Error> {
    info!(
        "Received stream batch with {} records (request_id={})",
        event.payload.records.len(),
        event.context.request_id
    );

    let summary = process_stream_batch(&event.payload, &*user_store, &*push_sender).await;

    info!(
        "Stream batch complete. records={}, creations={}, notifications_sent={}",
        summary.records, summary.creations, summary.notifications_sent
    );

    Ok(())
}
