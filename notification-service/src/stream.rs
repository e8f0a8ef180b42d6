use aws_lambda_events::event::dynamodb::{Event, EventRecord};
use log::{debug, error, info};
use meetup_shared::models::{MeetupCreatedEvent, MeetupRecord};
use meetup_shared::push::PushSender;
use meetup_shared::store::UserStore;
use serde::de::IgnoredAny;
use serde::Deserialize;
use std::collections::HashMap;

use crate::errors::NotificationError;
use crate::notifier::handle_meetup_created;

const INSERT_EVENT: &str = "INSERT";

/// Key image of a `meetups` table item
#[derive(Deserialize, Debug)]
struct MeetupKey {
    id: String,
}

/// Counts for one stream batch
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub records: usize,
    pub creations: usize,
    pub notifications_sent: usize,
}

/// Turns a stream record into a creation event.
///
/// Returns `Ok(None)` for records that are not inserts. An insert without a
/// new image yields an event with no payload.
pub fn meetup_created_event(
    record: &EventRecord,
) -> Result<Option<MeetupCreatedEvent>, NotificationError> {
    if record.event_name != INSERT_EVENT {
        return Ok(None);
    }

    let key: MeetupKey = serde_dynamo::from_item(record.change.keys.clone())
        .map_err(|e| NotificationError::InvalidPayload(format!("missing meetup id: {}", e)))?;

    let image = &record.change.new_image;
    let fields: HashMap<String, IgnoredAny> = serde_dynamo::from_item(image.clone())
        .map_err(|e| NotificationError::InvalidPayload(e.to_string()))?;

    if fields.is_empty() {
        return Ok(Some(MeetupCreatedEvent::without_payload(key.id)));
    }

    let meetup: MeetupRecord = serde_dynamo::from_item(image.clone()).map_err(|e| {
        NotificationError::InvalidPayload(format!("meetup {}: {}", key.id, e))
    })?;

    Ok(Some(MeetupCreatedEvent::new(key.id, meetup)))
}

/// Processes each record of a stream batch in order. A failure in one
/// record never affects the others.
pub async fn process_stream_batch<U, P>(event: &Event, users: &U, push: &P) -> BatchSummary
where
    U: UserStore + ?Sized,
    P: PushSender + ?Sized,
{
    let mut summary = BatchSummary {
        records: event.records.len(),
        ..Default::default()
    };

    for record in &event.records {
        info!(
            "Processing stream record: event_id={}, event_name={}",
            record.event_id, record.event_name
        );

        let created = match meetup_created_event(record) {
            Ok(Some(created)) => created,
            Ok(None) => {
                debug!("Ignoring {} record {}", record.event_name, record.event_id);
                continue;
            }
            Err(e) => {
                error!("Failed to decode stream record {}: {}", record.event_id, e);
                continue;
            }
        };

        summary.creations += 1;

        if handle_meetup_created(users, push, &created).await {
            summary.notifications_sent += 1;
        }
    }

    summary
}
