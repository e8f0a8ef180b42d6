use serde::{Deserialize, Serialize};

use super::MeetupRecord;

/// Event for a newly created meetup record
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MeetupCreatedEvent {
    pub meetup_id: String,
    /// `None` when the creation event arrived without a document image.
    #[serde(default)]
    pub record: Option<MeetupRecord>,
}

impl MeetupCreatedEvent {
    pub fn new(meetup_id: impl Into<String>, record: MeetupRecord) -> Self {
        Self {
            meetup_id: meetup_id.into(),
            record: Some(record),
        }
    }

    pub fn without_payload(meetup_id: impl Into<String>) -> Self {
        Self {
            meetup_id: meetup_id.into(),
            record: None,
        }
    }
}
