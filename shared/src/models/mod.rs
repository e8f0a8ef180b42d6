use serde::{Deserialize, Serialize};

pub mod events;

pub use events::MeetupCreatedEvent;

/// Display name used when a requester has no name on their profile
pub const DEFAULT_DISPLAY_NAME: &str = "Someone";

/// A meetup request between two users, as stored in the `meetups` table
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MeetupRecord {
    pub invited_user_id: String,
    pub requesting_user_id: String,
}

/// The slice of a user document this service reads
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fcm_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
}

impl UserProfile {
    /// The device token to notify, ignoring empty strings
    pub fn push_token(&self) -> Option<&str> {
        self.fcm_token.as_deref().filter(|token| !token.is_empty())
    }

    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_DISPLAY_NAME)
    }
}

/// Data block attached to a push notification
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NotificationData {
    #[serde(rename = "type")]
    pub kind: String,
    pub meetup_id: String,
}

/// A single push notification, built per invocation and never persisted
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct NotificationPayload {
    pub title: String,
    pub body: String,
    pub sound: String,
    pub token: String,
    pub data: NotificationData,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_falls_back_to_someone() {
        let unnamed = UserProfile::default();
        assert_eq!(unnamed.display_name(), "Someone");

        let blank = UserProfile {
            full_name: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(blank.display_name(), "Someone");

        let named = UserProfile {
            full_name: Some("Ana".to_string()),
            ..Default::default()
        };
        assert_eq!(named.display_name(), "Ana");
    }

    #[test]
    fn test_empty_push_token_is_treated_as_missing() {
        let profile = UserProfile {
            fcm_token: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(profile.push_token(), None);

        let profile = UserProfile {
            fcm_token: Some("T1".to_string()),
            ..Default::default()
        };
        assert_eq!(profile.push_token(), Some("T1"));
    }

    #[test]
    fn test_user_profile_ignores_unknown_fields() {
        let profile: UserProfile = serde_json::from_value(serde_json::json!({
            "fullName": "Ana",
            "email": "ana@example.com",
            "age": 31
        }))
        .unwrap();

        assert_eq!(profile.full_name.as_deref(), Some("Ana"));
        assert!(profile.fcm_token.is_none());
    }

    #[test]
    fn test_meetup_record_uses_camel_case_fields() {
        let record: MeetupRecord = serde_json::from_value(serde_json::json!({
            "invitedUserId": "u1",
            "requestingUserId": "u2",
            "status": "pending"
        }))
        .unwrap();

        assert_eq!(record.invited_user_id, "u1");
        assert_eq!(record.requesting_user_id, "u2");
    }

    #[test]
    fn test_notification_data_serializes_type_tag() {
        let data = NotificationData {
            kind: "meetup_request".to_string(),
            meetup_id: "m1".to_string(),
        };
        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "type": "meetup_request", "meetupId": "m1" })
        );
    }
}
