use meetup_shared::push::PushError;
use meetup_shared::store::StoreError;
use std::fmt;
use thiserror::Error;

/// Which side of the meetup a profile lookup was for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserRole {
    Invited,
    Requesting,
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRole::Invited => write!(f, "Invited"),
            UserRole::Requesting => write!(f, "Requesting"),
        }
    }
}

#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("No data associated with the event")]
    MissingPayload,

    #[error("Malformed meetup record: {0}")]
    InvalidPayload(String),

    #[error("{role} user profile not found for ID: {user_id}")]
    ProfileNotFound { role: UserRole, user_id: String },

    #[error("User {user_id} does not have an FCM token. Cannot send notification.")]
    MissingToken { user_id: String },

    #[error("Failed to look up user profile: {0}")]
    LookupFailed(#[from] StoreError),

    #[error("Failed to send push notification: {0}")]
    SendFailed(#[from] PushError),
}

impl NotificationError {
    /// Expected conditions that end an invocation without being failures
    pub fn is_skip(&self) -> bool {
        matches!(
            self,
            NotificationError::MissingPayload | NotificationError::MissingToken { .. }
        )
    }
}
