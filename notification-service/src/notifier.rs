use log::{error, info};
use meetup_shared::models::{MeetupCreatedEvent, UserProfile};
use meetup_shared::push::{meetup_request_notification, PushSender};
use meetup_shared::store::UserStore;

use crate::errors::{NotificationError, UserRole};

async fn fetch_profile<U>(
    users: &U,
    user_id: &str,
    role: UserRole,
) -> Result<UserProfile, NotificationError>
where
    U: UserStore + ?Sized,
{
    users
        .get_user(user_id)
        .await?
        .ok_or_else(|| NotificationError::ProfileNotFound {
            role,
            user_id: user_id.to_string(),
        })
}

/// Notify the invited user of a newly created meetup.
///
/// Reads the invited profile, then the requester's, and sends one push
/// notification. Returns the push provider's message id.
pub async fn notify_meetup_created<U, P>(
    users: &U,
    push: &P,
    event: &MeetupCreatedEvent,
) -> Result<String, NotificationError>
where
    U: UserStore + ?Sized,
    P: PushSender + ?Sized,
{
    let record = event
        .record
        .as_ref()
        .ok_or(NotificationError::MissingPayload)?;

    info!(
        "New meetup created. meetup_id={}, invited={}, requester={}",
        event.meetup_id, record.invited_user_id, record.requesting_user_id
    );

    let invited = fetch_profile(users, &record.invited_user_id, UserRole::Invited).await?;
    let token = invited
        .push_token()
        .ok_or_else(|| NotificationError::MissingToken {
            user_id: record.invited_user_id.clone(),
        })?;

    let requester =
        fetch_profile(users, &record.requesting_user_id, UserRole::Requesting).await?;

    let payload = meetup_request_notification(token, requester.display_name(), &event.meetup_id);

    info!("Sending notification to token: {}", token);
    let message_id = push.send(&payload).await?;

    Ok(message_id)
}

/// Runs [`notify_meetup_created`] and logs the outcome. Never fails: every
/// error ends the invocation quietly so the trigger is not reported as failed.
///
/// Returns whether a notification was sent.
pub async fn handle_meetup_created<U, P>(users: &U, push: &P, event: &MeetupCreatedEvent) -> bool
where
    U: UserStore + ?Sized,
    P: PushSender + ?Sized,
{
    match notify_meetup_created(users, push, event).await {
        Ok(message_id) => {
            info!(
                "Successfully sent push notification for meetup_id={}: {}",
                event.meetup_id, message_id
            );
            true
        }
        Err(e) if e.is_skip() => {
            info!("Skipping meetup_id={}: {}", event.meetup_id, e);
            false
        }
        Err(e) => {
            error!("Error sending notification for meetup_id={}: {}", event.meetup_id, e);
            false
        }
    }
}
