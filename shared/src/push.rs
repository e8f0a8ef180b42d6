use async_trait::async_trait;
use log::{debug, error, info};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use crate::config::FcmConfig;
use crate::fcm_auth::{token_provider_from_credentials, TokenProvider};
use crate::models::{NotificationData, NotificationPayload};

pub const DEFAULT_FCM_ENDPOINT: &str = "https://fcm.googleapis.com";

const MEETUP_REQUEST_TITLE: &str = "You have a new date request! ✨";
const MEETUP_REQUEST_TYPE: &str = "meetup_request";
const DEFAULT_SOUND: &str = "default";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PushError {
    #[error("Failed to reach push service: {0}")]
    Network(String),

    #[error("Push token rejected: {0}")]
    InvalidToken(String),

    #[error("Push quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("Push service authentication failed: {0}")]
    Auth(String),

    #[error("Push service returned {status}: {message}")]
    Service { status: u16, message: String },

    #[error("Unexpected push service response: {0}")]
    InvalidResponse(String),
}

/// Delivers a single notification, returning the provider's message id
#[async_trait]
pub trait PushSender: Send + Sync {
    async fn send(&self, payload: &NotificationPayload) -> Result<String, PushError>;
}

/// Builds the notification telling the invited user about a new meetup request
pub fn meetup_request_notification(
    token: &str,
    requester_name: &str,
    meetup_id: &str,
) -> NotificationPayload {
    let body = format!(
        "{} has invited you for a meetup. Open the app to respond.",
        requester_name
    );

    NotificationPayload {
        title: MEETUP_REQUEST_TITLE.to_string(),
        body,
        sound: DEFAULT_SOUND.to_string(),
        token: token.to_string(),
        data: NotificationData {
            kind: MEETUP_REQUEST_TYPE.to_string(),
            meetup_id: meetup_id.to_string(),
        },
    }
}

#[derive(Debug, Serialize)]
struct FcmSendRequest<'a> {
    message: FcmMessage<'a>,
}

#[derive(Debug, Serialize)]
struct FcmMessage<'a> {
    token: &'a str,
    notification: FcmNotification<'a>,
    android: AndroidConfig<'a>,
    apns: ApnsConfig<'a>,
    data: &'a NotificationData,
}

#[derive(Debug, Serialize)]
struct FcmNotification<'a> {
    title: &'a str,
    body: &'a str,
}

#[derive(Debug, Serialize)]
struct AndroidConfig<'a> {
    notification: AndroidNotification<'a>,
}

#[derive(Debug, Serialize)]
struct AndroidNotification<'a> {
    sound: &'a str,
}

#[derive(Debug, Serialize)]
struct ApnsConfig<'a> {
    payload: ApnsPayload<'a>,
}

#[derive(Debug, Serialize)]
struct ApnsPayload<'a> {
    aps: Aps<'a>,
}

#[derive(Debug, Serialize)]
struct Aps<'a> {
    sound: &'a str,
}

impl<'a> From<&'a NotificationPayload> for FcmSendRequest<'a> {
    fn from(payload: &'a NotificationPayload) -> Self {
        Self {
            message: FcmMessage {
                token: &payload.token,
                notification: FcmNotification {
                    title: &payload.title,
                    body: &payload.body,
                },
                android: AndroidConfig {
                    notification: AndroidNotification {
                        sound: &payload.sound,
                    },
                },
                apns: ApnsConfig {
                    payload: ApnsPayload {
                        aps: Aps {
                            sound: &payload.sound,
                        },
                    },
                },
                data: &payload.data,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct FcmSendResponse {
    name: String,
}

#[derive(Debug, Deserialize)]
struct FcmErrorResponse {
    error: FcmErrorBody,
}

#[derive(Debug, Deserialize)]
struct FcmErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    details: Vec<FcmErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct FcmErrorDetail {
    #[serde(rename = "errorCode", default)]
    error_code: Option<String>,
}

/// Maps a non-success FCM response onto a `PushError`
fn classify_error(status: StatusCode, body: &str) -> PushError {
    let parsed = serde_json::from_str::<FcmErrorResponse>(body)
        .ok()
        .map(|response| response.error);

    let message = parsed
        .as_ref()
        .and_then(|e| e.message.clone())
        .unwrap_or_else(|| body.to_string());

    // The FCM-specific error code is more precise than the generic status
    let code = parsed.and_then(|e| {
        e.details
            .into_iter()
            .find_map(|d| d.error_code)
            .or(e.status)
    });

    match (status.as_u16(), code.as_deref()) {
        (_, Some("UNREGISTERED")) | (_, Some("INVALID_ARGUMENT")) | (404, _) => {
            PushError::InvalidToken(message)
        }
        (_, Some("QUOTA_EXCEEDED")) | (_, Some("RESOURCE_EXHAUSTED")) | (429, _) => {
            PushError::QuotaExceeded(message)
        }
        (401, _) | (403, _) => PushError::Auth(message),
        (status, _) => PushError::Service { status, message },
    }
}

/// Sends notifications through the FCM HTTP v1 API
pub struct FcmPushSender {
    client: Client,
    endpoint: String,
    project_id: String,
    tokens: Arc<dyn TokenProvider>,
}

impl FcmPushSender {
    pub fn with_endpoint(
        client: Client,
        endpoint: String,
        project_id: String,
        tokens: Arc<dyn TokenProvider>,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            project_id,
            tokens,
        }
    }

    /// Creates a sender and its access-token source from loaded configuration
    pub fn from_config(config: &FcmConfig) -> Result<Self, PushError> {
        let client = Client::new();
        let tokens = token_provider_from_credentials(client.clone(), &config.credentials)?;

        info!(
            "Configured FCM sender for project {} at {}",
            config.project_id, config.endpoint
        );

        Ok(Self::with_endpoint(
            client,
            config.endpoint.clone(),
            config.project_id.clone(),
            tokens,
        ))
    }

    fn send_url(&self) -> String {
        format!("{}/v1/projects/{}/messages:send", self.endpoint, self.project_id)
    }
}

#[async_trait]
impl PushSender for FcmPushSender {
    async fn send(&self, payload: &NotificationPayload) -> Result<String, PushError> {
        let access_token = self.tokens.access_token().await?;
        let request = FcmSendRequest::from(payload);

        debug!("Posting FCM message to {}", self.send_url());

        let response = self
            .client
            .post(self.send_url())
            .bearer_auth(access_token)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("Failed to send push notification: {}", e);
                PushError::Network(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("FCM returned error status {}: {}", status, error_text);
            return Err(classify_error(status, &error_text));
        }

        let sent: FcmSendResponse = response.json().await.map_err(|e| {
            error!("Failed to parse FCM response: {}", e);
            PushError::InvalidResponse(e.to_string())
        })?;

        Ok(sent.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fcm_auth::StaticTokenProvider;
    use mockito::Matcher;
    use serde_json::json;

    const SEND_PATH: &str = "/v1/projects/test-project/messages:send";

    fn sender_for(server: &mockito::ServerGuard) -> FcmPushSender {
        FcmPushSender::with_endpoint(
            Client::new(),
            server.url(),
            "test-project".to_string(),
            Arc::new(StaticTokenProvider::new("test-access-token")),
        )
    }

    #[test]
    fn test_meetup_request_notification_contents() {
        let payload = meetup_request_notification("T1", "Ana", "m1");

        assert_eq!(payload.title, "You have a new date request! ✨");
        assert_eq!(
            payload.body,
            "Ana has invited you for a meetup. Open the app to respond."
        );
        assert_eq!(payload.sound, "default");
        assert_eq!(payload.token, "T1");
        assert_eq!(payload.data.kind, "meetup_request");
        assert_eq!(payload.data.meetup_id, "m1");
    }

    #[test]
    fn test_fcm_request_shape() {
        let payload = meetup_request_notification("T1", "Ana", "m1");
        let json = serde_json::to_value(FcmSendRequest::from(&payload)).unwrap();

        assert_eq!(
            json,
            json!({
                "message": {
                    "token": "T1",
                    "notification": {
                        "title": "You have a new date request! ✨",
                        "body": "Ana has invited you for a meetup. Open the app to respond."
                    },
                    "android": { "notification": { "sound": "default" } },
                    "apns": { "payload": { "aps": { "sound": "default" } } },
                    "data": { "type": "meetup_request", "meetupId": "m1" }
                }
            })
        );
    }

    #[test]
    fn test_classify_error_codes() {
        let unregistered = json!({
            "error": {
                "code": 404,
                "message": "Requested entity was not found.",
                "status": "NOT_FOUND",
                "details": [{
                    "@type": "type.googleapis.com/google.firebase.fcm.v1.FcmError",
                    "errorCode": "UNREGISTERED"
                }]
            }
        })
        .to_string();
        assert_eq!(
            classify_error(StatusCode::NOT_FOUND, &unregistered),
            PushError::InvalidToken("Requested entity was not found.".to_string())
        );

        let quota = json!({
            "error": { "code": 429, "message": "Quota exceeded", "status": "RESOURCE_EXHAUSTED" }
        })
        .to_string();
        assert!(matches!(
            classify_error(StatusCode::TOO_MANY_REQUESTS, &quota),
            PushError::QuotaExceeded(_)
        ));

        assert!(matches!(
            classify_error(StatusCode::UNAUTHORIZED, "not json"),
            PushError::Auth(message) if message == "not json"
        ));

        assert_eq!(
            classify_error(StatusCode::SERVICE_UNAVAILABLE, "try later"),
            PushError::Service {
                status: 503,
                message: "try later".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_send_posts_message_with_bearer_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", SEND_PATH)
            .match_header("authorization", "Bearer test-access-token")
            .match_body(Matcher::PartialJson(json!({
                "message": {
                    "token": "T1",
                    "data": { "type": "meetup_request", "meetupId": "m1" }
                }
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"name":"projects/test-project/messages/0:12345"}"#)
            .create_async()
            .await;

        let sender = sender_for(&server);
        let payload = meetup_request_notification("T1", "Ana", "m1");
        let message_id = sender.send(&payload).await.unwrap();

        assert_eq!(message_id, "projects/test-project/messages/0:12345");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_send_maps_unregistered_token() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", SEND_PATH)
            .with_status(404)
            .with_body(
                json!({
                    "error": {
                        "code": 404,
                        "message": "Requested entity was not found.",
                        "status": "NOT_FOUND",
                        "details": [{ "errorCode": "UNREGISTERED" }]
                    }
                })
                .to_string(),
            )
            .create_async()
            .await;

        let sender = sender_for(&server);
        let payload = meetup_request_notification("stale-token", "Ana", "m1");
        let result = sender.send(&payload).await;

        assert!(matches!(result, Err(PushError::InvalidToken(_))));
    }

    #[tokio::test]
    async fn test_send_rejects_unparseable_success_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", SEND_PATH)
            .with_status(200)
            .with_body("ok")
            .create_async()
            .await;

        let sender = sender_for(&server);
        let payload = meetup_request_notification("T1", "Ana", "m1");
        let result = sender.send(&payload).await;

        assert!(matches!(result, Err(PushError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn test_send_reports_network_failure() {
        // Nothing listens on the discard port
        let sender = FcmPushSender::with_endpoint(
            Client::new(),
            "http://127.0.0.1:9".to_string(),
            "test-project".to_string(),
            Arc::new(StaticTokenProvider::new("test-access-token")),
        );
        let payload = meetup_request_notification("T1", "Ana", "m1");
        let result = sender.send(&payload).await;

        assert!(matches!(result, Err(PushError::Network(_))));
    }
}
