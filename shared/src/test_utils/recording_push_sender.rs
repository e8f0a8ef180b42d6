use async_trait::async_trait;
use std::sync::Mutex;

use crate::models::NotificationPayload;
use crate::push::{PushError, PushSender};

/// Push sender that keeps every payload instead of delivering it
#[derive(Default)]
pub struct RecordingPushSender {
    attempts: Mutex<Vec<NotificationPayload>>,
    fail_with: Mutex<Option<PushError>>,
}

impl RecordingPushSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sender whose every send fails with `error`
    pub fn failing(error: PushError) -> Self {
        let sender = Self::default();
        *sender.fail_with.lock().unwrap() = Some(error);
        sender
    }

    /// Every payload handed to `send`, including failed ones
    pub fn attempts(&self) -> Vec<NotificationPayload> {
        self.attempts.lock().unwrap().clone()
    }

    /// Payloads that were accepted
    pub fn sent(&self) -> Vec<NotificationPayload> {
        if self.fail_with.lock().unwrap().is_some() {
            return Vec::new();
        }
        self.attempts()
    }
}

#[async_trait]
impl PushSender for RecordingPushSender {
    async fn send(&self, payload: &NotificationPayload) -> Result<String, PushError> {
        let message_number = {
            let mut attempts = self.attempts.lock().unwrap();
            attempts.push(payload.clone());
            attempts.len()
        };

        if let Some(error) = self.fail_with.lock().unwrap().clone() {
            return Err(error);
        }

        Ok(format!("projects/test-project/messages/{}", message_number))
    }
}
