use async_trait::async_trait;
use thiserror::Error;

use crate::models::UserProfile;

pub mod dynamo;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("DynamoDB request failed: {0}")]
    Dynamo(String),

    #[error("Failed to decode stored item: {0}")]
    Decode(String),
}

/// Read-only access to user profiles, keyed by user id
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Returns `Ok(None)` when no profile exists for `user_id`
    async fn get_user(&self, user_id: &str) -> Result<Option<UserProfile>, StoreError>;
}
