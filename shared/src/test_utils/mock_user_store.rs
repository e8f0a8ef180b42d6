use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::models::UserProfile;
use crate::store::{StoreError, UserStore};

/// In-memory user store that records every lookup
#[derive(Default)]
pub struct MockUserStore {
    users: Mutex<HashMap<String, UserProfile>>,
    lookups: Mutex<Vec<String>>,
    fail_with: Mutex<Option<String>>,
}

impl MockUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(self, user_id: &str, profile: UserProfile) -> Self {
        self.insert_user(user_id, profile);
        self
    }

    pub fn insert_user(&self, user_id: &str, profile: UserProfile) {
        self.users
            .lock()
            .unwrap()
            .insert(user_id.to_string(), profile);
    }

    /// Makes every subsequent lookup fail with a DynamoDB error
    pub fn fail_lookups(&self, message: &str) {
        *self.fail_with.lock().unwrap() = Some(message.to_string());
    }

    /// User ids requested so far, in order
    pub fn lookups(&self) -> Vec<String> {
        self.lookups.lock().unwrap().clone()
    }
}

/// Builds a profile from optional token and name
pub fn profile(fcm_token: Option<&str>, full_name: Option<&str>) -> UserProfile {
    UserProfile {
        fcm_token: fcm_token.map(str::to_string),
        full_name: full_name.map(str::to_string),
    }
}

#[async_trait]
impl UserStore for MockUserStore {
    async fn get_user(&self, user_id: &str) -> Result<Option<UserProfile>, StoreError> {
        self.lookups.lock().unwrap().push(user_id.to_string());

        if let Some(message) = self.fail_with.lock().unwrap().clone() {
            return Err(StoreError::Dynamo(message));
        }

        Ok(self.users.lock().unwrap().get(user_id).cloned())
    }
}
