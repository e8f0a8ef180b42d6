use async_trait::async_trait;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;
use log::{debug, error, info};
use std::collections::HashMap;

use super::{StoreError, UserStore};
use crate::models::UserProfile;

const USER_KEY_ATTRIBUTE: &str = "id";

/// User profiles stored in a DynamoDB table keyed by `id`
#[derive(Clone)]
pub struct DynamoUserStore {
    client: Client,
    table_name: String,
}

impl DynamoUserStore {
    /// Creates a store using the default AWS configuration chain.
    /// `endpoint` overrides the DynamoDB endpoint, e.g. for DynamoDB Local.
    pub async fn new(table_name: &str, endpoint: Option<&str>) -> Self {
        let sdk_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;

        let client = match endpoint {
            Some(url) => {
                info!("Using DynamoDB endpoint override: {}", url);
                let config = aws_sdk_dynamodb::config::Builder::from(&sdk_config)
                    .endpoint_url(url)
                    .build();
                Client::from_conf(config)
            }
            None => Client::new(&sdk_config),
        };

        Self::with_client_and_table(client, table_name.to_string())
    }

    pub fn with_client_and_table(client: Client, table_name: String) -> Self {
        info!("Created DynamoUserStore for table '{}'", table_name);
        Self { client, table_name }
    }
}

fn decode_user(item: HashMap<String, AttributeValue>) -> Result<UserProfile, StoreError> {
    serde_dynamo::from_item(item).map_err(|e| StoreError::Decode(e.to_string()))
}

#[async_trait]
impl UserStore for DynamoUserStore {
    async fn get_user(&self, user_id: &str) -> Result<Option<UserProfile>, StoreError> {
        debug!("Fetching user {} from table '{}'", user_id, self.table_name);

        let output = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key(USER_KEY_ATTRIBUTE, AttributeValue::S(user_id.to_string()))
            .send()
            .await
            .map_err(|e| {
                error!("Failed to get user {}: {}", user_id, DisplayErrorContext(&e));
                StoreError::Dynamo(DisplayErrorContext(&e).to_string())
            })?;

        output.item.map(decode_user).transpose()
    }
}
