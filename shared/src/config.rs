use log::info;
use std::env;
use std::fs;
use thiserror::Error;

use crate::fcm_auth::ServiceAccountKey;
use crate::push::DEFAULT_FCM_ENDPOINT;

const DEFAULT_USERS_TABLE: &str = "users";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("No FCM credentials configured. Set FCM_ACCESS_TOKEN or GOOGLE_APPLICATION_CREDENTIALS")]
    MissingCredentials,

    #[error("Failed to load service account key from {path}: {message}")]
    CredentialsFile { path: String, message: String },
}

/// How the notifier authenticates against FCM
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FcmCredentials {
    AccessToken(String),
    ServiceAccount(ServiceAccountKey),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FcmConfig {
    pub project_id: String,
    pub endpoint: String,
    pub credentials: FcmCredentials,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifierConfig {
    pub users_table: String,
    pub dynamodb_endpoint: Option<String>,
    pub fcm: FcmConfig,
}

impl NotifierConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    /// Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let users_table = var("USERS_TABLE").unwrap_or_else(|| DEFAULT_USERS_TABLE.to_string());
        let dynamodb_endpoint = var("DYNAMODB_ENDPOINT");
        let endpoint = var("FCM_ENDPOINT").unwrap_or_else(|| DEFAULT_FCM_ENDPOINT.to_string());

        let credentials = match (var("FCM_ACCESS_TOKEN"), var("GOOGLE_APPLICATION_CREDENTIALS")) {
            (Some(token), _) => FcmCredentials::AccessToken(token),
            (None, Some(path)) => FcmCredentials::ServiceAccount(load_service_account(&path)?),
            (None, None) => return Err(ConfigError::MissingCredentials),
        };

        let project_id = match (var("FCM_PROJECT_ID"), &credentials) {
            (Some(project_id), _) => project_id,
            (None, FcmCredentials::ServiceAccount(key)) => key
                .project_id
                .clone()
                .ok_or(ConfigError::MissingVar("FCM_PROJECT_ID"))?,
            (None, FcmCredentials::AccessToken(_)) => {
                return Err(ConfigError::MissingVar("FCM_PROJECT_ID"))
            }
        };

        info!(
            "Loaded configuration: users_table={}, fcm_project={}",
            users_table, project_id
        );

        Ok(Self {
            users_table,
            dynamodb_endpoint,
            fcm: FcmConfig {
                project_id,
                endpoint,
                credentials,
            },
        })
    }
}

fn load_service_account(path: &str) -> Result<ServiceAccountKey, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|e| ConfigError::CredentialsFile {
        path: path.to_string(),
        message: e.to_string(),
    })?;

    ServiceAccountKey::from_json(&contents).map_err(|e| ConfigError::CredentialsFile {
        path: path.to_string(),
        message: e.to_string(),
    })
}
