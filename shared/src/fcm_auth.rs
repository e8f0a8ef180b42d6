//! OAuth2 access tokens for the FCM HTTP v1 API.
//!
//! FCM accepts a short-lived bearer token. It is either handed to us by the
//! hosting platform ([`StaticTokenProvider`]) or minted from a Google service
//! account key by signing a JWT assertion and exchanging it at the account's
//! token URI ([`ServiceAccountTokenProvider`]).

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use log::{debug, error, info};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::config::FcmCredentials;
use crate::push::PushError;

pub const FCM_SCOPE: &str = "https://www.googleapis.com/auth/firebase.messaging";
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
/// Refresh this long before the provider-reported expiry
const EXPIRY_MARGIN_SECS: i64 = 60;

#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn access_token(&self) -> Result<String, PushError>;
}

/// Returns the same pre-issued token on every call
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn access_token(&self) -> Result<String, PushError> {
        Ok(self.token.clone())
    }
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// The fields of a Google service account JSON key that we use
#[derive(Deserialize, Clone, PartialEq, Eq)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default)]
    pub project_id: Option<String>,
}

impl ServiceAccountKey {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key", &"<redacted>")
            .field("token_uri", &self.token_uri)
            .field("project_id", &self.project_id)
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    ASSERTION_LIFETIME_SECS
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(EXPIRY_MARGIN_SECS) < self.expires_at
    }
}

/// Mints and caches access tokens from a service account key
pub struct ServiceAccountTokenProvider {
    client: Client,
    key: ServiceAccountKey,
    encoding_key: EncodingKey,
    cached: Mutex<Option<CachedToken>>,
}

impl ServiceAccountTokenProvider {
    pub fn new(client: Client, key: ServiceAccountKey) -> Result<Self, PushError> {
        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes()).map_err(|e| {
            PushError::Auth(format!("Invalid private key for {}: {}", key.client_email, e))
        })?;

        Ok(Self {
            client,
            key,
            encoding_key,
            cached: Mutex::new(None),
        })
    }

    fn assertion(&self, now: DateTime<Utc>) -> Result<String, PushError> {
        let iat = now.timestamp();
        let claims = AssertionClaims {
            iss: &self.key.client_email,
            scope: FCM_SCOPE,
            aud: &self.key.token_uri,
            iat,
            exp: iat + ASSERTION_LIFETIME_SECS,
        };

        encode(&Header::new(Algorithm::RS256), &claims, &self.encoding_key)
            .map_err(|e| PushError::Auth(format!("Failed to sign token assertion: {}", e)))
    }

    async fn fetch_token(&self, now: DateTime<Utc>) -> Result<CachedToken, PushError> {
        let assertion = self.assertion(now)?;

        debug!(
            "Exchanging service account assertion for {} at {}",
            self.key.client_email, self.key.token_uri
        );

        let response = self
            .client
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| {
                error!("Failed to reach token endpoint: {}", e);
                PushError::Network(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Token endpoint returned error status {}: {}", status, error_text);
            return Err(PushError::Auth(format!(
                "Token exchange failed: {} - {}",
                status, error_text
            )));
        }

        let token: TokenResponse = response.json().await.map_err(|e| {
            PushError::Auth(format!("Failed to parse token response: {}", e))
        })?;

        // Google issues tokens for at most an hour; anything outside that is not trusted
        let expires_in = token.expires_in.clamp(0, ASSERTION_LIFETIME_SECS);

        info!(
            "Obtained FCM access token for {}, valid for {}s",
            self.key.client_email, expires_in
        );

        Ok(CachedToken {
            value: token.access_token,
            expires_at: now + Duration::seconds(expires_in),
        })
    }
}

#[async_trait]
impl TokenProvider for ServiceAccountTokenProvider {
    async fn access_token(&self) -> Result<String, PushError> {
        let mut cached = self.cached.lock().await;
        let now = Utc::now();

        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh(now)) {
            return Ok(token.value.clone());
        }

        let token = self.fetch_token(now).await?;
        let value = token.value.clone();
        *cached = Some(token);
        Ok(value)
    }
}

/// Picks the token source matching the configured credentials
pub fn token_provider_from_credentials(
    client: Client,
    credentials: &FcmCredentials,
) -> Result<Arc<dyn TokenProvider>, PushError> {
    match credentials {
        FcmCredentials::AccessToken(token) => {
            Ok(Arc::new(StaticTokenProvider::new(token.clone())))
        }
        FcmCredentials::ServiceAccount(key) => {
            Ok(Arc::new(ServiceAccountTokenProvider::new(client, key.clone())?))
        }
    }
}
