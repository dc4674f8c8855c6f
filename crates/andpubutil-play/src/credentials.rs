//! Service account credentials and OAuth2 token exchange

use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{PlayError, Result};

/// Environment variable naming the service account key file
pub const KEY_ENV_VAR: &str = "ANDPUBUTIL_ANDROID_PUBLISHER_KEY";

const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const SCOPE: &str = "https://www.googleapis.com/auth/androidpublisher";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Google service account key, as downloaded from the Cloud console
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub token_uri: Option<String>,
}

impl ServiceAccountKey {
    /// Load a key from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            PlayError::InvalidCredentials(format!(
                "Failed to read service account key {}: {}",
                path.display(),
                e
            ))
        })?;

        Self::from_json(&content)
    }

    /// Parse a key from its JSON contents
    pub fn from_json(content: &str) -> Result<Self> {
        let key: ServiceAccountKey = serde_json::from_str(content).map_err(|e| {
            PlayError::InvalidCredentials(format!("Invalid service account key: {}", e))
        })?;

        if key.client_email.is_empty() || key.private_key.is_empty() {
            return Err(PlayError::InvalidCredentials(
                "Service account key is missing client_email or private_key".to_string(),
            ));
        }

        Ok(key)
    }

    /// Token endpoint, falling back to Google's default
    pub fn token_uri(&self) -> &str {
        self.token_uri.as_deref().unwrap_or(TOKEN_URL)
    }
}

/// Ways to authenticate API calls
#[derive(Debug, Clone)]
pub enum Credentials {
    /// Exchange a signed JWT for access tokens
    ServiceAccount(ServiceAccountKey),
    /// Fixed bearer token, for exercising the HTTP client against a mock server
    #[cfg(test)]
    AccessToken(String),
}

/// OAuth token response
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Debug, Default)]
struct TokenCache {
    access_token: Option<String>,
    expires_at: Option<DateTime<Utc>>,
}

/// Hands out access tokens, refreshing them shortly before expiry
pub struct TokenProvider {
    client: Client,
    credentials: Credentials,
    cache: RwLock<TokenCache>,
}

impl TokenProvider {
    pub fn new(client: Client, credentials: Credentials) -> Self {
        Self {
            client,
            credentials,
            cache: RwLock::new(TokenCache::default()),
        }
    }

    /// Get or refresh the access token
    pub async fn access_token(&self) -> Result<String> {
        let key = match &self.credentials {
            #[cfg(test)]
            Credentials::AccessToken(token) => return Ok(token.clone()),
            Credentials::ServiceAccount(key) => key,
        };

        {
            let cache = self.cache.read().await;
            if let (Some(token), Some(expires)) = (&cache.access_token, cache.expires_at) {
                if Utc::now() < expires - Duration::minutes(5) {
                    return Ok(token.clone());
                }
            }
        }

        let now = Utc::now();
        let exp = now + Duration::hours(1);

        #[derive(Serialize)]
        struct Claims<'a> {
            iss: &'a str,
            scope: &'a str,
            aud: &'a str,
            iat: i64,
            exp: i64,
        }

        let claims = Claims {
            iss: &key.client_email,
            scope: SCOPE,
            aud: key.token_uri(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };

        let encoding_key = jsonwebtoken::EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| PlayError::InvalidCredentials(format!("Invalid private key: {}", e)))?;

        let jwt = jsonwebtoken::encode(
            &jsonwebtoken::Header::new(jsonwebtoken::Algorithm::RS256),
            &claims,
            &encoding_key,
        )?;

        debug!(client_email = %key.client_email, "Exchanging service account assertion");

        let response = self
            .client
            .post(key.token_uri())
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", jwt.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(PlayError::AuthenticationFailed(error_text));
        }

        let token_response: TokenResponse = response.json().await?;

        {
            let mut cache = self.cache.write().await;
            cache.access_token = Some(token_response.access_token.clone());
            cache.expires_at = Some(Utc::now() + Duration::seconds(token_response.expires_in));
        }

        Ok(token_response.access_token)
    }
}
