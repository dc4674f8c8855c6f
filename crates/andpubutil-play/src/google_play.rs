//! Google Play Developer API client
//!
//! Implements [`PublisherApi`] on top of the `androidpublisher/v3` REST
//! endpoints.
//!
//! ## Authentication
//!
//! Uses a Google Cloud service account with Google Play Developer API access.
//! The key file path usually comes from `ANDPUBUTIL_ANDROID_PUBLISHER_KEY`.
//!
//! ## Usage
//!
//! ```ignore
//! use andpubutil_play::{GooglePlayClient, PublisherApi};
//!
//! let client = GooglePlayClient::from_key_file(&key_path)?;
//! let edit_id = client.insert_edit("com.example.app").await?;
//! ```

use std::path::Path;

use reqwest::header::{AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{Body, Client, Method, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info};

use crate::credentials::{Credentials, ServiceAccountKey, TokenProvider};
use crate::error::{PlayError, Result};
use crate::traits::PublisherApi;
use crate::types::*;

const API_BASE_URL: &str = "https://androidpublisher.googleapis.com/androidpublisher/v3";
const UPLOAD_BASE_URL: &str =
    "https://androidpublisher.googleapis.com/upload/androidpublisher/v3";

#[derive(Deserialize)]
struct AppEdit {
    id: String,
}

/// Shared shape of the `apks` and `bundles` upload responses
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BinaryResponse {
    version_code: i64,
}

/// Google Play Developer API client
pub struct GooglePlayClient {
    client: Client,
    tokens: TokenProvider,
    api_base: String,
    upload_base: String,
}

impl GooglePlayClient {
    /// Create a client from already resolved credentials
    pub fn new(credentials: Credentials) -> Self {
        let client = Client::new();
        Self {
            tokens: TokenProvider::new(client.clone(), credentials),
            client,
            api_base: API_BASE_URL.to_string(),
            upload_base: UPLOAD_BASE_URL.to_string(),
        }
    }

    /// Create a client from a service account key file
    pub fn from_key_file(path: &Path) -> Result<Self> {
        let key = ServiceAccountKey::from_file(path)?;
        debug!(client_email = %key.client_email, "Loaded service account key");
        Ok(Self::new(Credentials::ServiceAccount(key)))
    }

    /// Point the client at different API and upload roots
    pub fn with_base_urls(
        mut self,
        api_base: impl Into<String>,
        upload_base: impl Into<String>,
    ) -> Self {
        let api_base: String = api_base.into();
        let upload_base: String = upload_base.into();
        self.api_base = api_base.trim_end_matches('/').to_string();
        self.upload_base = upload_base.trim_end_matches('/').to_string();
        self
    }

    fn edit_path(package_name: &str, edit_id: &EditId) -> String {
        format!("/applications/{}/edits/{}", package_name, edit_id)
    }

    /// Make an authenticated JSON API request
    async fn api_request<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<(T, u16)> {
        let token = self.tokens.access_token().await?;
        let url = format!("{}{}", self.api_base, endpoint);

        debug!("Making {} request to {}", method, url);

        let response = self
            .client
            .request(method, &url)
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .header(CONTENT_TYPE, "application/json")
            .query(query)
            .body("{}")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(PlayError::ApiError {
                status: status.as_u16(),
                message: error_text,
            });
        }

        let result = response.json().await?;
        Ok((result, status.as_u16()))
    }

    /// Stream a file to an upload endpoint
    async fn upload_file(&self, endpoint: &str, path: &Path) -> Result<Response> {
        let token = self.tokens.access_token().await?;
        let url = format!("{}{}", self.upload_base, endpoint);

        let file = tokio::fs::File::open(path).await?;
        let len = file.metadata().await?.len();

        info!("Uploading {}...", path.display());
        debug!(bytes = len, "POST {}", url);

        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .header(CONTENT_TYPE, "application/octet-stream")
            .header(CONTENT_LENGTH, len)
            .query(&[("uploadType", "media")])
            .body(Body::from(file))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(PlayError::UploadFailed {
                path: path.to_path_buf(),
                status: status.as_u16(),
                message: error_text,
            });
        }

        info!("Upload result status code: {}", status.as_u16());
        Ok(response)
    }

    async fn upload_binary(&self, endpoint: &str, path: &Path) -> Result<BinaryUpload> {
        let response = self.upload_file(endpoint, path).await?;
        let status = response.status().as_u16();
        let body: BinaryResponse = response.json().await?;

        info!("Uploaded version code: {}", body.version_code);

        Ok(BinaryUpload {
            version_code: VersionCode(body.version_code),
            status,
        })
    }
}

#[async_trait::async_trait]
impl PublisherApi for GooglePlayClient {
    async fn insert_edit(&self, package_name: &str) -> Result<EditId> {
        let endpoint = format!("/applications/{}/edits", package_name);
        let (edit, _): (AppEdit, _) = self.api_request(Method::POST, &endpoint, &[]).await?;
        Ok(EditId(edit.id))
    }

    async fn upload_apk(
        &self,
        package_name: &str,
        edit_id: &EditId,
        path: &Path,
    ) -> Result<BinaryUpload> {
        let endpoint = format!("{}/apks", Self::edit_path(package_name, edit_id));
        self.upload_binary(&endpoint, path).await
    }

    async fn upload_bundle(
        &self,
        package_name: &str,
        edit_id: &EditId,
        path: &Path,
    ) -> Result<BinaryUpload> {
        let endpoint = format!("{}/bundles", Self::edit_path(package_name, edit_id));
        self.upload_binary(&endpoint, path).await
    }

    async fn upload_expansion_file(
        &self,
        package_name: &str,
        edit_id: &EditId,
        version_code: VersionCode,
        file_type: ExpansionFileType,
        path: &Path,
    ) -> Result<u16> {
        let endpoint = format!(
            "{}/apks/{}/expansionFiles/{}",
            Self::edit_path(package_name, edit_id),
            version_code,
            file_type.as_str()
        );
        let response = self.upload_file(&endpoint, path).await?;
        Ok(response.status().as_u16())
    }

    async fn commit_edit(
        &self,
        package_name: &str,
        edit_id: &EditId,
        changes_not_sent_for_review: Option<bool>,
    ) -> Result<CommitResult> {
        let endpoint = format!("{}:commit", Self::edit_path(package_name, edit_id));

        let mut query = Vec::new();
        if let Some(flag) = changes_not_sent_for_review {
            query.push(("changesNotSentForReview", flag.to_string()));
        }

        let (edit, status): (AppEdit, _) =
            self.api_request(Method::POST, &endpoint, &query).await?;

        Ok(CommitResult {
            edit_id: EditId(edit.id),
            status,
        })
    }
}
