//! Publishing error types

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while talking to the Play Developer API
#[derive(Debug, Error)]
pub enum PlayError {
    /// No service account key was configured
    #[error("Missing credentials: {0}")]
    MissingCredentials(String),

    /// Invalid credentials
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// API error from the publishing service
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    /// Upload of a single artifact failed
    #[error("Upload of {path} failed: {status} - {message}")]
    UploadFailed {
        path: PathBuf,
        status: u16,
        message: String,
    },

    /// File extension is not one of apk, aab or obb
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(PathBuf),

    /// Expansion file listed before any APK or bundle
    #[error("Expansion file {0} has no preceding apk or aab to attach to")]
    MissingVersionCode(PathBuf),

    /// Nothing to upload
    #[error("No files to upload")]
    NoArtifacts,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// JWT error
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

impl PlayError {
    /// Whether the error was detected locally before any request was sent
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            PlayError::MissingCredentials(_)
                | PlayError::InvalidCredentials(_)
                | PlayError::UnsupportedFileType(_)
                | PlayError::MissingVersionCode(_)
                | PlayError::NoArtifacts
        )
    }
}

/// Result type for publishing operations
pub type Result<T> = std::result::Result<T, PlayError>;
