//! Google Play upload support for andpubutil
//!
//! This crate opens an edit on the Google Play Developer API, uploads APKs,
//! App Bundles and OBB expansion files into it, and commits the edit.
//!
//! ## Usage
//!
//! ```ignore
//! use andpubutil_play::{publish, GooglePlayClient, PublishRequest, ReviewPolicy};
//!
//! let request = PublishRequest::new("com.example.app", ["app.aab", "main.obb"])?;
//! let report = publish(&request, ReviewPolicy::Fallback, || {
//!     GooglePlayClient::from_key_file(&key_path)
//! })
//! .await?;
//! ```

pub mod credentials;
pub mod error;
pub mod google_play;
pub mod publisher;
pub mod traits;
pub mod types;

pub use credentials::{Credentials, ServiceAccountKey, KEY_ENV_VAR};
pub use error::PlayError;
pub use google_play::GooglePlayClient;
pub use publisher::{publish, run_attempt};
pub use traits::PublisherApi;
pub use types::*;
