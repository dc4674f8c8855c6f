//! Publishing API trait

use std::path::Path;

use crate::error::Result;
use crate::types::*;

/// Operations of the Play Developer API used by a publish run
///
/// `GooglePlayClient` talks to the real service; tests substitute a
/// recording implementation.
#[async_trait::async_trait]
pub trait PublisherApi: Send + Sync {
    /// Open a new edit for `package_name`
    async fn insert_edit(&self, package_name: &str) -> Result<EditId>;

    /// Upload an APK into the edit
    async fn upload_apk(&self, package_name: &str, edit_id: &EditId, path: &Path)
        -> Result<BinaryUpload>;

    /// Upload an Android App Bundle into the edit
    async fn upload_bundle(
        &self,
        package_name: &str,
        edit_id: &EditId,
        path: &Path,
    ) -> Result<BinaryUpload>;

    /// Upload an expansion file attached to `version_code`
    ///
    /// Returns the HTTP status of the upload response.
    async fn upload_expansion_file(
        &self,
        package_name: &str,
        edit_id: &EditId,
        version_code: VersionCode,
        file_type: ExpansionFileType,
        path: &Path,
    ) -> Result<u16>;

    /// Commit the edit
    ///
    /// `changes_not_sent_for_review` is omitted from the request when `None`.
    async fn commit_edit(
        &self,
        package_name: &str,
        edit_id: &EditId,
        changes_not_sent_for_review: Option<bool>,
    ) -> Result<CommitResult>;
}
