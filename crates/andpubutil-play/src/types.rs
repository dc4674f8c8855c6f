//! Common types for edits and uploads

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{PlayError, Result};

/// Kind of artifact, derived from the file name suffix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// Android package (`.apk`)
    Apk,
    /// Android App Bundle (`.aab`)
    Bundle,
    /// APK expansion file (`.obb`)
    Obb,
}

impl ArtifactKind {
    /// Classify a path by its extension, ignoring ASCII case
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "apk" => Some(ArtifactKind::Apk),
            "aab" => Some(ArtifactKind::Bundle),
            "obb" => Some(ArtifactKind::Obb),
            _ => None,
        }
    }

    /// Which upload operation this kind goes through
    pub fn target(self) -> UploadTarget {
        match self {
            ArtifactKind::Apk | ArtifactKind::Bundle => UploadTarget::BinaryPackage,
            ArtifactKind::Obb => UploadTarget::ExpansionFile,
        }
    }
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArtifactKind::Apk => write!(f, "apk"),
            ArtifactKind::Bundle => write!(f, "aab"),
            ArtifactKind::Obb => write!(f, "obb"),
        }
    }
}

/// Upload target on the publishing side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadTarget {
    /// Installable package; produces a version code
    BinaryPackage,
    /// Expansion file attached to a version code
    ExpansionFile,
}

/// Identifier of an open edit transaction
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EditId(pub String);

impl EditId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EditId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Version code assigned to an uploaded APK or bundle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionCode(pub i64);

impl std::fmt::Display for VersionCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Expansion file slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpansionFileType {
    Main,
}

impl ExpansionFileType {
    /// Path segment used by the API
    pub fn as_str(self) -> &'static str {
        match self {
            ExpansionFileType::Main => "main",
        }
    }
}

/// A file queued for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub path: PathBuf,
    pub kind: ArtifactKind,
}

impl Artifact {
    /// Classify `path`, rejecting anything that is not apk, aab or obb
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        match ArtifactKind::from_path(&path) {
            Some(kind) => Ok(Self { path, kind }),
            None => Err(PlayError::UnsupportedFileType(path)),
        }
    }
}

/// Everything one run needs to know about what to publish
#[derive(Debug, Clone)]
pub struct PublishRequest {
    /// Package name (e.g., "com.example.app")
    pub package_name: String,

    /// Artifacts in command line order
    pub artifacts: Vec<Artifact>,
}

impl PublishRequest {
    /// Build a request, classifying every path up front.
    ///
    /// Fails on an unsupported suffix, on an empty file list, and on an
    /// expansion file that appears before any apk or aab.
    pub fn new<I, P>(package_name: impl Into<String>, paths: I) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let artifacts = paths
            .into_iter()
            .map(Artifact::new)
            .collect::<Result<Vec<_>>>()?;

        if artifacts.is_empty() {
            return Err(PlayError::NoArtifacts);
        }

        let mut seen_binary = false;
        for artifact in &artifacts {
            match artifact.kind.target() {
                UploadTarget::BinaryPackage => seen_binary = true,
                UploadTarget::ExpansionFile if !seen_binary => {
                    return Err(PlayError::MissingVersionCode(artifact.path.clone()));
                }
                UploadTarget::ExpansionFile => {}
            }
        }

        Ok(Self {
            package_name: package_name.into(),
            artifacts,
        })
    }
}

/// How the commit treats the store's review workflow
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReviewPolicy {
    /// Commit with changes not sent for review, retry once sending them
    #[default]
    Fallback,
    /// Single attempt, leaving the flag to the service default
    Single,
}

impl ReviewPolicy {
    /// Flag used by the first attempt
    pub fn first(self) -> ReviewFlag {
        match self {
            ReviewPolicy::Fallback => ReviewFlag::NotSentForReview,
            ReviewPolicy::Single => ReviewFlag::ServiceDefault,
        }
    }

    /// Flag for the retry after a failed first attempt, if any
    pub fn fallback(self) -> Option<ReviewFlag> {
        match self {
            ReviewPolicy::Fallback => Some(ReviewFlag::SentForReview),
            ReviewPolicy::Single => None,
        }
    }
}

/// Review setting sent with a commit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewFlag {
    /// `changesNotSentForReview=true`
    NotSentForReview,
    /// `changesNotSentForReview=false`
    SentForReview,
    /// Parameter omitted
    ServiceDefault,
}

impl ReviewFlag {
    /// Value of the `changesNotSentForReview` query parameter
    pub fn changes_not_sent_for_review(self) -> Option<bool> {
        match self {
            ReviewFlag::NotSentForReview => Some(true),
            ReviewFlag::SentForReview => Some(false),
            ReviewFlag::ServiceDefault => None,
        }
    }
}

/// Response to an APK or bundle upload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinaryUpload {
    /// Version code assigned by the service
    pub version_code: VersionCode,

    /// HTTP status of the upload response
    pub status: u16,
}

/// Result of uploading one artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadRecord {
    /// Local path
    pub path: PathBuf,

    /// Artifact kind
    pub kind: ArtifactKind,

    /// Version code returned for binaries, or the one an expansion file
    /// was attached to
    pub version_code: VersionCode,

    /// HTTP status of the upload response
    pub status: u16,
}

/// Result of committing an edit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitResult {
    /// Edit that was committed
    pub edit_id: EditId,

    /// HTTP status of the commit response
    pub status: u16,
}

/// Outcome of a successful publish
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishReport {
    /// Package name
    pub package_name: String,

    /// Committed edit
    pub edit_id: EditId,

    /// Uploads in the order they were issued
    pub uploads: Vec<UploadRecord>,

    /// HTTP status of the commit
    pub commit_status: u16,

    /// Review flag sent with the successful commit
    pub review_flag: ReviewFlag,

    /// Attempt that succeeded, starting at 1
    pub attempt: usize,

    /// Commit timestamp
    pub committed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_kind_from_path() {
        assert_eq!(ArtifactKind::from_path(Path::new("app.apk")), Some(ArtifactKind::Apk));
        assert_eq!(ArtifactKind::from_path(Path::new("out/app.AAB")), Some(ArtifactKind::Bundle));
        assert_eq!(ArtifactKind::from_path(Path::new("main.1.com.example.obb")), Some(ArtifactKind::Obb));
        assert_eq!(ArtifactKind::from_path(Path::new("notes.txt")), None);
        assert_eq!(ArtifactKind::from_path(Path::new("apk")), None);
    }

    #[test]
    fn test_upload_target() {
        assert_eq!(ArtifactKind::Apk.target(), UploadTarget::BinaryPackage);
        assert_eq!(ArtifactKind::Bundle.target(), UploadTarget::BinaryPackage);
        assert_eq!(ArtifactKind::Obb.target(), UploadTarget::ExpansionFile);
    }

    #[test]
    fn test_publish_request_keeps_order() {
        let request =
            PublishRequest::new("com.example.app", ["a.apk", "main.obb", "b.aab"]).unwrap();
        let kinds: Vec<_> = request.artifacts.iter().map(|a| a.kind).collect();
        assert_eq!(kinds, vec![ArtifactKind::Apk, ArtifactKind::Obb, ArtifactKind::Bundle]);
        assert_eq!(request.package_name, "com.example.app");
    }

    #[test]
    fn test_publish_request_rejects_unsupported() {
        let err = PublishRequest::new("com.example.app", ["a.apk", "readme.md"]).unwrap_err();
        assert!(matches!(err, PlayError::UnsupportedFileType(p) if p == Path::new("readme.md")));
    }

    #[test]
    fn test_publish_request_rejects_leading_obb() {
        let err = PublishRequest::new("com.example.app", ["main.obb", "a.apk"]).unwrap_err();
        assert!(matches!(err, PlayError::MissingVersionCode(_)));
    }

    #[test]
    fn test_publish_request_rejects_empty() {
        let err = PublishRequest::new("com.example.app", Vec::<PathBuf>::new()).unwrap_err();
        assert!(matches!(err, PlayError::NoArtifacts));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_review_policy_flags() {
        assert_eq!(ReviewPolicy::default(), ReviewPolicy::Fallback);
        assert_eq!(ReviewPolicy::Fallback.first().changes_not_sent_for_review(), Some(true));
        assert_eq!(
            ReviewPolicy::Fallback.fallback().map(ReviewFlag::changes_not_sent_for_review),
            Some(Some(false))
        );
        assert_eq!(ReviewPolicy::Single.first().changes_not_sent_for_review(), None);
        assert_eq!(ReviewPolicy::Single.fallback(), None);
    }
}
