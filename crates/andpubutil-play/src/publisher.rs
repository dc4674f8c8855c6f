//! Upload orchestration
//!
//! One attempt opens an edit, uploads every artifact in order and commits.
//! [`publish`] wraps attempts in the [`ReviewPolicy`]: with `Fallback` a
//! failed attempt is repeated once, from a fresh connection, sending the
//! changes for review.

use chrono::Utc;
use tracing::{error, info, warn};

use crate::error::{PlayError, Result};
use crate::traits::PublisherApi;
use crate::types::*;

/// Run one full attempt against an already connected API
pub async fn run_attempt<A>(
    api: &A,
    request: &PublishRequest,
    flag: ReviewFlag,
) -> Result<PublishReport>
where
    A: PublisherApi + ?Sized,
{
    let package_name = request.package_name.as_str();
    info!("Package name: {}", package_name);

    let edit_id = api.insert_edit(package_name).await.map_err(|e| {
        error!("Edits.Insert failed: {}", e);
        e
    })?;
    info!("AppEdit ID: {}", edit_id);

    let mut uploads = Vec::with_capacity(request.artifacts.len());
    let mut current: Option<VersionCode> = None;

    for artifact in &request.artifacts {
        let path = artifact.path.as_path();
        let record = match artifact.kind {
            ArtifactKind::Apk | ArtifactKind::Bundle => {
                let upload = if artifact.kind == ArtifactKind::Apk {
                    api.upload_apk(package_name, &edit_id, path).await?
                } else {
                    api.upload_bundle(package_name, &edit_id, path).await?
                };
                current = Some(upload.version_code);
                UploadRecord {
                    path: artifact.path.clone(),
                    kind: artifact.kind,
                    version_code: upload.version_code,
                    status: upload.status,
                }
            }
            ArtifactKind::Obb => {
                let version_code = current.ok_or_else(|| {
                    PlayError::MissingVersionCode(artifact.path.clone())
                })?;
                let status = api
                    .upload_expansion_file(
                        package_name,
                        &edit_id,
                        version_code,
                        ExpansionFileType::Main,
                        path,
                    )
                    .await?;
                UploadRecord {
                    path: artifact.path.clone(),
                    kind: artifact.kind,
                    version_code,
                    status,
                }
            }
        };
        uploads.push(record);
    }

    let commit = api
        .commit_edit(package_name, &edit_id, flag.changes_not_sent_for_review())
        .await
        .map_err(|e| {
            error!("Commit failed: {}", e);
            e
        })?;
    info!("Commit result status code: {}", commit.status);

    Ok(PublishReport {
        package_name: request.package_name.clone(),
        edit_id,
        uploads,
        commit_status: commit.status,
        review_flag: flag,
        attempt: 1,
        committed_at: Utc::now(),
    })
}

/// Publish `request`, connecting afresh for every attempt
///
/// `connect` covers credential resolution and client setup, so a failure
/// there counts as a failed attempt like any other.
pub async fn publish<A, F>(
    request: &PublishRequest,
    policy: ReviewPolicy,
    mut connect: F,
) -> Result<PublishReport>
where
    A: PublisherApi,
    F: FnMut() -> Result<A>,
{
    let first = policy.first();
    let err = match attempt(&mut connect, request, first).await {
        Ok(report) => return Ok(report),
        Err(err) => err,
    };

    let Some(flag) = policy.fallback() else {
        return Err(err);
    };

    warn!(error = %err, "First attempt failed");
    info!("Retrying with review flag on (changesNotSentForReview=false)");

    let mut report = attempt(&mut connect, request, flag).await?;
    report.attempt = 2;
    Ok(report)
}

async fn attempt<A, F>(
    connect: &mut F,
    request: &PublishRequest,
    flag: ReviewFlag,
) -> Result<PublishReport>
where
    A: PublisherApi,
    F: FnMut() -> Result<A>,
{
    let api = connect()?;
    run_attempt(&api, request, flag).await
}
