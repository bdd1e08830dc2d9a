//! Directory API endpoints.

use axum::extract::State;

use super::{success, ApiResult};
use crate::models::{Directory, DirectoryBucket, RevisionInfo};
use crate::AppState;

/// GET /api/directory - Every location bucket as held by the location store.
pub async fn get_directory(State(state): State<AppState>) -> ApiResult<Directory> {
    let revision_info =
        state
            .repo
            .get_revision_info()
            .await
            .map_err(|e| crate::errors::AppErrorWithRevision {
                error: e,
                revision_id: 0,
            })?;

    let snapshot = state.locations.snapshot().await;
    let buckets = snapshot
        .iter()
        .map(|(bucket, locations)| DirectoryBucket {
            bucket,
            label: bucket.label(),
            locations: locations.to_vec(),
        })
        .collect();

    success(
        Directory {
            revision_id: revision_info.revision_id,
            generated_at: revision_info.generated_at,
            buckets,
        },
        revision_info.revision_id,
    )
}

/// GET /api/directory/revision - Get the current revision info.
pub async fn get_revision(State(state): State<AppState>) -> ApiResult<RevisionInfo> {
    let revision_info =
        state
            .repo
            .get_revision_info()
            .await
            .map_err(|e| crate::errors::AppErrorWithRevision {
                error: e,
                revision_id: 0,
            })?;

    success(revision_info.clone(), revision_info.revision_id)
}
