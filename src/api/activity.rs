//! Activity log endpoint.

use axum::extract::{Query, State};
use serde::Deserialize;

use super::{error, success, ApiResult};
use crate::models::ActivityLog;
use crate::AppState;

const DEFAULT_ACTIVITY_LIMIT: i64 = 50;
const MAX_ACTIVITY_LIMIT: i64 = 500;

#[derive(Debug, Deserialize)]
pub struct ActivityQuery {
    pub limit: Option<i64>,
}

/// GET /api/activity - Most recent audit entries, newest first.
pub async fn list_activity(
    State(state): State<AppState>,
    Query(params): Query<ActivityQuery>,
) -> ApiResult<Vec<ActivityLog>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    let limit = params
        .limit
        .unwrap_or(DEFAULT_ACTIVITY_LIMIT)
        .clamp(1, MAX_ACTIVITY_LIMIT);

    match state.repo.list_activity(limit).await {
        Ok(entries) => success(entries, revision_id),
        Err(e) => error(e, revision_id),
    }
}
