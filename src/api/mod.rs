//! REST API module.
//!
//! Public directory reads plus the admin surface for locations, inventory,
//! users, notifications and statistics.

mod activity;
mod categories;
mod directory;
mod locations;
mod medicines;
mod notifications;
mod pharmacies;
mod portal;
mod search;
mod stats;
mod users;

pub use activity::*;
pub use categories::*;
pub use directory::*;
pub use locations::*;
pub use medicines::*;
pub use notifications::*;
pub use pharmacies::*;
pub use portal::*;
pub use search::*;
pub use stats::*;
pub use users::*;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::models::NewActivity;
use crate::AppState;

/// Success response envelope.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
    pub revision_id: i64,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T, revision_id: i64) -> Self {
        Self {
            success: true,
            data,
            revision_id,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Response type that can be either success or error.
pub type ApiResult<T> = Result<ApiResponse<T>, crate::errors::AppErrorWithRevision>;

/// Create a successful API response.
pub fn success<T: Serialize>(data: T, revision_id: i64) -> ApiResult<T> {
    Ok(ApiResponse::new(data, revision_id))
}

/// Create an error API response.
pub fn error<T: Serialize>(err: crate::errors::AppError, revision_id: i64) -> ApiResult<T> {
    Err(crate::errors::AppErrorWithRevision {
        error: err,
        revision_id,
    })
}

/// Append an audit entry. Failures are logged, never returned.
async fn record_activity(state: &AppState, activity: NewActivity) {
    if let Err(e) = state.repo.log_activity(&activity).await {
        tracing::warn!(
            action = %activity.action_type,
            entity = %activity.entity_type,
            "Failed to record activity: {}",
            e
        );
    }
}

/// Revision after a write, falling back to the one read before it.
async fn revision_after_write(state: &AppState, before: i64) -> i64 {
    state.repo.get_revision_id().await.unwrap_or(before)
}
