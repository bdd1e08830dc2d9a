//! Notification API endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use super::{error, revision_after_write, success, ApiResult};
use crate::errors::AppError;
use crate::models::{
    CreateNotificationRequest, DeleteNotificationsRequest, NotificationFeed, RawNotification,
};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ConfirmQuery {
    #[serde(default)]
    pub confirm: bool,
}

/// GET /api/notifications - Re-fetch and return the notification list.
pub async fn list_notifications(State(state): State<AppState>) -> ApiResult<NotificationFeed> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.notifications.fetch_all().await {
        Ok(feed) => success(feed, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/notifications - Create a notification.
pub async fn create_notification(
    State(state): State<AppState>,
    Json(request): Json<CreateNotificationRequest>,
) -> ApiResult<RawNotification> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    if request.title.trim().is_empty() {
        return error(
            AppError::Validation("Title is required".to_string()),
            revision_id,
        );
    }
    if request.message.trim().is_empty() {
        return error(
            AppError::Validation("Message is required".to_string()),
            revision_id,
        );
    }

    match state.notifications.create(&request).await {
        Ok(created) => success(created, revision_after_write(&state, revision_id).await),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/notifications/:id/read - Mark one notification read.
pub async fn mark_notification_read(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<NotificationFeed> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.notifications.mark_read(&id).await {
        Ok(feed) => success(feed, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/notifications/read-all - Mark every listed notification read.
pub async fn mark_all_notifications_read(
    State(state): State<AppState>,
) -> ApiResult<NotificationFeed> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.notifications.mark_all_read().await {
        Ok(feed) => success(feed, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/notifications/delete - Delete the selected notifications.
pub async fn delete_selected_notifications(
    State(state): State<AppState>,
    Json(request): Json<DeleteNotificationsRequest>,
) -> ApiResult<NotificationFeed> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state
        .notifications
        .delete_selected(&request.ids, request.confirm)
        .await
    {
        Ok(feed) => success(feed, revision_after_write(&state, revision_id).await),
        Err(e) => error(e, revision_id),
    }
}

/// DELETE /api/notifications?confirm=true - Delete every notification.
pub async fn delete_all_notifications(
    State(state): State<AppState>,
    Query(params): Query<ConfirmQuery>,
) -> ApiResult<NotificationFeed> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.notifications.delete_all(params.confirm).await {
        Ok(feed) => success(feed, revision_after_write(&state, revision_id).await),
        Err(e) => error(e, revision_id),
    }
}
