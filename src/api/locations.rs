//! Location admin endpoints.
//!
//! Every write re-reads the affected buckets into the location store so the
//! public directory reflects it immediately.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::json;

use super::{error, record_activity, revision_after_write, success, ApiResult};
use crate::errors::AppError;
use crate::models::{CategoryBucket, Location, LocationPayload, NewActivity, SaveLocationRequest};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LocationListQuery {
    pub category: Option<String>,
}

/// GET /api/locations - List locations, optionally for one category.
pub async fn list_locations(
    State(state): State<AppState>,
    Query(params): Query<LocationListQuery>,
) -> ApiResult<Vec<Location>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    let category = match params.category.as_deref().map(parse_bucket).transpose() {
        Ok(category) => category,
        Err(e) => return error(e, revision_id),
    };

    match state.repo.list_locations(category).await {
        Ok(locations) => success(locations, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/locations/:id - Get a single location.
pub async fn get_location(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Location> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.get_location(&id).await {
        Ok(Some(location)) => success(location, revision_id),
        Ok(None) => error(
            AppError::NotFound(format!("Location {} not found", id)),
            revision_id,
        ),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/locations - Create a location.
pub async fn create_location(
    State(state): State<AppState>,
    Json(payload): Json<LocationPayload>,
) -> ApiResult<Location> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    let request = match validate(payload) {
        Ok(request) => request,
        Err(e) => return error(e, revision_id),
    };

    match state.repo.create_location(&request).await {
        Ok(location) => {
            refresh_bucket(&state, location.bucket).await;
            record_activity(
                &state,
                NewActivity::new(
                    format!("create_{}", location.bucket.as_str()),
                    location.bucket.as_str(),
                    &location.id,
                    json!({ "name": location.name, "building": location.building }),
                ),
            )
            .await;

            success(location, revision_after_write(&state, revision_id).await)
        }
        Err(e) => error(e, revision_id),
    }
}

/// PUT /api/locations/:id - Replace a location.
pub async fn update_location(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<LocationPayload>,
) -> ApiResult<Location> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    let request = match validate(payload) {
        Ok(request) => request,
        Err(e) => return error(e, revision_id),
    };

    match state.repo.replace_location(&id, &request).await {
        Ok((location, previous_bucket)) => {
            refresh_bucket(&state, location.bucket).await;
            if previous_bucket != location.bucket {
                refresh_bucket(&state, previous_bucket).await;
            }
            record_activity(
                &state,
                NewActivity::new(
                    format!("update_{}", location.bucket.as_str()),
                    location.bucket.as_str(),
                    &location.id,
                    json!({
                        "name": location.name,
                        "previousCategory": previous_bucket.as_str(),
                    }),
                ),
            )
            .await;

            success(location, revision_after_write(&state, revision_id).await)
        }
        Err(e) => error(e, revision_id),
    }
}

/// DELETE /api/locations/:id - Delete a location.
pub async fn delete_location(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.delete_location(&id).await {
        Ok(removed) => {
            refresh_bucket(&state, removed.bucket).await;
            record_activity(
                &state,
                NewActivity::new(
                    format!("delete_{}", removed.bucket.as_str()),
                    removed.bucket.as_str(),
                    &removed.id,
                    json!({ "name": removed.name }),
                ),
            )
            .await;

            success((), revision_after_write(&state, revision_id).await)
        }
        Err(e) => error(e, revision_id),
    }
}

/// Check a posted form and turn it into a repository write.
fn validate(payload: LocationPayload) -> Result<SaveLocationRequest, AppError> {
    if payload.bucket.trim().is_empty() {
        return Err(AppError::Validation("Category is required".to_string()));
    }
    let bucket = parse_bucket(payload.bucket.trim())?;
    if payload.name.trim().is_empty() {
        return Err(AppError::Validation("Name is required".to_string()));
    }
    if payload.building.trim().is_empty() {
        return Err(AppError::Validation("Building is required".to_string()));
    }

    Ok(SaveLocationRequest {
        bucket,
        name: payload.name,
        description: payload.description,
        building: payload.building,
        opening_hours: payload.opening_hours,
        image: payload.image,
        tags: payload.tags,
        latitude: payload.latitude,
        longitude: payload.longitude,
    })
}

fn parse_bucket(slug: &str) -> Result<CategoryBucket, AppError> {
    CategoryBucket::parse(slug)
        .ok_or_else(|| AppError::Validation(format!("Unknown category {:?}", slug)))
}

async fn refresh_bucket(state: &AppState, bucket: CategoryBucket) {
    if let Err(e) = state.locations.refresh(&state.repo, bucket).await {
        tracing::warn!(bucket = %bucket, "Failed to refresh location bucket: {}", e);
    }
}
