//! Category page endpoints: one bucket, filtered by text and tags.

use axum::extract::{Path, State};
use axum_extra::extract::Query;
use serde::{Deserialize, Serialize};

use super::{error, success, ApiResult};
use crate::directory::{all_tags, filter, toggle_tag};
use crate::errors::AppError;
use crate::models::{CategoryBucket, Location};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CategoryQuery {
    #[serde(default)]
    pub q: String,
    /// Selected tags, one `tags=` parameter each.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Tag to flip in the selection before filtering.
    pub toggle: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryView {
    pub bucket: CategoryBucket,
    pub label: &'static str,
    pub locations: Vec<Location>,
    pub all_tags: Vec<String>,
    pub selected_tags: Vec<String>,
}

/// GET /api/categories/{category} - Filtered view of one bucket.
pub async fn get_category(
    State(state): State<AppState>,
    Path(category): Path<String>,
    Query(params): Query<CategoryQuery>,
) -> ApiResult<CategoryView> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    let Some(bucket) = CategoryBucket::parse(&category) else {
        return error(
            AppError::NotFound(format!("Category {} not found", category)),
            revision_id,
        );
    };

    let mut selected_tags = normalize_tags(&params.tags);
    if let Some(tag) = params.toggle.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        toggle_tag(&mut selected_tags, tag);
    }

    let locations = state.locations.bucket(bucket).await;

    success(
        CategoryView {
            bucket,
            label: bucket.label(),
            all_tags: all_tags(&locations),
            locations: filter(&locations, &params.q, &selected_tags),
            selected_tags,
        },
        revision_id,
    )
}

/// Trimmed, non-empty, first occurrence only.
fn normalize_tags(raw: &[String]) -> Vec<String> {
    let mut tags = Vec::new();
    for tag in raw.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
        if !tags.iter().any(|t: &String| t == tag) {
            tags.push(tag.to_string());
        }
    }
    tags
}
