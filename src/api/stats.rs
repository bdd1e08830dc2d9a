//! Statistics API endpoints.

use axum::extract::{Path, State};

use super::{error, success, ApiResult};
use crate::errors::AppError;
use crate::models::CategoryBucket;
use crate::stats::{DashboardStats, PharmacyStats};
use crate::AppState;

/// GET /api/stats/dashboard - Location counts per category.
pub async fn get_dashboard_stats(State(state): State<AppState>) -> ApiResult<DashboardStats> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    let mut counts = Vec::with_capacity(CategoryBucket::SEARCH_ORDER.len());
    for bucket in CategoryBucket::SEARCH_ORDER {
        match state.repo.count_locations(bucket).await {
            Ok(count) => counts.push((bucket, count)),
            Err(e) => return error(e, revision_id),
        }
    }

    success(DashboardStats::from_counts(&counts), revision_id)
}

/// GET /api/pharmacies/:id/stats - Inventory summary for one pharmacy.
pub async fn get_pharmacy_stats(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<PharmacyStats> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.get_pharmacy(&id).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return error(
                AppError::NotFound(format!("Pharmacy {} not found", id)),
                revision_id,
            )
        }
        Err(e) => return error(e, revision_id),
    }

    match state.repo.list_pharmacy_stock(&id).await {
        Ok(items) => success(PharmacyStats::from_stock(&items), revision_id),
        Err(e) => error(e, revision_id),
    }
}
