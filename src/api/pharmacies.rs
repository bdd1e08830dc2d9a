//! Pharmacy and pharmacy stock endpoints.

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::json;

use super::{error, record_activity, revision_after_write, success, ApiResult};
use crate::db::tables;
use crate::errors::AppError;
use crate::models::{NewActivity, Pharmacy, SavePharmacyRequest, SetStockRequest, StockItem};
use crate::AppState;

/// GET /api/pharmacies - List all pharmacies.
pub async fn list_pharmacies(State(state): State<AppState>) -> ApiResult<Vec<Pharmacy>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.list_pharmacies().await {
        Ok(pharmacies) => success(pharmacies, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/pharmacies/:id - Get a single pharmacy.
pub async fn get_pharmacy(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Pharmacy> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.get_pharmacy(&id).await {
        Ok(Some(pharmacy)) => success(pharmacy, revision_id),
        Ok(None) => error(
            AppError::NotFound(format!("Pharmacy {} not found", id)),
            revision_id,
        ),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/pharmacies - Create a pharmacy.
pub async fn create_pharmacy(
    State(state): State<AppState>,
    Json(request): Json<SavePharmacyRequest>,
) -> ApiResult<Pharmacy> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    if let Err(e) = validate(&request) {
        return error(e, revision_id);
    }

    match state.repo.create_pharmacy(&request).await {
        Ok(pharmacy) => {
            record_activity(
                &state,
                NewActivity::new(
                    "create_pharmacy",
                    "pharmacy",
                    &pharmacy.id,
                    json!({ "name": pharmacy.name }),
                ),
            )
            .await;
            success(pharmacy, revision_after_write(&state, revision_id).await)
        }
        Err(e) => error(e, revision_id),
    }
}

/// PUT /api/pharmacies/:id - Replace a pharmacy.
pub async fn update_pharmacy(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<SavePharmacyRequest>,
) -> ApiResult<Pharmacy> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    if let Err(e) = validate(&request) {
        return error(e, revision_id);
    }

    match state.repo.replace_pharmacy(&id, &request).await {
        Ok(pharmacy) => {
            record_activity(
                &state,
                NewActivity::new(
                    "update_pharmacy",
                    "pharmacy",
                    &pharmacy.id,
                    json!({ "name": pharmacy.name, "available": pharmacy.available }),
                ),
            )
            .await;
            success(pharmacy, revision_after_write(&state, revision_id).await)
        }
        Err(e) => error(e, revision_id),
    }
}

/// DELETE /api/pharmacies/:id - Delete a pharmacy and its stock rows.
pub async fn delete_pharmacy(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.delete_pharmacy(&id).await {
        Ok(removed) => {
            record_activity(
                &state,
                NewActivity::new(
                    "delete_pharmacy",
                    "pharmacy",
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

/// GET /api/pharmacies/:id/stock - Medicines stocked at a pharmacy.
pub async fn list_pharmacy_stock(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Vec<StockItem>> {
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
        Ok(items) => success(items, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// PUT /api/pharmacies/:id/stock/:medicine_id - Set a stock quantity.
pub async fn set_pharmacy_stock(
    State(state): State<AppState>,
    Path((id, medicine_id)): Path<(String, String)>,
    Json(request): Json<SetStockRequest>,
) -> ApiResult<Vec<StockItem>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    if request.quantity < 0 {
        return error(
            AppError::Validation("Quantity cannot be negative".to_string()),
            revision_id,
        );
    }

    if let Err(e) = state
        .repo
        .set_stock(&id, &medicine_id, request.quantity)
        .await
    {
        return error(e, revision_id);
    }

    record_activity(
        &state,
        NewActivity::new(
            "update_stock",
            tables::PHARMACY_STOCK,
            &id,
            json!({ "medicineId": medicine_id, "quantity": request.quantity }),
        ),
    )
    .await;

    let new_revision = revision_after_write(&state, revision_id).await;
    match state.repo.list_pharmacy_stock(&id).await {
        Ok(items) => success(items, new_revision),
        Err(e) => error(e, new_revision),
    }
}

/// DELETE /api/pharmacies/:id/stock/:medicine_id - Stop stocking a medicine.
pub async fn remove_pharmacy_stock(
    State(state): State<AppState>,
    Path((id, medicine_id)): Path<(String, String)>,
) -> ApiResult<Vec<StockItem>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    if let Err(e) = state.repo.remove_stock(&id, &medicine_id).await {
        return error(e, revision_id);
    }

    record_activity(
        &state,
        NewActivity::new(
            "remove_stock",
            tables::PHARMACY_STOCK,
            &id,
            json!({ "medicineId": medicine_id }),
        ),
    )
    .await;

    let new_revision = revision_after_write(&state, revision_id).await;
    match state.repo.list_pharmacy_stock(&id).await {
        Ok(items) => success(items, new_revision),
        Err(e) => error(e, new_revision),
    }
}

fn validate(request: &SavePharmacyRequest) -> Result<(), AppError> {
    if request.name.trim().is_empty() {
        return Err(AppError::Validation("Name is required".to_string()));
    }
    if request.location.trim().is_empty() {
        return Err(AppError::Validation("Location is required".to_string()));
    }
    if request.phone.trim().is_empty() {
        return Err(AppError::Validation("Phone is required".to_string()));
    }
    Ok(())
}
