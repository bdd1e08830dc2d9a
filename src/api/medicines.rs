//! Medicine inventory endpoints.
//!
//! Inventory writes raise notifications: the write itself, low stock on
//! creation, stock threshold crossings on update, and failures.

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::json;

use super::{error, record_activity, revision_after_write, success, ApiResult};
use crate::errors::AppError;
use crate::models::{
    CreateNotificationRequest, Medicine, NewActivity, NotificationType, SaveMedicineRequest,
};
use crate::stats::{stock_alert, LOW_STOCK_THRESHOLD};
use crate::AppState;

/// GET /api/medicines - List all medicines.
pub async fn list_medicines(State(state): State<AppState>) -> ApiResult<Vec<Medicine>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.list_medicines().await {
        Ok(medicines) => success(medicines, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/medicines/:id - Get a single medicine.
pub async fn get_medicine(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Medicine> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.get_medicine(&id).await {
        Ok(Some(medicine)) => success(medicine, revision_id),
        Ok(None) => error(
            AppError::NotFound(format!("Medicine {} not found", id)),
            revision_id,
        ),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/medicines - Add a medicine to the inventory.
pub async fn create_medicine(
    State(state): State<AppState>,
    Json(request): Json<SaveMedicineRequest>,
) -> ApiResult<Medicine> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    if let Err(e) = validate(&request) {
        return error(e, revision_id);
    }

    match state.repo.create_medicine(&request).await {
        Ok(medicine) => {
            state
                .notifications
                .notify(CreateNotificationRequest::new(
                    NotificationType::Success,
                    "New Medicine Added",
                    format!(
                        "{} has been added to the inventory with {} units in stock.",
                        medicine.name, medicine.stock
                    ),
                ))
                .await;

            if medicine.stock <= LOW_STOCK_THRESHOLD {
                state
                    .notifications
                    .notify(CreateNotificationRequest::new(
                        NotificationType::Warning,
                        "Low Stock Warning",
                        format!(
                            "{} has been added with low stock ({} units).",
                            medicine.name, medicine.stock
                        ),
                    ))
                    .await;
            }

            record_activity(
                &state,
                NewActivity::new(
                    "create_medicine",
                    "medicine",
                    &medicine.id,
                    json!({ "name": medicine.name, "stock": medicine.stock }),
                ),
            )
            .await;

            success(medicine, revision_after_write(&state, revision_id).await)
        }
        Err(e) => {
            state
                .notifications
                .notify(CreateNotificationRequest::new(
                    NotificationType::Error,
                    "Error Adding Medicine",
                    format!("Failed to add {}: {}", request.name, e.message()),
                ))
                .await;
            error(e, revision_id)
        }
    }
}

/// PUT /api/medicines/:id - Replace a medicine.
pub async fn update_medicine(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<SaveMedicineRequest>,
) -> ApiResult<Medicine> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    if let Err(e) = validate(&request) {
        return error(e, revision_id);
    }

    match state.repo.replace_medicine(&id, &request).await {
        Ok((medicine, previous_stock)) => {
            state
                .notifications
                .notify(CreateNotificationRequest::new(
                    NotificationType::Info,
                    "Medicine Updated",
                    format!("{} has been updated in the inventory.", medicine.name),
                ))
                .await;

            if let Some(alert) = stock_alert(&medicine.name, previous_stock, medicine.stock) {
                state
                    .notifications
                    .notify(CreateNotificationRequest::new(
                        alert.kind,
                        alert.title,
                        alert.message,
                    ))
                    .await;
            }

            record_activity(
                &state,
                NewActivity::new(
                    "update_medicine",
                    "medicine",
                    &medicine.id,
                    json!({
                        "name": medicine.name,
                        "previousStock": previous_stock,
                        "stock": medicine.stock,
                        "status": medicine.status.as_str(),
                    }),
                ),
            )
            .await;

            success(medicine, revision_after_write(&state, revision_id).await)
        }
        Err(e) => {
            state
                .notifications
                .notify(CreateNotificationRequest::new(
                    NotificationType::Error,
                    "Error Updating Medicine",
                    format!("Failed to update {}: {}", request.name, e.message()),
                ))
                .await;
            error(e, revision_id)
        }
    }
}

/// DELETE /api/medicines/:id - Remove a medicine from the inventory.
pub async fn delete_medicine(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.delete_medicine(&id).await {
        Ok(removed) => {
            state
                .notifications
                .notify(CreateNotificationRequest::new(
                    NotificationType::Warning,
                    "Medicine Deleted",
                    format!("{} has been removed from the inventory.", removed.name),
                ))
                .await;

            record_activity(
                &state,
                NewActivity::new(
                    "delete_medicine",
                    "medicine",
                    &removed.id,
                    json!({ "name": removed.name }),
                ),
            )
            .await;

            success((), revision_after_write(&state, revision_id).await)
        }
        Err(e) => {
            state
                .notifications
                .notify(CreateNotificationRequest::new(
                    NotificationType::Error,
                    "Error Deleting Medicine",
                    format!("Failed to delete medicine: {}", e.message()),
                ))
                .await;
            error(e, revision_id)
        }
    }
}

fn validate(request: &SaveMedicineRequest) -> Result<(), AppError> {
    if request.name.trim().is_empty() {
        return Err(AppError::Validation("Name is required".to_string()));
    }
    if request.category.trim().is_empty() {
        return Err(AppError::Validation("Category is required".to_string()));
    }
    if !request.price.is_finite() || request.price < 0.0 {
        return Err(AppError::Validation(
            "Price must be a non-negative number".to_string(),
        ));
    }
    Ok(())
}
