//! Back-office user endpoints.

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::json;

use super::{error, record_activity, revision_after_write, success, ApiResult};
use crate::auth::{hash_password, is_temporary_password, temporary_password, validate_new_password};
use crate::errors::AppError;
use crate::models::{
    CreateNotificationRequest, CreatedUser, Credential, NewActivity, NotificationType, Pharmacy,
    SaveUserRequest, SetPasswordRequest, User, UserPayload, UserRole,
};
use crate::AppState;

/// GET /api/users - List all users.
pub async fn list_users(State(state): State<AppState>) -> ApiResult<Vec<User>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.list_users().await {
        Ok(users) => success(users, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/users/:id - Get a single user.
pub async fn get_user(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<User> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.get_user(&id).await {
        Ok(Some(user)) => success(user, revision_id),
        Ok(None) => error(
            AppError::NotFound(format!("User {} not found", id)),
            revision_id,
        ),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/users - Create a user. Pharmacy accounts get a sign-in
/// credential, generated from the pharmacy name unless one is supplied.
pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<UserPayload>,
) -> ApiResult<CreatedUser> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    let initial_password = payload.password.clone().filter(|p| !p.is_empty());
    let (request, pharmacy) = match validate(&state, payload).await {
        Ok(validated) => validated,
        Err(e) => return error(e, revision_id),
    };

    let mut temporary = None;
    let password = match (pharmacy, initial_password) {
        (Some(_), Some(password)) => {
            if let Err(e) = validate_new_password(&password, &password) {
                return error(e, revision_id);
            }
            Some(password)
        }
        (Some(pharmacy), None) => {
            let password = temporary_password(&pharmacy.name);
            temporary = Some(password.clone());
            Some(password)
        }
        (None, _) => None,
    };

    let credential = match password {
        Some(password) => match hash_password(&password).await {
            Ok(password_hash) => Some(Credential {
                password_hash,
                must_change_password: is_temporary_password(&password),
            }),
            Err(e) => return error(e, revision_id),
        },
        None => None,
    };

    match state.repo.create_user(&request, credential.as_ref()).await {
        Ok(user) => {
            let mut notification = CreateNotificationRequest::new(
                NotificationType::Success,
                format!("New {} user created", user.role.as_str().to_lowercase()),
                format!("Successfully created user account for {}", user.full_name),
            );
            if let Some(pharmacy_id) = &user.pharmacy_id {
                notification = notification.for_pharmacy(pharmacy_id);
            }
            state.notifications.notify(notification).await;

            record_activity(
                &state,
                NewActivity::new(
                    "create_user",
                    "user",
                    &user.id,
                    json!({ "email": user.email, "role": user.role.as_str() }),
                ),
            )
            .await;

            success(
                CreatedUser {
                    user,
                    temporary_password: temporary,
                },
                revision_after_write(&state, revision_id).await,
            )
        }
        Err(e) => {
            state
                .notifications
                .notify(CreateNotificationRequest::new(
                    NotificationType::Error,
                    "Failed to create user",
                    format!("Error creating {}: {}", request.full_name, e.message()),
                ))
                .await;
            error(e, revision_id)
        }
    }
}

/// PUT /api/users/:id - Replace a user.
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<UserPayload>,
) -> ApiResult<User> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    let request = match validate(&state, payload).await {
        Ok((request, _)) => request,
        Err(e) => return error(e, revision_id),
    };

    match state.repo.replace_user(&id, &request).await {
        Ok(user) => {
            record_activity(
                &state,
                NewActivity::new(
                    "update_user",
                    "user",
                    &user.id,
                    json!({ "email": user.email, "role": user.role.as_str() }),
                ),
            )
            .await;

            success(user, revision_after_write(&state, revision_id).await)
        }
        Err(e) => {
            state
                .notifications
                .notify(CreateNotificationRequest::new(
                    NotificationType::Error,
                    "Failed to update user",
                    format!("Error updating {}: {}", request.full_name, e.message()),
                ))
                .await;
            error(e, revision_id)
        }
    }
}

/// DELETE /api/users/:id - Delete a user.
pub async fn delete_user(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<()> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.delete_user(&id).await {
        Ok(removed) => {
            state
                .notifications
                .notify(CreateNotificationRequest::new(
                    NotificationType::Success,
                    format!("{} user deleted", removed.role.as_str()),
                    format!("Successfully deleted user account for {}", removed.full_name),
                ))
                .await;

            record_activity(
                &state,
                NewActivity::new(
                    "delete_user",
                    "user",
                    &removed.id,
                    json!({ "email": removed.email }),
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
                    "Failed to delete user",
                    format!("Error: {}", e.message()),
                ))
                .await;
            error(e, revision_id)
        }
    }
}

/// PUT /api/users/:id/password - Set a user's password. A password in the
/// temporary pattern forces a change at the next sign-in.
pub async fn set_user_password(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<SetPasswordRequest>,
) -> ApiResult<User> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    if let Err(e) = validate_new_password(&request.new_password, &request.confirm_password) {
        return error(e, revision_id);
    }

    let credential = match hash_password(&request.new_password).await {
        Ok(password_hash) => Credential {
            password_hash,
            must_change_password: is_temporary_password(&request.new_password),
        },
        Err(e) => return error(e, revision_id),
    };

    match state.repo.set_password(&id, &credential).await {
        Ok(user) => {
            let mut notification = CreateNotificationRequest::new(
                NotificationType::Success,
                "Pharmacy password updated",
                format!("Successfully updated password for {}", user.full_name),
            );
            if let Some(pharmacy_id) = &user.pharmacy_id {
                notification = notification.for_pharmacy(pharmacy_id);
            }
            state.notifications.notify(notification).await;

            record_activity(
                &state,
                NewActivity::new("update_password", "user", &user.id, json!({ "email": user.email })),
            )
            .await;

            success(user, revision_after_write(&state, revision_id).await)
        }
        Err(e) => error(e, revision_id),
    }
}

/// Check a posted form. Pharmacy users come back with their pharmacy.
async fn validate(
    state: &AppState,
    payload: UserPayload,
) -> Result<(SaveUserRequest, Option<Pharmacy>), AppError> {
    if payload.email.trim().is_empty() || !payload.email.contains('@') {
        return Err(AppError::Validation("A valid email is required".to_string()));
    }
    if payload.full_name.trim().is_empty() {
        return Err(AppError::Validation("Full name is required".to_string()));
    }
    let role = UserRole::parse(payload.role.trim())
        .ok_or_else(|| AppError::Validation(format!("Unknown role {:?}", payload.role)))?;

    let mut pharmacy = None;
    if role == UserRole::Pharmacy {
        let Some(pharmacy_id) = payload.pharmacy_id.as_deref().filter(|id| !id.is_empty()) else {
            return Err(AppError::Validation(
                "Pharmacy users must be assigned to a pharmacy".to_string(),
            ));
        };
        match state.repo.get_pharmacy(pharmacy_id).await? {
            Some(found) => pharmacy = Some(found),
            None => {
                return Err(AppError::Validation(format!(
                    "Pharmacy {} does not exist",
                    pharmacy_id
                )))
            }
        }
    }

    Ok((
        SaveUserRequest {
            email: payload.email,
            full_name: payload.full_name,
            role,
            pharmacy_id: payload.pharmacy_id,
        },
        pharmacy,
    ))
}
