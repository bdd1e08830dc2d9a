//! Pharmacy portal sign-in.
//!
//! These routes are public; the account password is the credential. The
//! username is the account email.

use axum::{extract::State, Json};
use serde_json::json;

use super::{error, record_activity, revision_after_write, success, ApiResult};
use crate::auth::{hash_password, is_temporary_password, validate_new_password, verify_password};
use crate::errors::AppError;
use crate::models::{
    ChangePasswordRequest, Credential, NewActivity, PharmacyLoginRequest, PharmacySession, User,
    UserRole,
};
use crate::AppState;

const INVALID_LOGIN: &str = "Invalid username or password";

/// POST /api/pharmacy/login - Sign in to the pharmacy portal.
pub async fn pharmacy_login(
    State(state): State<AppState>,
    Json(request): Json<PharmacyLoginRequest>,
) -> ApiResult<PharmacySession> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    let user = match authenticate(&state, &request.username, &request.password).await {
        Ok(user) => user,
        Err(e) => return error(e, revision_id),
    };

    let session = match open_session(&state, user).await {
        Ok(session) => session,
        Err(e) => return error(e, revision_id),
    };

    if let Err(e) = state.repo.record_sign_in(&session.user_id).await {
        tracing::warn!(user_id = %session.user_id, "Failed to record sign-in: {}", e);
    }
    tracing::info!(
        user_id = %session.user_id,
        pharmacy_id = %session.pharmacy_id,
        "Pharmacy user signed in"
    );

    success(session, revision_after_write(&state, revision_id).await)
}

/// POST /api/pharmacy/change-password - Replace the caller's own password.
pub async fn change_own_password(
    State(state): State<AppState>,
    Json(request): Json<ChangePasswordRequest>,
) -> ApiResult<PharmacySession> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    if let Err(e) = validate_new_password(&request.new_password, &request.confirm_password) {
        return error(e, revision_id);
    }
    if request.new_password == request.current_password {
        return error(
            AppError::Validation("New password must differ from the current one".to_string()),
            revision_id,
        );
    }

    let user = match authenticate(&state, &request.username, &request.current_password).await {
        Ok(user) => user,
        Err(e) => return error(e, revision_id),
    };

    let credential = match hash_password(&request.new_password).await {
        Ok(password_hash) => Credential {
            password_hash,
            must_change_password: is_temporary_password(&request.new_password),
        },
        Err(e) => return error(e, revision_id),
    };

    let user = match state.repo.set_password(&user.id, &credential).await {
        Ok(user) => user,
        Err(e) => return error(e, revision_id),
    };

    record_activity(
        &state,
        NewActivity::new("change_password", "user", &user.id, json!({ "email": user.email })),
    )
    .await;

    match open_session(&state, user).await {
        Ok(session) => success(session, revision_after_write(&state, revision_id).await),
        Err(e) => error(e, revision_id),
    }
}

/// Resolve a pharmacy account from its credentials. Every failure reads
/// the same to the caller.
async fn authenticate(state: &AppState, username: &str, password: &str) -> Result<User, AppError> {
    if username.trim().is_empty() || password.is_empty() {
        return Err(AppError::Validation(
            "Username and password are required".to_string(),
        ));
    }

    let Some((user, Some(credential))) = state.repo.find_user_credential(username).await? else {
        return Err(AppError::Unauthorized(INVALID_LOGIN.to_string()));
    };
    if user.role != UserRole::Pharmacy
        || !verify_password(password, &credential.password_hash).await?
    {
        tracing::warn!(username = %username.trim(), "Rejected pharmacy sign-in");
        return Err(AppError::Unauthorized(INVALID_LOGIN.to_string()));
    }

    Ok(user)
}

async fn open_session(state: &AppState, user: User) -> Result<PharmacySession, AppError> {
    let pharmacy = match user.pharmacy_id.as_deref() {
        Some(pharmacy_id) => state.repo.get_pharmacy(pharmacy_id).await?,
        None => None,
    }
    .ok_or_else(|| AppError::Unauthorized(INVALID_LOGIN.to_string()))?;

    Ok(PharmacySession {
        user_id: user.id,
        full_name: user.full_name,
        pharmacy_id: pharmacy.id,
        pharmacy_name: pharmacy.name,
        must_change_password: user.must_change_password,
    })
}
