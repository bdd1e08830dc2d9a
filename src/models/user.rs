//! Back-office user model.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum UserRole {
    Admin,
    Staff,
    Pharmacy,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "Admin",
            UserRole::Staff => "Staff",
            UserRole::Pharmacy => "Pharmacy",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Admin" => Some(UserRole::Admin),
            "Staff" => Some(UserRole::Staff),
            "Pharmacy" => Some(UserRole::Pharmacy),
            _ => None,
        }
    }
}

/// Active once the user has signed in at least once.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum UserStatus {
    Active,
    Inactive,
}

impl UserStatus {
    pub fn from_last_sign_in(last_sign_in_at: Option<&str>) -> Self {
        match last_sign_in_at {
            Some(_) => UserStatus::Active,
            None => UserStatus::Inactive,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub role: UserRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pharmacy_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_sign_in_at: Option<String>,
    pub status: UserStatus,
    /// Set while the account still signs in with a temporary password.
    pub must_change_password: bool,
    pub created_at: String,
}

/// User form as posted. Fields default so that missing values are reported
/// by validation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserPayload {
    pub email: String,
    pub full_name: String,
    pub role: String,
    pub pharmacy_id: Option<String>,
    /// Initial password for pharmacy accounts. Generated when absent.
    pub password: Option<String>,
}

/// A validated user write.
#[derive(Debug, Clone)]
pub struct SaveUserRequest {
    pub email: String,
    pub full_name: String,
    pub role: UserRole,
    pub pharmacy_id: Option<String>,
}

/// Stored sign-in secret for an account.
#[derive(Debug, Clone)]
pub struct Credential {
    pub password_hash: String,
    pub must_change_password: bool,
}

/// Response to a user creation. The temporary password is only ever
/// returned here.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedUser {
    #[serde(flatten)]
    pub user: User,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temporary_password: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PharmacyLoginRequest {
    pub username: String,
    pub password: String,
}

/// What a pharmacy portal sign-in hands back.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PharmacySession {
    pub user_id: String,
    pub full_name: String,
    pub pharmacy_id: String,
    pub pharmacy_name: String,
    pub must_change_password: bool,
}

/// Admin-side password reset.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SetPasswordRequest {
    pub new_password: String,
    pub confirm_password: String,
}

/// Self-service change from the pharmacy portal.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChangePasswordRequest {
    pub username: String,
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}
