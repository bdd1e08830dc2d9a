//! Password handling for pharmacy portal accounts.
//!
//! Hashes are Argon2id PHC strings. Hashing runs on the blocking pool.

use argon2::password_hash::{
    rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::Argon2;

use crate::errors::AppError;

pub const MIN_PASSWORD_LEN: usize = 8;

/// First-login password for a pharmacy account: `Pharm<name>123` with the
/// name stripped to ASCII letters and digits.
pub fn temporary_password(pharmacy_name: &str) -> String {
    let sanitized: String = pharmacy_name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();
    format!("Pharm{}123", sanitized)
}

/// Whether a password follows the temporary pattern and must be replaced
/// after sign-in.
pub fn is_temporary_password(password: &str) -> bool {
    password.starts_with("Pharm") && password.ends_with("123")
}

/// Check a new password and its confirmation.
pub fn validate_new_password(new_password: &str, confirm_password: &str) -> Result<(), AppError> {
    if new_password.is_empty() || confirm_password.is_empty() {
        return Err(AppError::Validation(
            "New password and confirmation are required".to_string(),
        ));
    }
    if new_password != confirm_password {
        return Err(AppError::Validation("New passwords do not match".to_string()));
    }
    if new_password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "New password must be at least {} characters long",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

pub async fn hash_password(password: &str) -> Result<String, AppError> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
    })
    .await
    .map_err(|e| AppError::Internal(format!("Password hashing task failed: {}", e)))?
}

/// `Ok(false)` on a wrong password; an unparseable stored hash is an error.
pub async fn verify_password(password: &str, stored_hash: &str) -> Result<bool, AppError> {
    let password = password.to_string();
    let stored_hash = stored_hash.to_string();
    tokio::task::spawn_blocking(move || -> Result<bool, AppError> {
        let parsed = PasswordHash::new(&stored_hash)
            .map_err(|e| AppError::Database(format!("Stored password hash is invalid: {}", e)))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    })
    .await
    .map_err(|e| AppError::Internal(format!("Password check task failed: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temporary_password_pattern() {
        let password = temporary_password("St. Mary's Pharmacy");
        assert_eq!(password, "PharmStMarysPharmacy123");
        assert!(is_temporary_password(&password));
        assert!(!is_temporary_password("a-better-secret"));
    }

    #[test]
    fn test_validate_new_password() {
        assert!(validate_new_password("longenough", "longenough").is_ok());
        assert!(validate_new_password("short", "short").is_err());
        assert!(validate_new_password("longenough", "different1").is_err());
        assert!(validate_new_password("", "").is_err());
    }

    #[tokio::test]
    async fn test_hash_and_verify() {
        let hash = hash_password("correct horse").await.unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct horse", &hash).await.unwrap());
        assert!(!verify_password("wrong horse", &hash).await.unwrap());
        assert!(verify_password("x", "not-a-hash").await.is_err());
    }
}
