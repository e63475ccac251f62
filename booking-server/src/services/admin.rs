//! Admin accounts

use shared::error::{AppError, ErrorCode};
use shared::models::Admin;

use super::{BookingService, LoginRequest, text};
use crate::error::ServiceResult;
use crate::util::{hash_password, verify_password};
use crate::validation::{MAX_PASSWORD_LEN, present, require_fields, validate_required_text};

/// Shortest password accepted for the bootstrap account
pub const MIN_PASSWORD_LEN: usize = 8;

impl BookingService {
    /// Create the account or reset its password (startup bootstrap).
    pub async fn bootstrap_admin(&self, username: &str, password: &str) -> ServiceResult<Admin> {
        let username = validate_required_text(username, "username", 64)?;
        if password.len() < MIN_PASSWORD_LEN || password.len() > MAX_PASSWORD_LEN {
            return Err(AppError::with_message(
                ErrorCode::ValueOutOfRange,
                format!(
                    "admin password must be {MIN_PASSWORD_LEN} to {MAX_PASSWORD_LEN} characters"
                ),
            )
            .into());
        }
        let hash = hash_password(password)
            .map_err(|e| AppError::internal(format!("password hashing failed: {e}")))?;
        let admin = self
            .store
            .upsert_admin(&username, &hash, self.now_millis())
            .await?;
        tracing::info!(username = %admin.username, "Admin account ready");
        Ok(admin)
    }

    /// Check credentials. Unknown user and wrong password look the same.
    pub async fn authenticate_admin(&self, req: &LoginRequest) -> ServiceResult<Admin> {
        require_fields(&[
            ("username", present(&req.username)),
            ("password", present(&req.password)),
        ])?;
        let username = text(&req.username).trim();
        let password = text(&req.password);
        if password.len() > MAX_PASSWORD_LEN {
            return Err(AppError::invalid_credentials().into());
        }

        let Some(admin) = self.store.find_admin(username).await? else {
            tracing::warn!(username, "Admin login failed: unknown user");
            return Err(AppError::invalid_credentials().into());
        };
        if !verify_password(password, &admin.password_hash) {
            tracing::warn!(username, "Admin login failed: wrong password");
            return Err(AppError::invalid_credentials().into());
        }
        Ok(admin)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;

    fn login(username: &str, password: &str) -> LoginRequest {
        LoginRequest {
            username: Some(username.into()),
            password: Some(password.into()),
        }
    }

    #[tokio::test]
    async fn bootstrap_then_authenticate() {
        let (service, _) = service();
        service
            .bootstrap_admin("manager", "correct horse")
            .await
            .unwrap();

        let admin = service
            .authenticate_admin(&login("manager", "correct horse"))
            .await
            .unwrap();
        assert_eq!(admin.username, "manager");
        assert_ne!(admin.password_hash, "correct horse");

        let wrong = service
            .authenticate_admin(&login("manager", "battery staple"))
            .await
            .unwrap_err();
        assert_eq!(wrong.code(), Some(ErrorCode::InvalidCredentials));

        let unknown = service
            .authenticate_admin(&login("nobody", "correct horse"))
            .await
            .unwrap_err();
        assert_eq!(unknown.code(), Some(ErrorCode::InvalidCredentials));
    }

    #[tokio::test]
    async fn bootstrap_rejects_short_password() {
        let (service, _) = service();
        let err = service.bootstrap_admin("manager", "short").await.unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::ValueOutOfRange));
    }

    #[tokio::test]
    async fn login_requires_both_fields() {
        let (service, _) = service();
        let err = service
            .authenticate_admin(&LoginRequest {
                username: Some("manager".into()),
                password: None,
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::RequiredField));
    }
}
