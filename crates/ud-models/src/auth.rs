//! Admin authentication types

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Credentials posted (form-encoded) to `/auth/login`
#[derive(Debug, Clone, Serialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "is required"))]
    pub username: String,
    #[validate(length(min = 1, message = "is required"))]
    pub password: String,
}

impl LoginRequest {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    /// Token lifetime in seconds
    pub expires_in: u64,
    pub username: String,
    pub is_superadmin: bool,
}

impl LoginResponse {
    pub fn user(&self) -> AuthUser {
        AuthUser {
            username: self.username.clone(),
            is_superadmin: self.is_superadmin,
        }
    }
}

/// The signed-in admin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub username: String,
    pub is_superadmin: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_response() {
        let response: LoginResponse = serde_json::from_str(
            r#"{"access_token":"abc","token_type":"bearer","expires_in":3600,"username":"root","is_superadmin":true}"#,
        )
        .unwrap();
        assert_eq!(
            response.user(),
            AuthUser {
                username: "root".into(),
                is_superadmin: true
            }
        );
    }

    #[test]
    fn test_login_request_requires_both_fields() {
        assert!(LoginRequest::new("root", "secret").validate().is_ok());
        let errors = LoginRequest::new("", "").validate().unwrap_err();
        assert_eq!(errors.field_errors().len(), 2);
    }
}
