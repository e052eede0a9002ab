//! Response envelope
//!
//! Every API response has the shape `{ data, meta, error }`. Listings carry
//! pagination in `meta`; single records leave it as an empty object.

use serde::{Deserialize, Serialize};
use ud_core::PageMeta;

use crate::user::User;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiEnvelope<T, M = serde_json::Value> {
    pub data: T,
    #[serde(default)]
    pub meta: M,
    #[serde(default)]
    pub error: serde_json::Value,
}

impl<T, M> ApiEnvelope<T, M> {
    /// `error.message`, when the API filled it in
    pub fn error_message(&self) -> Option<&str> {
        error_message(&self.error)
    }
}

/// Extract `error.message` from a response body
pub fn error_message(error: &serde_json::Value) -> Option<&str> {
    error
        .get("message")
        .and_then(serde_json::Value::as_str)
        .filter(|m| !m.is_empty())
}

/// `GET /users-management/`
pub type UsersResponse = ApiEnvelope<Vec<User>, PageMeta>;

/// `GET /users-management/{id}` and `PATCH /users-management/update`
pub type SingleUserResponse = ApiEnvelope<User>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_users_response() {
        let body = json!({
            "data": [{ "counter": 1, "user_id": 10, "is_ban": false }],
            "meta": { "total": 41, "page": 1, "size": 20, "pages": 3 },
            "error": {}
        });
        let response: UsersResponse = serde_json::from_value(body).unwrap();
        assert_eq!(response.data.len(), 1);
        assert_eq!(response.meta.total, 41);
        assert_eq!(response.meta.pages, 3);
        assert!(response.error_message().is_none());
    }

    #[test]
    fn test_single_user_response() {
        let body = json!({
            "data": { "counter": 2, "user_id": 11, "is_ban": true },
            "meta": {},
            "error": { "message": "" }
        });
        let response: SingleUserResponse = serde_json::from_value(body).unwrap();
        assert!(response.data.is_ban);
        assert!(response.error_message().is_none());
    }

    #[test]
    fn test_error_message() {
        let error = json!({ "message": "phone number already taken" });
        assert_eq!(error_message(&error), Some("phone number already taken"));
        assert_eq!(error_message(&serde_json::Value::Null), None);
    }
}
