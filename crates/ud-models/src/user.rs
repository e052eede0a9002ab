//! User records
//!
//! Mirrors the `/users-management/` resources of the admin API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ud_core::ValidationErrors;
use validator::Validate;

/// Public bucket serving profile pictures, joined with `profile_path`
pub const PROFILE_IMAGE_BASE_URL: &str = "https://pub-4036d35baed54ee7a9504072ea49740f.r2.dev/";

/// Fields an admin may change through [`UserUpdateRequest`]
pub const EDITABLE_FIELDS: [&str; 13] = [
    "username",
    "first_name",
    "last_name",
    "nickname",
    "phone_number",
    "whatsapp_number",
    "country",
    "password",
    "is_ban",
    "is_registered",
    "chat_not_found",
    "score",
    "ban_time",
];

/// A bot user as returned by the API
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct User {
    /// Monotonic row id
    pub counter: i64,
    /// Telegram id
    pub user_id: i64,
    pub accounting_code: Option<String>,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub nickname: Option<String>,
    pub phone_number: Option<String>,
    pub whatsapp_number: Option<String>,
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub mode: Option<String>,
    #[serde(default)]
    pub is_ban: bool,
    pub is_registered: Option<bool>,
    pub chat_not_found: Option<bool>,
    pub score: Option<f64>,
    /// Unix seconds
    pub ban_time: Option<i64>,
    /// Unix seconds
    pub join_date: Option<i64>,
    pub profile_path: Option<String>,
    pub telegram_message_id: Option<String>,
    pub group_message_id: Option<String>,
    pub public_message_id: Option<String>,
    pub public_group_message_id: Option<String>,
    /// ISO-8601 instant
    pub updated_at: Option<String>,
    /// ISO-8601 instant
    pub channel_updated_at: Option<String>,
}

impl User {
    /// Full URL of the profile picture, if the user has one
    pub fn profile_image_url(&self) -> Option<String> {
        self.profile_path
            .as_deref()
            .filter(|p| !p.is_empty())
            .map(|p| format!("{}{}", PROFILE_IMAGE_BASE_URL, p))
    }

    /// Best available display name
    pub fn display_name(&self) -> String {
        self.first_name
            .as_deref()
            .or(self.username.as_deref())
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| self.user_id.to_string())
    }

    pub fn joined_at(&self) -> Option<DateTime<Utc>> {
        self.join_date
            .and_then(|ts| DateTime::from_timestamp(ts, 0))
    }

    pub fn banned_at(&self) -> Option<DateTime<Utc>> {
        self.ban_time
            .and_then(|ts| DateTime::from_timestamp(ts, 0))
    }
}

/// Partial update of a user, sent to `PATCH /users-management/update`.
///
/// Absent fields are left unchanged by the API.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, Validate)]
pub struct UserUpdateRequest {
    #[validate(range(min = 1, message = "must be a positive id"))]
    pub user_id: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 255))]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 255))]
    pub first_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 255))]
    pub last_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 255))]
    pub nickname: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 32))]
    pub phone_number: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 32))]
    pub whatsapp_number: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 255))]
    pub country: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 255))]
    pub password: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_ban: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_registered: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_not_found: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,

    /// Unix seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0, message = "must not be before 1970"))]
    pub ban_time: Option<i64>,
}

impl UserUpdateRequest {
    /// An update that changes nothing yet
    pub fn new(user_id: i64) -> Self {
        Self {
            user_id,
            ..Default::default()
        }
    }

    /// Prefill the editable fields from a user record
    pub fn from_user(user: &User) -> Self {
        Self {
            user_id: user.user_id,
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            nickname: user.nickname.clone(),
            phone_number: user.phone_number.clone(),
            whatsapp_number: user.whatsapp_number.clone(),
            country: user.country.clone(),
            password: user.password.clone(),
            is_ban: Some(user.is_ban),
            is_registered: user.is_registered,
            chat_not_found: user.chat_not_found,
            score: user.score,
            ban_time: user.ban_time,
        }
    }

    /// Set one editable field from a JSON value
    pub fn set_field(&mut self, field: &str, value: serde_json::Value) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if !EDITABLE_FIELDS.contains(&field) {
            errors.add(field, "is not editable");
            return Err(errors);
        }

        let mut document = match serde_json::to_value(&*self) {
            Ok(serde_json::Value::Object(map)) => map,
            _ => {
                errors.add_base("update request is not a JSON object");
                return Err(errors);
            }
        };
        document.insert(field.to_string(), value);

        match serde_json::from_value(serde_json::Value::Object(document)) {
            Ok(updated) => {
                *self = updated;
                Ok(())
            }
            Err(e) => {
                errors.add(field, format!("has an invalid value ({})", e));
                Err(errors)
            }
        }
    }

    /// Validate before sending
    pub fn check(&self) -> Result<(), ValidationErrors> {
        self.validate().map_err(convert_errors)
    }
}

fn convert_errors(source: validator::ValidationErrors) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    for (field, field_errors) in source.field_errors() {
        for error in field_errors {
            let message = error
                .message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| format!("is invalid ({})", error.code));
            errors.add(field, message);
        }
    }
    errors
}
