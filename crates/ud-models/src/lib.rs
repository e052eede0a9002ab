//! # ud-models
//!
//! Data types exchanged with the users API.
//!
//! - `user` - User records and the edit request
//! - `envelope` - The `{ data, meta, error }` response wrapper
//! - `auth` - Login request/response and the signed-in admin

pub mod auth;
pub mod envelope;
pub mod user;

// Re-exports for convenience
pub use auth::{AuthUser, LoginRequest, LoginResponse};
pub use envelope::{ApiEnvelope, SingleUserResponse, UsersResponse};
pub use user::{User, UserUpdateRequest, EDITABLE_FIELDS, PROFILE_IMAGE_BASE_URL};
