//! # ud-client
//!
//! Async client for the Userdesk admin API.
//!
//! Listing requests are built from a `QueryState` through the filter-rule
//! encoder in `ud-queries`; this crate only moves the resulting parameters over
//! HTTP. Every call carries the stored bearer token, and a 401 from any call
//! forgets that token.
//!
//! ## Structure
//!
//! - `credentials` - Where the bearer token lives between runs
//! - `client` - Shared HTTP plumbing and response categorization
//! - `auth` - Login and logout
//! - `users` - The `/users-management/` endpoints
//! - `stats` - Row counts behind the statistics page

pub mod auth;
pub mod client;
pub mod credentials;
pub mod stats;
pub mod users;

#[cfg(test)]
mod test_support;

// Re-exports for convenience
pub use auth::AuthApi;
pub use client::ApiClient;
pub use credentials::{Credential, CredentialStore, FileCredentialStore, MemoryCredentialStore};
pub use stats::{default_stats, StatKind, StatsService};
pub use users::UsersApi;
