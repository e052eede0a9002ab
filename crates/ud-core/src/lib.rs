//! # ud-core
//!
//! Core types and utilities for Userdesk.
//!
//! This crate provides the foundational building blocks used across all other crates:
//! - Common error types (transport categories, rule contract violations, validation)
//! - Result type alias
//! - Pagination metadata returned by the users API
//! - Configuration types

pub mod error;
pub mod pagination;
pub mod config;

pub use error::*;
pub use pagination::*;
