//! Shared domain types for the auth service.

pub mod error;
pub mod types;
pub mod user;
