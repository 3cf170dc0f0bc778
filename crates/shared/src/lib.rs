//! Shared types, errors, and configuration for Kasira.
//!
//! This crate provides common types used across all other crates:
//! - Application-wide error taxonomy
//! - Pagination types for list endpoints
//! - Configuration management
//! - JWT claims validation (token issuance lives elsewhere)

pub mod config;
pub mod error;
pub mod jwt;
pub mod types;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use jwt::{Claims, JwtConfig, JwtError, JwtService};
pub use types::{PageRequest, PageResponse};
