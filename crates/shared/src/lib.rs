//! Shared types, errors, and configuration for Pinewood.
//!
//! This crate provides common types used across all other crates:
//! - Cent-integer money types
//! - Typed IDs for type-safe entity references
//! - Pagination types for list endpoints
//! - Application-wide error types
//! - Configuration management
//! - The fire-and-forget notification client

pub mod config;
pub mod error;
pub mod notify;
pub mod types;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use notify::{NotificationKind, NotificationService};
