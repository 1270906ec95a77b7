//! Grantly Core Library
//!
//! This crate provides the domain models, error types, configuration, and
//! validation shared across all Grantly components, plus the collaborator
//! traits (user directory, system directory, grant store) consumed by the
//! bulk upload pipeline.

pub mod config;
pub mod directory;
pub mod error;
pub mod models;
pub mod validation;

// Re-export commonly used types
pub use config::Config;
pub use directory::{GrantStore, SystemDirectory, UserDirectory};
pub use error::{AppError, ErrorMetadata, LogLevel};
