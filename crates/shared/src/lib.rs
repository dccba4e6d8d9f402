//! Shared library for the book browser.
//!
//! This crate provides common functionality used by the browser binary:
//! - Configuration management
//! - Display-ready book and character models
//! - Logging infrastructure

pub mod config;
pub mod logging;
pub mod models;

// Re-export commonly used types
pub use config::Config;
pub use logging::LogConfig;
pub use models::{Book, Character};

/// Common result type using anyhow::Error
pub type Result<T> = anyhow::Result<T>;
