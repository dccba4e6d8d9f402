//! Ice and Fire API client implementation.
//!
//! This module provides a typed client for the public "An API of Ice and
//! Fire" REST service, covering the paginated books listing and the
//! individual book and character resources.

pub mod client;
pub mod types;

pub use client::{ApiError, IceAndFireClient};
pub use types::{BookRecord, CharacterRecord};
