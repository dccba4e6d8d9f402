//! Book browser over the Ice and Fire REST API.
//!
//! This library fetches paginated book listings, loads each book's
//! character roster in fixed-size pages, and resolves cross-referenced
//! books discovered in character records into a shared reference map.

pub mod api;
pub mod browser;
pub mod display;
pub mod references;

pub use api::{ApiError, IceAndFireClient};
pub use browser::{BookBrowser, BrowserError, BrowserOptions};
pub use references::ReferenceMap;
