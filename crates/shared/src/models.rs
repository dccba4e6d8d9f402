//! Data models for the book browser.
//!
//! This module defines the display-ready book and character structures
//! shared between the browser component and its rendering code.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A book prepared for display
///
/// Built from a raw API record when a listing page is fetched. The character
/// roster loads separately in fixed-size pages: `character_page` is the next
/// page to request and `characters` accumulates the records fetched so far.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    /// Resource reference identifying this book
    pub url: String,

    // Metadata
    pub name: String,
    pub isbn: String,
    pub authors: Vec<String>,
    pub number_of_pages: u32,
    pub publisher: String,
    pub country: String,
    pub media_type: String,
    pub released: Option<NaiveDate>,

    // References to related resources
    pub character_refs: Vec<String>,
    pub pov_character_refs: Vec<String>,

    // Character roster state
    pub character_page: u32,      // Next page to request (0-based)
    pub characters: Vec<Character>,
}

impl Book {
    /// Whether pages past the current cursor can still contain character
    /// references.
    pub fn has_unloaded_characters(&self, page_size: usize) -> bool {
        (self.character_page as usize).saturating_mul(page_size) < self.character_refs.len()
    }
}

/// A character in a book's roster, immutable once fetched
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Character {
    /// Resource reference identifying this character
    pub url: String,

    // Identity
    pub name: String,
    pub gender: String,
    pub culture: String,
    pub born: String,
    pub died: String,
    pub titles: Vec<String>,
    pub aliases: Vec<String>,

    // Relations
    pub father: String,
    pub mother: String,
    pub spouse: String,
    pub allegiances: Vec<String>,

    // References to related resources
    pub book_refs: Vec<String>,
    pub pov_book_refs: Vec<String>,

    // Screen adaptation
    pub tv_series: Vec<String>,
    pub played_by: Vec<String>,
}

impl Character {
    /// Display name, falling back to the first alias for unnamed characters
    pub fn display_name(&self) -> &str {
        if !self.name.is_empty() {
            &self.name
        } else if let Some(alias) = self.aliases.first() {
            alias
        } else {
            "(unknown)"
        }
    }
}
