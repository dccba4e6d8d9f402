//! Ice and Fire API response types.
//!
//! These types represent the JSON resources returned by the API. Every
//! resource carries its own `url`, which doubles as its identifier and as
//! the reference other resources use to point at it.

use serde::{Deserialize, Serialize};

/// Book resource as returned by the API
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookRecord {
    /// Resource reference identifying this book
    pub url: String,
    pub name: String,
    pub isbn: String,
    pub authors: Vec<String>,
    pub number_of_pages: u32,
    pub publisher: String,
    pub country: String,
    pub media_type: String,
    /// Release timestamp, e.g. "1996-08-01T00:00:00"
    pub released: String,
    /// References to the characters appearing in this book
    pub characters: Vec<String>,
    /// References to the point-of-view characters
    pub pov_characters: Vec<String>,
}

/// Character resource as returned by the API
///
/// The API uses empty strings rather than nulls for unknown scalar fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterRecord {
    /// Resource reference identifying this character
    pub url: String,
    pub name: String,
    pub gender: String,
    pub culture: String,
    pub born: String,
    pub died: String,
    pub titles: Vec<String>,
    pub aliases: Vec<String>,
    pub father: String,
    pub mother: String,
    pub spouse: String,
    pub allegiances: Vec<String>,
    /// References to the books this character appears in
    pub books: Vec<String>,
    pub pov_books: Vec<String>,
    pub tv_series: Vec<String>,
    pub played_by: Vec<String>,
}
