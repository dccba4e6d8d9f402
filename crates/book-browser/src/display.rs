//! Terminal rendering for the browser.
//!
//! Pure formatting functions so the output can be unit tested without a
//! terminal attached.

use crate::references::ReferenceMap;
use shared::models::{Book, Character};

/// Header line with the pagination controls, current page bracketed
pub fn page_header(page_number: u32, page_numbers: &[u32]) -> String {
    let controls: Vec<String> = page_numbers
        .iter()
        .map(|n| {
            if *n == page_number {
                format!("[{n}]")
            } else {
                n.to_string()
            }
        })
        .collect();
    format!("Books, page {} (pages: {})", page_number, controls.join(" "))
}

/// Multi-line book entry with its roster progress
pub fn book_summary(index: usize, book: &Book, character_page_size: usize) -> String {
    let released = book
        .released
        .map(|date| date.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "unreleased".to_string());

    let mut lines = vec![
        format!("{index}. {} ({released})", book.name),
        format!(
            "   {}, {} pages, ISBN {}",
            book.publisher, book.number_of_pages, book.isbn
        ),
    ];

    let mut roster = format!(
        "   characters: {} of {} loaded",
        book.characters.len(),
        book.character_refs.len()
    );
    if book.has_unloaded_characters(character_page_size) {
        roster.push_str(" (more available)");
    }
    lines.push(roster);

    lines.join("\n")
}

/// One roster line: the character and the books they are known from
///
/// Mentioned books are shown by title when the reference map has resolved
/// them; unresolved references are omitted.
pub fn character_line(character: &Character, references: &ReferenceMap) -> String {
    let mut line = format!("     - {}", character.display_name());

    if !character.culture.is_empty() {
        line.push_str(&format!(" ({})", character.culture));
    }

    let titles: Vec<String> = character
        .book_refs
        .iter()
        .filter_map(|reference| references.title_of(reference))
        .collect();
    if !titles.is_empty() {
        line.push_str(&format!(" | also in: {}", titles.join(", ")));
    }

    line
}

/// Listing of every book title fetched so far
pub fn known_titles(references: &ReferenceMap) -> String {
    let titles = references.titles();
    if titles.is_empty() {
        return "No books fetched yet.".to_string();
    }

    let mut lines = vec![format!("{} books fetched:", titles.len())];
    for title in titles {
        lines.push(format!("  - {title}"));
    }
    lines.join("\n")
}
