//! Shared map of fetched book resources.
//!
//! The browser discovers book references faster than it displays them:
//! every character record points back at the books that character appears
//! in. The [`ReferenceMap`] collects those records as they are fetched so
//! each reference is requested at most once and can later be resolved to a
//! title for display.

use crate::api::types::BookRecord;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Key-value store mapping a book reference to its fetched record
///
/// Cloning is cheap and shares the underlying map, so a single instance can
/// be handed to every task that discovers references. Entries are keyed by
/// the fetched record's own `url` field and insertion is idempotent:
/// re-inserting a known reference overwrites the entry rather than
/// duplicating it.
#[derive(Debug, Clone, Default)]
pub struct ReferenceMap {
    books: Arc<Mutex<HashMap<String, BookRecord>>>,
}

impl ReferenceMap {
    /// Create an empty reference map
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fetched record, keyed by the record's own reference
    pub fn insert(&self, record: BookRecord) {
        self.books.lock().unwrap().insert(record.url.clone(), record);
    }

    /// Whether the reference has already been fetched
    pub fn contains(&self, reference: &str) -> bool {
        self.books.lock().unwrap().contains_key(reference)
    }

    /// Copy of the record behind a reference, if fetched
    pub fn get(&self, reference: &str) -> Option<BookRecord> {
        self.books.lock().unwrap().get(reference).cloned()
    }

    /// Resolve a reference to its book title
    pub fn title_of(&self, reference: &str) -> Option<String> {
        self.books
            .lock()
            .unwrap()
            .get(reference)
            .map(|record| record.name.clone())
    }

    /// Filter `references` down to the ones not yet in the map
    ///
    /// The snapshot is taken under a single lock. A concurrent insert that
    /// lands right after only causes an idempotent re-insert downstream.
    pub fn missing(&self, references: &[String]) -> Vec<String> {
        let books = self.books.lock().unwrap();
        references
            .iter()
            .filter(|reference| !books.contains_key(reference.as_str()))
            .cloned()
            .collect()
    }

    /// All known book titles, sorted for stable display
    pub fn titles(&self) -> Vec<String> {
        let mut titles: Vec<String> = self
            .books
            .lock()
            .unwrap()
            .values()
            .map(|record| record.name.clone())
            .collect();
        titles.sort();
        titles
    }

    /// Number of distinct references fetched so far
    pub fn len(&self) -> usize {
        self.books.lock().unwrap().len()
    }

    /// Whether the map holds no records yet
    pub fn is_empty(&self) -> bool {
        self.books.lock().unwrap().is_empty()
    }
}
