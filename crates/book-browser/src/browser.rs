//! Book browsing component.
//!
//! Holds the displayed page of books and orchestrates the three fetch
//! flows: replacing the page through the books listing, loading each
//! book's character roster in fixed-size windows, and resolving book
//! references discovered inside character records into the shared
//! [`ReferenceMap`].

use crate::api::types::{BookRecord, CharacterRecord};
use crate::api::{ApiError, IceAndFireClient};
use crate::references::ReferenceMap;
use futures::future::try_join_all;
use shared::config::BrowserConfig;
use shared::models::{Book, Character};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Default number of books per listing page
pub const DEFAULT_BOOK_PAGE_SIZE: u32 = 10;

/// Default number of characters loaded per roster page
pub const DEFAULT_CHARACTER_PAGE_SIZE: usize = 12;

/// Failures surfaced by the browser component
#[derive(Debug, Error)]
pub enum BrowserError {
    /// The books listing request failed and the page was left unchanged.
    /// Surfaced to the user as a blocking error.
    #[error("failed to fetch the books listing: {0}")]
    BookList(#[source] ApiError),

    /// A request inside a concurrent character or book-reference batch
    /// failed and the whole batch was dropped. Background loads only log
    /// this.
    #[error("failed to fetch a referenced resource: {0}")]
    Detail(#[source] ApiError),
}

/// Tuning knobs for the component, usually taken from `[browser]` config
#[derive(Debug, Clone)]
pub struct BrowserOptions {
    /// Books requested per listing page
    pub book_page_size: u32,
    /// Characters loaded per roster page
    pub character_page_size: usize,
    /// Page numbers offered by the pagination controls
    pub page_numbers: Vec<u32>,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            book_page_size: DEFAULT_BOOK_PAGE_SIZE,
            character_page_size: DEFAULT_CHARACTER_PAGE_SIZE,
            page_numbers: vec![1, 2],
        }
    }
}

impl From<&BrowserConfig> for BrowserOptions {
    fn from(config: &BrowserConfig) -> Self {
        Self {
            book_page_size: config.book_page_size,
            character_page_size: config.character_page_size,
            page_numbers: config.page_numbers.clone(),
        }
    }
}

/// The displayed page: its number and its books
#[derive(Debug)]
struct PageState {
    page_number: u32,
    books: Vec<Book>,
}

impl Default for PageState {
    fn default() -> Self {
        // The view starts on page 1 before anything is fetched.
        Self {
            page_number: 1,
            books: Vec::new(),
        }
    }
}

/// Book browsing component
///
/// Cloning shares all state, so background tasks hold their own handle to
/// the same page, reference map and task list.
#[derive(Clone)]
pub struct BookBrowser {
    client: IceAndFireClient,
    references: ReferenceMap,
    options: BrowserOptions,
    state: Arc<Mutex<PageState>>,
    tasks: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl BookBrowser {
    /// Create a browser over the given client and reference map
    pub fn new(
        client: IceAndFireClient,
        references: ReferenceMap,
        options: BrowserOptions,
    ) -> Self {
        Self {
            client,
            references,
            options,
            state: Arc::new(Mutex::new(PageState::default())),
            tasks: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Fetch a listing page using the configured page size
    pub async fn fetch_books(&self, page: u32) -> Result<(), BrowserError> {
        self.fetch_books_with_page_size(page, self.options.book_page_size)
            .await
    }

    /// Fetch a listing page with an explicit page size
    ///
    /// On success the displayed books are replaced, the page number is
    /// committed, and a character roster load starts in the background for
    /// every book on the new page. On failure nothing is applied: the
    /// previous page, its number and the reference map all stay as they
    /// were.
    pub async fn fetch_books_with_page_size(
        &self,
        page: u32,
        page_size: u32,
    ) -> Result<(), BrowserError> {
        let records = self
            .client
            .list_books(page, page_size)
            .await
            .map_err(BrowserError::BookList)?;

        info!(page, count = records.len(), "Fetched books listing");

        let books: Vec<Book> = records
            .into_iter()
            .map(|record| self.register_book(record))
            .collect();
        let urls: Vec<String> = books.iter().map(|book| book.url.clone()).collect();

        {
            let mut state = self.state.lock().unwrap();
            state.page_number = page;
            state.books = books;
        }

        // Each book's roster loads on its own schedule; nothing awaits it here.
        for url in urls {
            self.spawn_character_fetch(url);
        }

        Ok(())
    }

    /// Load the next window of a book's character roster
    ///
    /// Returns the number of characters fetched. The window is requested
    /// concurrently and awaited as one batch: a single failed request drops
    /// the whole window without touching the book. On success the fetched
    /// characters are appended, the cursor advances by one page even when
    /// the window was empty, and a reference resolution starts in the
    /// background for every book mentioned by the new characters. `Ok(0)`
    /// from a roster with references left is therefore the exhaustion
    /// signal: the cursor has moved past the end.
    pub async fn fetch_characters(&self, book_url: &str) -> Result<usize, BrowserError> {
        let page_size = self.options.character_page_size;

        let (cursor, window) = {
            let state = self.state.lock().unwrap();
            let Some(book) = state.books.iter().find(|book| book.url == book_url) else {
                debug!(book = %book_url, "Book left the displayed page, dropping fetch");
                return Ok(0);
            };
            (
                book.character_page,
                character_window(&book.character_refs, book.character_page, page_size),
            )
        };

        debug!(
            book = %book_url,
            page = cursor,
            requests = window.len(),
            "Fetching character roster page"
        );

        let records = try_join_all(
            window
                .iter()
                .map(|reference| self.client.get_character(reference)),
        )
        .await
        .map_err(BrowserError::Detail)?;

        let characters: Vec<Character> = records.into_iter().map(character_from_record).collect();
        let mentioned: Vec<Vec<String>> = characters
            .iter()
            .map(|character| character.book_refs.clone())
            .collect();
        let fetched = characters.len();

        {
            let mut state = self.state.lock().unwrap();
            if let Some(book) = state.books.iter_mut().find(|book| book.url == book_url) {
                book.characters.extend(characters);
                book.character_page = cursor + 1;
            }
        }

        for references in mentioned {
            self.spawn_reference_resolution(references);
        }

        Ok(fetched)
    }

    /// Fetch every referenced book missing from the map and merge it in
    ///
    /// Known references are filtered out before any request is made. The
    /// rest are fetched concurrently and awaited as one batch; a single
    /// failure drops the batch without inserting anything.
    pub async fn resolve_references(&self, references: &[String]) -> Result<(), BrowserError> {
        let unresolved = self.references.missing(references);
        if unresolved.is_empty() {
            return Ok(());
        }

        debug!(
            requested = references.len(),
            unresolved = unresolved.len(),
            "Resolving book references"
        );

        let records = try_join_all(
            unresolved
                .iter()
                .map(|reference| self.client.get_book(reference)),
        )
        .await
        .map_err(BrowserError::Detail)?;

        for record in records {
            // Keyed by the record's own reference, not the one requested.
            self.references.insert(record);
        }

        Ok(())
    }

    /// Snapshot of the displayed books
    pub fn books(&self) -> Vec<Book> {
        self.state.lock().unwrap().books.clone()
    }

    /// Currently displayed page number (1-based)
    pub fn page_number(&self) -> u32 {
        self.state.lock().unwrap().page_number
    }

    /// Page numbers offered by the pagination controls
    pub fn page_numbers(&self) -> &[u32] {
        &self.options.page_numbers
    }

    /// Characters loaded per roster page
    pub fn character_page_size(&self) -> usize {
        self.options.character_page_size
    }

    /// The shared reference map
    pub fn references(&self) -> &ReferenceMap {
        &self.references
    }

    /// Wait until every background load spawned so far has settled
    ///
    /// Covers tasks spawned by other tasks: roster loads spawn reference
    /// resolutions, so the task list is drained repeatedly until it stays
    /// empty. Rendering code calls this to observe a quiescent state.
    pub async fn wait_for_background_tasks(&self) {
        loop {
            let drained: Vec<JoinHandle<()>> = {
                let mut tasks = self.tasks.lock().unwrap();
                std::mem::take(&mut *tasks)
            };
            if drained.is_empty() {
                return;
            }
            for task in drained {
                if let Err(error) = task.await {
                    warn!(error = %error, "Background task panicked");
                }
            }
        }
    }

    /// Store the raw record in the reference map and prepare the
    /// display-ready book with its roster cursor at page zero
    fn register_book(&self, record: BookRecord) -> Book {
        self.references.insert(record.clone());
        book_from_record(record)
    }

    fn spawn_character_fetch(&self, book_url: String) {
        let browser = self.clone();
        let task = tokio::spawn(async move {
            if let Err(error) = browser.fetch_characters(&book_url).await {
                warn!(book = %book_url, error = %error, "Character roster load failed");
            }
        });
        self.tasks.lock().unwrap().push(task);
    }

    fn spawn_reference_resolution(&self, references: Vec<String>) {
        if references.is_empty() {
            return;
        }
        let browser = self.clone();
        let task = tokio::spawn(async move {
            if let Err(error) = browser.resolve_references(&references).await {
                warn!(error = %error, "Book reference resolution failed");
            }
        });
        self.tasks.lock().unwrap().push(task);
    }
}

/// Fixed-size window `[page * size, (page + 1) * size)` over the reference
/// list, clamped to its bounds
fn character_window(references: &[String], page: u32, size: usize) -> Vec<String> {
    let start = (page as usize).saturating_mul(size).min(references.len());
    let end = start.saturating_add(size).min(references.len());
    references[start..end].to_vec()
}

/// Prepare a raw book record for display
fn book_from_record(record: BookRecord) -> Book {
    // Convert the release timestamp, e.g. "1996-08-01T00:00:00"
    let released = chrono::NaiveDateTime::parse_from_str(&record.released, "%Y-%m-%dT%H:%M:%S")
        .map(|timestamp| timestamp.date())
        .ok();

    Book {
        url: record.url,
        name: record.name,
        isbn: record.isbn,
        authors: record.authors,
        number_of_pages: record.number_of_pages,
        publisher: record.publisher,
        country: record.country,
        media_type: record.media_type,
        released,
        character_refs: record.characters,
        pov_character_refs: record.pov_characters,
        character_page: 0,
        characters: Vec::new(),
    }
}

fn character_from_record(record: CharacterRecord) -> Character {
    Character {
        url: record.url,
        name: record.name,
        gender: record.gender,
        culture: record.culture,
        born: record.born,
        died: record.died,
        titles: record.titles,
        aliases: record.aliases,
        father: record.father,
        mother: record.mother,
        spouse: record.spouse,
        allegiances: record.allegiances,
        book_refs: record.books,
        pov_book_refs: record.pov_books,
        tv_series: record.tv_series,
        played_by: record.played_by,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn book_json(base_url: &str, id: u32, name: &str, character_ids: &[u32]) -> Value {
        json!({
            "url": format!("{base_url}/books/{id}"),
            "name": name,
            "isbn": "978-0553103540",
            "authors": ["George R. R. Martin"],
            "numberOfPages": 694,
            "publisher": "Bantam Books",
            "country": "United States",
            "mediaType": "Hardcover",
            "released": "1996-08-01T00:00:00",
            "characters": character_ids
                .iter()
                .map(|id| format!("{base_url}/characters/{id}"))
                .collect::<Vec<_>>(),
            "povCharacters": []
        })
    }

    fn character_json(base_url: &str, id: u32, name: &str, book_ids: &[u32]) -> Value {
        json!({
            "url": format!("{base_url}/characters/{id}"),
            "name": name,
            "gender": "Male",
            "culture": "Northmen",
            "born": "In 283 AC",
            "died": "",
            "titles": [],
            "aliases": [],
            "father": "",
            "mother": "",
            "spouse": "",
            "allegiances": [],
            "books": book_ids
                .iter()
                .map(|id| format!("{base_url}/books/{id}"))
                .collect::<Vec<_>>(),
            "povBooks": [],
            "tvSeries": [],
            "playedBy": []
        })
    }

    fn test_browser(server: &MockServer) -> BookBrowser {
        let client =
            IceAndFireClient::new(server.uri(), Duration::from_secs(5), "book-browser-tests")
                .unwrap();
        BookBrowser::new(client, ReferenceMap::new(), BrowserOptions::default())
    }

    async fn mount_listing(server: &MockServer, page: u32, body: Value) {
        Mock::given(method("GET"))
            .and(path("/books"))
            .and(query_param("page", page.to_string()))
            .and(query_param("pageSize", "10"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }

    async fn mount_character(server: &MockServer, id: u32, body: Value) {
        Mock::given(method("GET"))
            .and(path(format!("/characters/{id}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(1)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn fetch_books_replaces_page_and_registers_references() {
        let server = MockServer::start().await;
        let uri = server.uri();

        Mock::given(method("GET"))
            .and(path("/books"))
            .and(query_param("page", "2"))
            .and(query_param("pageSize", "10"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                book_json(&uri, 1, "A Game of Thrones", &[]),
                book_json(&uri, 2, "A Clash of Kings", &[]),
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let browser = test_browser(&server);
        browser.fetch_books(2).await.unwrap();
        browser.wait_for_background_tasks().await;

        assert_eq!(browser.page_number(), 2);

        let books = browser.books();
        assert_eq!(books.len(), 2);
        assert_eq!(books[0].name, "A Game of Thrones");
        assert_eq!(books[0].released, Some(chrono::NaiveDate::from_ymd_opt(1996, 8, 1).unwrap()));

        // Every raw record went into the reference map under its own URL.
        assert!(browser.references().contains(&format!("{uri}/books/1")));
        assert!(browser.references().contains(&format!("{uri}/books/2")));

        // An empty roster still consumes its first window.
        assert_eq!(books[0].character_page, 1);
        assert!(books[0].characters.is_empty());
    }

    #[tokio::test]
    async fn listing_failure_leaves_everything_unchanged() {
        let server = MockServer::start().await;
        let uri = server.uri();

        mount_listing(
            &server,
            1,
            json!([book_json(&uri, 1, "A Game of Thrones", &[])]),
        )
        .await;
        Mock::given(method("GET"))
            .and(path("/books"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let browser = test_browser(&server);
        browser.fetch_books(1).await.unwrap();
        browser.wait_for_background_tasks().await;

        let result = browser.fetch_books(2).await;
        assert!(matches!(result, Err(BrowserError::BookList(_))));

        // The failed switch applied nothing.
        assert_eq!(browser.page_number(), 1);
        assert_eq!(browser.books().len(), 1);
        assert_eq!(browser.books()[0].name, "A Game of Thrones");
        assert_eq!(browser.references().len(), 1);
    }

    #[tokio::test]
    async fn characters_load_in_fixed_windows_and_exhaust() {
        let server = MockServer::start().await;
        let uri = server.uri();

        // 13 references: one full window of 12 plus a final window of 1.
        let ids: Vec<u32> = (1..=13).collect();
        mount_listing(
            &server,
            1,
            json!([book_json(&uri, 1, "A Game of Thrones", &ids)]),
        )
        .await;
        for id in &ids {
            let body = character_json(&uri, *id, &format!("Character {id}"), &[]);
            mount_character(&server, *id, body).await;
        }

        let browser = test_browser(&server);
        browser.fetch_books(1).await.unwrap();
        browser.wait_for_background_tasks().await;

        let book_url = format!("{uri}/books/1");
        {
            let books = browser.books();
            assert_eq!(books[0].characters.len(), 12);
            assert_eq!(books[0].character_page, 1);
            assert_eq!(books[0].characters[0].name, "Character 1");
            assert!(books[0].has_unloaded_characters(12));
        }

        // Second window: the single remaining reference, appended after the
        // first twelve.
        let fetched = browser.fetch_characters(&book_url).await.unwrap();
        assert_eq!(fetched, 1);
        {
            let books = browser.books();
            assert_eq!(books[0].characters.len(), 13);
            assert_eq!(books[0].characters[0].name, "Character 1");
            assert_eq!(books[0].characters[12].name, "Character 13");
            assert_eq!(books[0].character_page, 2);
            assert!(!books[0].has_unloaded_characters(12));
        }

        // Past the end: nothing fetched, cursor still advances.
        let fetched = browser.fetch_characters(&book_url).await.unwrap();
        assert_eq!(fetched, 0);
        assert_eq!(browser.books()[0].character_page, 3);
    }

    #[tokio::test]
    async fn partial_first_window_loads_every_reference() {
        let server = MockServer::start().await;
        let uri = server.uri();

        mount_listing(
            &server,
            1,
            json!([book_json(&uri, 1, "A Game of Thrones", &[1, 2, 3])]),
        )
        .await;
        for id in 1..=3u32 {
            let body = character_json(&uri, id, &format!("Character {id}"), &[]);
            mount_character(&server, id, body).await;
        }

        let browser = test_browser(&server);
        browser.fetch_books(1).await.unwrap();
        browser.wait_for_background_tasks().await;

        // Three references fit one window: all fetched, one page consumed.
        let books = browser.books();
        assert_eq!(books[0].characters.len(), 3);
        assert_eq!(books[0].character_page, 1);
        assert!(!books[0].has_unloaded_characters(12));
    }

    #[tokio::test]
    async fn failed_character_batch_applies_nothing() {
        let server = MockServer::start().await;
        let uri = server.uri();

        mount_listing(
            &server,
            1,
            json!([book_json(&uri, 1, "A Game of Thrones", &[1, 2, 3])]),
        )
        .await;
        for id in [1u32, 2] {
            Mock::given(method("GET"))
                .and(path(format!("/characters/{id}")))
                .respond_with(ResponseTemplate::new(200).set_body_json(character_json(
                    &uri,
                    id,
                    &format!("Character {id}"),
                    &[],
                )))
                .mount(&server)
                .await;
        }
        Mock::given(method("GET"))
            .and(path("/characters/3"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let browser = test_browser(&server);
        browser.fetch_books(1).await.unwrap();
        browser.wait_for_background_tasks().await;

        // The background load already failed without applying anything.
        {
            let books = browser.books();
            assert!(books[0].characters.is_empty());
            assert_eq!(books[0].character_page, 0);
        }

        // An explicit retry fails the same way and still applies nothing.
        let book_url = format!("{uri}/books/1");
        let result = browser.fetch_characters(&book_url).await;
        assert!(matches!(result, Err(BrowserError::Detail(_))));
        {
            let books = browser.books();
            assert!(books[0].characters.is_empty());
            assert_eq!(books[0].character_page, 0);
        }
    }

    #[tokio::test]
    async fn resolver_skips_known_references() {
        let server = MockServer::start().await;
        let uri = server.uri();

        let known: crate::api::types::BookRecord =
            serde_json::from_value(book_json(&uri, 100, "Known Book", &[])).unwrap();

        Mock::given(method("GET"))
            .and(path("/books/100"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(book_json(&uri, 100, "Known Book", &[])),
            )
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/books/101"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(book_json(&uri, 101, "New Book", &[])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let browser = test_browser(&server);
        browser.references().insert(known);

        let references = vec![format!("{uri}/books/100"), format!("{uri}/books/101")];
        browser.resolve_references(&references).await.unwrap();

        assert_eq!(browser.references().len(), 2);
        assert_eq!(
            browser.references().title_of(&format!("{uri}/books/101")).as_deref(),
            Some("New Book")
        );
    }

    #[tokio::test]
    async fn resolver_inserts_by_fetched_identity() {
        let server = MockServer::start().await;
        let uri = server.uri();

        // The response for /books/7 identifies itself as /books/777.
        Mock::given(method("GET"))
            .and(path("/books/7"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(book_json(&uri, 777, "Aliased Book", &[])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let browser = test_browser(&server);
        let requested = format!("{uri}/books/7");
        browser.resolve_references(&[requested.clone()]).await.unwrap();

        assert!(browser.references().contains(&format!("{uri}/books/777")));
        assert!(!browser.references().contains(&requested));
    }

    #[tokio::test]
    async fn mentioned_books_resolve_in_background() {
        let server = MockServer::start().await;
        let uri = server.uri();

        mount_listing(
            &server,
            1,
            json!([book_json(&uri, 1, "A Game of Thrones", &[5])]),
        )
        .await;
        mount_character(&server, 5, character_json(&uri, 5, "Jon Snow", &[2])).await;
        Mock::given(method("GET"))
            .and(path("/books/2"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(book_json(&uri, 2, "A Clash of Kings", &[])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let browser = test_browser(&server);
        browser.fetch_books(1).await.unwrap();
        browser.wait_for_background_tasks().await;

        // The roster load cascaded into a reference resolution.
        let books = browser.books();
        assert_eq!(books[0].characters.len(), 1);
        assert_eq!(books[0].characters[0].name, "Jon Snow");
        assert_eq!(books[0].character_page, 1);
        assert_eq!(
            browser.references().title_of(&format!("{uri}/books/2")).as_deref(),
            Some("A Clash of Kings")
        );
    }

    #[tokio::test]
    async fn character_fetch_for_missing_book_is_a_no_op() {
        let server = MockServer::start().await;

        let browser = test_browser(&server);
        let fetched = browser
            .fetch_characters("https://example.org/books/404")
            .await
            .unwrap();

        assert_eq!(fetched, 0);
        assert!(browser.books().is_empty());
    }

    #[test]
    fn window_selection() {
        let references: Vec<String> = (0..5).map(|i| format!("ref-{i}")).collect();

        assert_eq!(character_window(&references, 0, 2), vec!["ref-0", "ref-1"]);
        assert_eq!(character_window(&references, 1, 2), vec!["ref-2", "ref-3"]);
        // Final partial window.
        assert_eq!(character_window(&references, 2, 2), vec!["ref-4"]);
        // Past the end.
        assert!(character_window(&references, 3, 2).is_empty());
        assert!(character_window(&[], 0, 12).is_empty());
    }

    #[test]
    fn options_from_config() {
        let config = BrowserConfig {
            book_page_size: 25,
            character_page_size: 6,
            page_numbers: vec![1, 2, 3],
        };
        let options = BrowserOptions::from(&config);
        assert_eq!(options.book_page_size, 25);
        assert_eq!(options.character_page_size, 6);
        assert_eq!(options.page_numbers, vec![1, 2, 3]);
    }
}
