//! In-memory book store.
//!
//! This module implements [`BookStore`] entirely in process, reproducing the
//! observable semantics of the remote service: filtering, sorting, note
//! attachment, covers, stats, and seed-restoring reset. It backs the test
//! suite and doubles as an offline data source for host-app previews.
//!
//! # Test instrumentation
//!
//! - [`MemoryBookStore::fail_next`] queues an error returned by the next
//!   operation instead of executing it;
//! - [`MemoryBookStore::delay_next`] queues a latency applied to the next
//!   operation *after* it computed its result, emulating a response that is
//!   slow in transit and therefore stale on arrival;
//! - [`MemoryBookStore::requests`] returns the log of executed requests in
//!   `"METHOD /path"` form, so tests can assert exactly what was issued.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::error::{Result, SyncError};
use crate::domain::{Book, BookDraft, BookPatch, BookQuery, LibraryStats, Note, SortField, SortOrder};
use crate::remote::backend::BookStore;

struct StoreState {
    books: Vec<Book>,
    notes: HashMap<String, Vec<Note>>,
    seed: Vec<Book>,
    fail_queue: VecDeque<SyncError>,
    delay_queue: VecDeque<Duration>,
    requests: Vec<String>,
}

/// [`BookStore`] implementation holding the catalog in process memory.
///
/// # Examples
///
/// ```
/// use shelfsync::remote::MemoryBookStore;
///
/// let store = MemoryBookStore::new();
/// assert_eq!(store.request_count(), 0);
/// ```
pub struct MemoryBookStore {
    state: Mutex<StoreState>,
    next_id: AtomicU64,
}

impl MemoryBookStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::with_books(Vec::new())
    }

    /// Creates a store seeded with `books`; [`BookStore::reset`] restores
    /// exactly this seed.
    #[must_use]
    pub fn with_books(books: Vec<Book>) -> Self {
        let max_numeric_id = books
            .iter()
            .filter_map(|b| b.id.parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        Self {
            state: Mutex::new(StoreState {
                seed: books.clone(),
                books,
                notes: HashMap::new(),
                fail_queue: VecDeque::new(),
                delay_queue: VecDeque::new(),
                requests: Vec::new(),
            }),
            next_id: AtomicU64::new(max_numeric_id + 1),
        }
    }

    /// Inserts a book directly, bypassing the service surface.
    ///
    /// Used by tests to change the dataset between requests without leaving a
    /// trace in the request log.
    pub fn insert(&self, book: Book) {
        self.state().books.push(book);
    }

    /// Queues an error; the next operation returns it instead of executing.
    pub fn fail_next(&self, error: SyncError) {
        self.state().fail_queue.push_back(error);
    }

    /// Queues a latency; the next operation sleeps for it after computing its
    /// result, so the returned data reflects the store at call time.
    pub fn delay_next(&self, delay: Duration) {
        self.state().delay_queue.push_back(delay);
    }

    /// Snapshot of the executed requests, oldest first.
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        self.state().requests.clone()
    }

    /// Number of executed requests.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.state().requests.len()
    }

    /// Number of executed list fetches (`GET /books` requests).
    #[must_use]
    pub fn list_count(&self) -> usize {
        self.state()
            .requests
            .iter()
            .filter(|r| r.starts_with("GET /books?") || *r == "GET /books")
            .count()
    }

    /// Clears the request log.
    pub fn clear_requests(&self) {
        self.state().requests.clear();
    }

    fn state(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn fresh_id(&self) -> String {
        self.next_id.fetch_add(1, Ordering::Relaxed).to_string()
    }

    /// Records the request, applies failure injection, and takes the queued
    /// latency (slept by the caller after computing its result).
    fn begin(&self, request: String) -> Result<Option<Duration>> {
        let mut state = self.state();
        tracing::trace!(request = %request, "memory store request");
        state.requests.push(request);
        if let Some(error) = state.fail_queue.pop_front() {
            return Err(error);
        }
        Ok(state.delay_queue.pop_front())
    }

    async fn finish(delay: Option<Duration>) {
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

impl Default for MemoryBookStore {
    fn default() -> Self {
        Self::new()
    }
}

fn matches_query(book: &Book, query: &BookQuery) -> bool {
    if let Some(text) = query.text.as_deref() {
        let needle = text.to_lowercase();
        let haystack = [
            book.name.to_lowercase(),
            book.author.to_lowercase(),
            book.theme.clone().unwrap_or_default().to_lowercase(),
        ];
        if !haystack.iter().any(|field| field.contains(&needle)) {
            return false;
        }
    }
    if let Some(author) = query.author.as_deref() {
        if !book.author.eq_ignore_ascii_case(author) {
            return false;
        }
    }
    if let Some(theme) = query.theme.as_deref() {
        let theme_matches = book
            .theme
            .as_deref()
            .is_some_and(|t| t.eq_ignore_ascii_case(theme));
        if !theme_matches {
            return false;
        }
    }
    if let Some(read) = query.read {
        if book.read != read {
            return false;
        }
    }
    if let Some(favorite) = query.favorite {
        if book.favorite != favorite {
            return false;
        }
    }
    true
}

fn sort_key(book: &Book, field: SortField) -> String {
    match field {
        SortField::Name => book.name.to_lowercase(),
        SortField::Author => book.author.to_lowercase(),
        SortField::Theme => book.theme.clone().unwrap_or_default().to_lowercase(),
    }
}

fn not_found() -> SyncError {
    SyncError::Remote {
        status: 404,
        message: "book not found".to_string(),
    }
}

#[async_trait]
impl BookStore for MemoryBookStore {
    async fn list_books(&self, query: &BookQuery) -> Result<Vec<Book>> {
        let params = query.params();
        let request = if params.is_empty() {
            "GET /books".to_string()
        } else {
            let rendered: Vec<String> =
                params.iter().map(|(k, v)| format!("{k}={v}")).collect();
            format!("GET /books?{}", rendered.join("&"))
        };
        let delay = self.begin(request)?;

        let mut books: Vec<Book> = {
            let state = self.state();
            state
                .books
                .iter()
                .filter(|book| matches_query(book, query))
                .cloned()
                .collect()
        };
        if let Some((field, order)) = query.sort {
            books.sort_by(|a, b| {
                let ordering = sort_key(a, field).cmp(&sort_key(b, field));
                match order {
                    SortOrder::Asc => ordering,
                    SortOrder::Desc => ordering.reverse(),
                }
            });
        }

        Self::finish(delay).await;
        Ok(books)
    }

    async fn get_book(&self, id: &str) -> Result<Book> {
        let delay = self.begin(format!("GET /books/{id}"))?;
        let book = self
            .state()
            .books
            .iter()
            .find(|b| b.id == id)
            .cloned()
            .ok_or_else(not_found)?;
        Self::finish(delay).await;
        Ok(book)
    }

    async fn create_book(&self, draft: &BookDraft) -> Result<Book> {
        let delay = self.begin("POST /books".to_string())?;
        let book = Book {
            id: self.fresh_id(),
            name: draft.name.clone(),
            author: draft.author.clone(),
            publisher: draft.publisher.clone(),
            year: draft.year,
            read: draft.read,
            favorite: draft.favorite,
            rating: draft.rating,
            theme: draft.theme.clone(),
            cover_image: None,
        };
        self.state().books.push(book.clone());
        Self::finish(delay).await;
        Ok(book)
    }

    async fn update_book(&self, id: &str, patch: &BookPatch) -> Result<Book> {
        let body = serde_json::to_string(patch).unwrap_or_default();
        let delay = self.begin(format!("PUT /books/{id} {body}"))?;
        let book = {
            let mut state = self.state();
            let book = state
                .books
                .iter_mut()
                .find(|b| b.id == id)
                .ok_or_else(not_found)?;
            patch.apply_to(book);
            book.clone()
        };
        Self::finish(delay).await;
        Ok(book)
    }

    async fn delete_book(&self, id: &str) -> Result<()> {
        let delay = self.begin(format!("DELETE /books/{id}"))?;
        {
            let mut state = self.state();
            let before = state.books.len();
            state.books.retain(|b| b.id != id);
            if state.books.len() == before {
                return Err(not_found());
            }
            state.notes.remove(id);
        }
        Self::finish(delay).await;
        Ok(())
    }

    async fn list_notes(&self, book_id: &str) -> Result<Vec<Note>> {
        let delay = self.begin(format!("GET /books/{book_id}/notes"))?;
        let notes = {
            let state = self.state();
            if !state.books.iter().any(|b| b.id == book_id) {
                return Err(not_found());
            }
            state.notes.get(book_id).cloned().unwrap_or_default()
        };
        Self::finish(delay).await;
        Ok(notes)
    }

    async fn create_note(&self, book_id: &str, content: &str) -> Result<Note> {
        let delay = self.begin(format!("POST /books/{book_id}/notes"))?;
        let note = {
            let mut state = self.state();
            if !state.books.iter().any(|b| b.id == book_id) {
                return Err(not_found());
            }
            let note = Note {
                id: self.fresh_id(),
                book_id: Some(book_id.to_string()),
                content: content.to_string(),
                created_at: chrono::Utc::now(),
            };
            state
                .notes
                .entry(book_id.to_string())
                .or_default()
                .push(note.clone());
            note
        };
        Self::finish(delay).await;
        Ok(note)
    }

    async fn get_cover(&self, book_id: &str) -> Result<Option<String>> {
        let delay = self.begin(format!("GET /books/{book_id}/cover"))?;
        let cover = self
            .state()
            .books
            .iter()
            .find(|b| b.id == book_id)
            .ok_or_else(not_found)?
            .cover_image
            .clone();
        Self::finish(delay).await;
        Ok(cover)
    }

    async fn set_cover(&self, book_id: &str, cover_image: &str) -> Result<()> {
        let delay = self.begin(format!("PUT /books/{book_id}/cover"))?;
        {
            let mut state = self.state();
            let book = state
                .books
                .iter_mut()
                .find(|b| b.id == book_id)
                .ok_or_else(not_found)?;
            book.cover_image = Some(cover_image.to_string());
        }
        Self::finish(delay).await;
        Ok(())
    }

    async fn delete_cover(&self, book_id: &str) -> Result<()> {
        let delay = self.begin(format!("DELETE /books/{book_id}/cover"))?;
        {
            let mut state = self.state();
            let book = state
                .books
                .iter_mut()
                .find(|b| b.id == book_id)
                .ok_or_else(not_found)?;
            book.cover_image = None;
        }
        Self::finish(delay).await;
        Ok(())
    }

    async fn stats(&self) -> Result<LibraryStats> {
        let delay = self.begin("GET /stats".to_string())?;
        let stats = {
            let state = self.state();
            let rated: Vec<u8> = state.books.iter().filter_map(|b| b.rating).collect();
            #[allow(clippy::cast_precision_loss)]
            let average_rating = if rated.is_empty() {
                0.0
            } else {
                rated.iter().map(|r| f64::from(*r)).sum::<f64>() / rated.len() as f64
            };
            LibraryStats {
                total_books: state.books.len() as u64,
                read_books: state.books.iter().filter(|b| b.read).count() as u64,
                favorite_books: state.books.iter().filter(|b| b.favorite).count() as u64,
                average_rating,
            }
        };
        Self::finish(delay).await;
        Ok(stats)
    }

    async fn reset(&self) -> Result<()> {
        let delay = self.begin("POST /reset".to_string())?;
        {
            let mut state = self.state();
            let seed = state.seed.clone();
            state.books = seed;
            state.notes.clear();
        }
        Self::finish(delay).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Filter, QueryState};

    fn book(id: &str, name: &str, author: &str, read: bool, favorite: bool) -> Book {
        Book {
            id: id.to_string(),
            name: name.to_string(),
            author: author.to_string(),
            publisher: "test".to_string(),
            year: 2000,
            read,
            favorite,
            rating: None,
            theme: None,
            cover_image: None,
        }
    }

    fn seeded() -> MemoryBookStore {
        MemoryBookStore::with_books(vec![
            book("1", "The Hobbit", "J.R.R. Tolkien", true, true),
            book("2", "Dune", "Frank Herbert", false, false),
            book("3", "The Silmarillion", "J.R.R. Tolkien", false, true),
        ])
    }

    #[tokio::test]
    async fn list_filters_by_text_across_fields() {
        let store = seeded();
        let query = QueryState {
            text: "tolkien".to_string(),
            ..QueryState::default()
        }
        .to_query();

        let books = store.list_books(&query).await.unwrap();
        let ids: Vec<&str> = books.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);
    }

    #[tokio::test]
    async fn list_applies_flag_filters() {
        let store = seeded();

        let unread = QueryState {
            filter: Filter::Unread,
            ..QueryState::default()
        };
        let books = store.list_books(&unread.to_query()).await.unwrap();
        assert!(books.iter().all(|b| !b.read));

        let favorites = QueryState {
            filter: Filter::Favorite,
            ..QueryState::default()
        };
        let books = store.list_books(&favorites.to_query()).await.unwrap();
        let ids: Vec<&str> = books.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);
    }

    #[tokio::test]
    async fn list_sorts_case_insensitively_in_both_directions() {
        let store = seeded();
        let query = BookQuery {
            sort: Some((SortField::Name, SortOrder::Asc)),
            ..BookQuery::default()
        };
        let names: Vec<String> = store
            .list_books(&query)
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.name)
            .collect();
        assert_eq!(names, vec!["Dune", "The Hobbit", "The Silmarillion"]);

        let query = BookQuery {
            sort: Some((SortField::Name, SortOrder::Desc)),
            ..BookQuery::default()
        };
        let names: Vec<String> = store
            .list_books(&query)
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.name)
            .collect();
        assert_eq!(names, vec!["The Silmarillion", "The Hobbit", "Dune"]);
    }

    #[tokio::test]
    async fn crud_round_trip_assigns_ids_and_merges_patches() {
        let store = seeded();

        let created = store
            .create_book(&BookDraft::new("Emma", "Jane Austen", "John Murray", 1815))
            .await
            .unwrap();
        assert_eq!(created.id, "4");

        let updated = store
            .update_book(
                &created.id,
                &BookPatch {
                    favorite: Some(true),
                    ..BookPatch::default()
                },
            )
            .await
            .unwrap();
        assert!(updated.favorite);
        assert_eq!(updated.name, "Emma");

        store.delete_book(&created.id).await.unwrap();
        let err = store.get_book(&created.id).await.unwrap_err();
        assert!(matches!(err, SyncError::Remote { status: 404, .. }));
    }

    #[tokio::test]
    async fn notes_attach_to_their_book_and_die_with_it() {
        let store = seeded();

        store.create_note("2", "slow start").await.unwrap();
        store.create_note("2", "worth it").await.unwrap();

        let notes = store.list_notes("2").await.unwrap();
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].content, "slow start");
        assert_eq!(notes[0].book_id.as_deref(), Some("2"));

        store.delete_book("2").await.unwrap();
        let err = store.list_notes("2").await.unwrap_err();
        assert!(matches!(err, SyncError::Remote { status: 404, .. }));
    }

    #[tokio::test]
    async fn cover_lifecycle() {
        let store = seeded();

        assert_eq!(store.get_cover("1").await.unwrap(), None);
        store.set_cover("1", "data:image/png;base64,xyz").await.unwrap();
        assert_eq!(
            store.get_cover("1").await.unwrap().as_deref(),
            Some("data:image/png;base64,xyz")
        );
        store.delete_cover("1").await.unwrap();
        assert_eq!(store.get_cover("1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn stats_aggregate_flags_and_ratings() {
        let store = seeded();
        store
            .update_book(
                "2",
                &BookPatch {
                    rating: Some(4),
                    ..BookPatch::default()
                },
            )
            .await
            .unwrap();

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.total_books, 3);
        assert_eq!(stats.read_books, 1);
        assert_eq!(stats.favorite_books, 2);
        assert!((stats.average_rating - 4.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn reset_restores_the_seed() {
        let store = seeded();
        store.delete_book("1").await.unwrap();
        store.create_note("2", "gone after reset").await.unwrap();

        store.reset().await.unwrap();

        let books = store.list_books(&BookQuery::default()).await.unwrap();
        assert_eq!(books.len(), 3);
        assert!(store.list_notes("2").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn fail_next_rejects_exactly_one_operation() {
        let store = seeded();
        store.fail_next(SyncError::Network("connection refused".to_string()));

        let err = store.delete_book("1").await.unwrap_err();
        assert!(matches!(err, SyncError::Network(_)));

        // the failed request is still logged, and the next one succeeds
        assert_eq!(store.requests(), vec!["DELETE /books/1".to_string()]);
        assert_eq!(store.list_books(&BookQuery::default()).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn request_log_captures_rendered_params_and_bodies() {
        let store = seeded();
        let query = QueryState {
            text: "dune".to_string(),
            filter: Filter::Unread,
            ..QueryState::default()
        };
        store.list_books(&query.to_query()).await.unwrap();
        store
            .update_book(
                "2",
                &BookPatch {
                    read: Some(true),
                    ..BookPatch::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(
            store.requests(),
            vec![
                "GET /books?q=dune&read=false".to_string(),
                r#"PUT /books/2 {"read":true}"#.to_string(),
            ]
        );
        assert_eq!(store.list_count(), 1);
    }
}
