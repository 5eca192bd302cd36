//! Book store abstraction.
//!
//! This module defines the [`BookStore`] trait that abstracts over the remote
//! catalog service. The engine only ever talks to this port, which keeps the
//! controller testable against the in-memory adapter and keeps transport
//! detail out of the sync logic.
//!
//! # Design Philosophy
//!
//! The trait mirrors the service's HTTP surface one method per endpoint, not
//! a generic repository. Implementations are passive: they never publish
//! invalidation events or touch controller state; deciding what a result
//! means is the caller's job.

use async_trait::async_trait;

use crate::domain::error::Result;
use crate::domain::{Book, BookDraft, BookPatch, BookQuery, LibraryStats, Note};

/// Abstraction over the remote book catalog.
///
/// Implementations must be shareable across tasks; the controller holds one
/// behind an `Arc` and issues overlapping calls without external locking.
///
/// # Implementations
///
/// - [`HttpBookStore`](crate::remote::HttpBookStore): talks to the real
///   service over HTTP (default)
/// - [`MemoryBookStore`](crate::remote::MemoryBookStore): in-process adapter
///   with the same observable semantics, used by tests and demos
#[async_trait]
pub trait BookStore: Send + Sync {
    /// Fetches the book list matching `query`.
    ///
    /// The result is the complete, server-ordered snapshot for the given
    /// parameters; an empty list is a valid outcome, not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the service rejects it, or the
    /// response cannot be decoded.
    async fn list_books(&self, query: &BookQuery) -> Result<Vec<Book>>;

    /// Fetches a single book by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the book does not exist or the request fails.
    async fn get_book(&self, id: &str) -> Result<Book>;

    /// Creates a book from the draft and returns the stored record with its
    /// service-assigned id.
    ///
    /// # Errors
    ///
    /// Returns an error if the service rejects the draft or the request fails.
    async fn create_book(&self, draft: &BookDraft) -> Result<Book>;

    /// Applies a partial update and returns the updated record.
    ///
    /// Only the fields set in `patch` change; the service merges them into
    /// the stored book.
    ///
    /// # Errors
    ///
    /// Returns an error if the book does not exist or the request fails.
    async fn update_book(&self, id: &str, patch: &BookPatch) -> Result<Book>;

    /// Deletes a book and its attached notes.
    ///
    /// # Errors
    ///
    /// Returns an error if the book does not exist or the request fails.
    async fn delete_book(&self, id: &str) -> Result<()>;

    /// Fetches the notes attached to a book, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the book does not exist or the request fails.
    async fn list_notes(&self, book_id: &str) -> Result<Vec<Note>>;

    /// Attaches a new note to a book and returns the stored record.
    ///
    /// # Errors
    ///
    /// Returns an error if the book does not exist or the request fails.
    async fn create_note(&self, book_id: &str, content: &str) -> Result<Note>;

    /// Fetches a book's cover image reference, `Ok(None)` when no cover is
    /// set.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails for any reason other than a
    /// missing cover.
    async fn get_cover(&self, book_id: &str) -> Result<Option<String>>;

    /// Sets or replaces a book's cover image reference.
    ///
    /// # Errors
    ///
    /// Returns an error if the book does not exist or the request fails.
    async fn set_cover(&self, book_id: &str, cover_image: &str) -> Result<()>;

    /// Removes a book's cover image reference.
    ///
    /// # Errors
    ///
    /// Returns an error if the book does not exist or the request fails.
    async fn delete_cover(&self, book_id: &str) -> Result<()>;

    /// Fetches aggregate catalog statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response cannot be
    /// decoded.
    async fn stats(&self) -> Result<LibraryStats>;

    /// Restores the service's seed dataset, discarding all user changes.
    ///
    /// Callers are responsible for invalidating any cached lists afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    async fn reset(&self) -> Result<()>;
}
