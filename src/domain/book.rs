//! Book domain model and related record types.
//!
//! This module defines the canonical shapes the engine works with: the [`Book`]
//! record owned by the remote service, the [`Note`] records attached to a book,
//! the payload types for create and partial-update calls, and the aggregate
//! [`LibraryStats`] counters.
//!
//! Historical wire variance is normalized here, once, through the serde
//! derives: the publisher field also arrives as `editor`, note content also
//! arrives as `text` or `body`, and record ids arrive as either strings or
//! numbers. Everything past this boundary sees one canonical shape.

use serde::{Deserialize, Deserializer, Serialize};

/// Accepts an id encoded as either a JSON string or a JSON number.
///
/// The remote service assigns ids; depending on the backing store they come
/// back as `"42"` or `42`. Both normalize to `String`.
fn lenient_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IdRepr {
        Num(i64),
        Text(String),
    }

    Ok(match IdRepr::deserialize(deserializer)? {
        IdRepr::Num(n) => n.to_string(),
        IdRepr::Text(s) => s,
    })
}

/// A book record as held by the remote service.
///
/// The client keeps a read-mostly cached copy with a lifetime of "until the
/// next reload"; it never mutates a `Book` in place. All changes go through
/// the store and are followed by an authoritative refetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    /// Stable identifier assigned by the remote service.
    #[serde(deserialize_with = "lenient_id")]
    pub id: String,

    /// Title of the book.
    pub name: String,

    /// Author of the book.
    pub author: String,

    /// Publishing house. Older payloads name this field `editor`.
    #[serde(alias = "editor")]
    pub publisher: String,

    /// Four-digit publication year.
    pub year: u16,

    /// Whether the user has marked the book as read.
    #[serde(default)]
    pub read: bool,

    /// Whether the user has marked the book as a favorite.
    #[serde(default)]
    pub favorite: bool,

    /// User rating from 1 to 5, absent if the book has not been rated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,

    /// Free-form theme or genre label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,

    /// Cover image reference (data URI or URL), managed through the cover
    /// endpoints rather than the book update call.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
}

/// A note attached to exactly one book.
///
/// Notes are created by the user and, in this engine's scope, never edited or
/// deleted afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Stable identifier assigned by the remote service.
    #[serde(deserialize_with = "lenient_id")]
    pub id: String,

    /// Id of the book this note belongs to.
    #[serde(default, deserialize_with = "lenient_opt_id")]
    pub book_id: Option<String>,

    /// Note text. Older payloads name this field `text` or `body`.
    #[serde(alias = "text", alias = "body")]
    pub content: String,

    /// Creation timestamp assigned by the remote service.
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Optional-id variant of [`lenient_id`] for fields the service may omit.
fn lenient_opt_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IdRepr {
        Num(i64),
        Text(String),
    }

    Ok(Option::<IdRepr>::deserialize(deserializer)?.map(|id| match id {
        IdRepr::Num(n) => n.to_string(),
        IdRepr::Text(s) => s,
    }))
}

/// Payload for creating a book (`POST /books`).
///
/// Carries the book fields minus the service-assigned id and minus the cover
/// image, which has its own endpoints.
///
/// # Examples
///
/// ```
/// use shelfsync::domain::BookDraft;
///
/// let draft = BookDraft::new("The Hobbit", "J.R.R. Tolkien", "Allen & Unwin", 1937);
/// assert_eq!(draft.year, 1937);
/// assert!(!draft.read);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookDraft {
    /// Title of the book.
    pub name: String,

    /// Author of the book.
    pub author: String,

    /// Publishing house.
    #[serde(alias = "editor")]
    pub publisher: String,

    /// Four-digit publication year.
    pub year: u16,

    /// Initial read flag, defaults to unread.
    #[serde(default)]
    pub read: bool,

    /// Initial favorite flag, defaults to not favorite.
    #[serde(default)]
    pub favorite: bool,

    /// Optional initial rating from 1 to 5.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,

    /// Optional theme or genre label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
}

impl BookDraft {
    /// Creates a draft with the required fields; flags default to `false` and
    /// the optional fields to `None`.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        author: impl Into<String>,
        publisher: impl Into<String>,
        year: u16,
    ) -> Self {
        Self {
            name: name.into(),
            author: author.into(),
            publisher: publisher.into(),
            year,
            read: false,
            favorite: false,
            rating: None,
            theme: None,
        }
    }
}

/// Partial update payload (`PUT /books/:id`).
///
/// Only the fields that are `Some` are serialized, so a toggle sends exactly
/// one field. The service merges the payload into the stored record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "editor")]
    pub publisher: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favorite: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
}

impl BookPatch {
    /// Returns `true` if no field is set, i.e. the patch would be a no-op.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.author.is_none()
            && self.publisher.is_none()
            && self.year.is_none()
            && self.read.is_none()
            && self.favorite.is_none()
            && self.rating.is_none()
            && self.theme.is_none()
    }

    /// Applies the patch to a book in place.
    ///
    /// Used by in-memory adapters; the HTTP service performs the equivalent
    /// merge on its side.
    pub fn apply_to(&self, book: &mut Book) {
        if let Some(name) = &self.name {
            book.name.clone_from(name);
        }
        if let Some(author) = &self.author {
            book.author.clone_from(author);
        }
        if let Some(publisher) = &self.publisher {
            book.publisher.clone_from(publisher);
        }
        if let Some(year) = self.year {
            book.year = year;
        }
        if let Some(read) = self.read {
            book.read = read;
        }
        if let Some(favorite) = self.favorite {
            book.favorite = favorite;
        }
        if let Some(rating) = self.rating {
            book.rating = Some(rating);
        }
        if let Some(theme) = &self.theme {
            book.theme = Some(theme.clone());
        }
    }
}

/// Aggregate library statistics (`GET /stats`).
///
/// The stats shape is service-defined and has drifted between deployments, so
/// every field is defaulted; missing counters read as zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryStats {
    /// Total number of books in the catalog.
    #[serde(default)]
    pub total_books: u64,

    /// Number of books marked as read.
    #[serde(default)]
    pub read_books: u64,

    /// Number of books marked as favorite.
    #[serde(default)]
    pub favorite_books: u64,

    /// Mean rating across rated books, zero when nothing is rated.
    #[serde(default)]
    pub average_rating: f64,
}
