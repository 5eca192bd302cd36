//! Domain layer for the synchronization engine.
//!
//! This module contains the core data model and pure query logic, independent
//! of transport or runtime concerns. Nothing here performs I/O; the types are
//! shared by the store adapters, the controller, and the host application.
//!
//! # Organization
//!
//! - [`error`]: Error types and result aliases
//! - [`book`]: Book, note, and statistics records plus mutation payloads
//! - [`query`]: Screen-level query state and wire-level list parameters
//!
//! # Examples
//!
//! ```
//! use shelfsync::domain::{Filter, QueryState};
//!
//! let state = QueryState {
//!     text: "herbert".to_string(),
//!     filter: Filter::Unread,
//!     ..QueryState::default()
//! };
//! let params = state.to_query().params();
//! assert_eq!(params[0], ("q", "herbert".to_string()));
//! assert_eq!(params[1], ("read", "false".to_string()));
//! ```

pub mod book;
pub mod error;
pub mod query;

pub use book::{Book, BookDraft, BookPatch, LibraryStats, Note};
pub use error::{Result, SyncError};
pub use query::{BookQuery, Filter, QueryState, SortField, SortOrder};
