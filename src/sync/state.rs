//! Observable list state owned by a controller.
//!
//! Render collaborators watch this state and draw from it; they never mutate
//! it. The list is always a complete server-ordered snapshot: the controller
//! replaces it wholesale on every applied reload and never patches it after a
//! local mutation.

use crate::domain::Book;

/// Where the list stands in its load cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadPhase {
    /// Nothing has been requested yet.
    #[default]
    Idle,
    /// A non-refresh reload is in flight.
    Loading,
    /// The last applied reload succeeded; `books` is current.
    Ready,
    /// The last applied reload failed; `books` holds the previous snapshot.
    Failed,
}

/// Snapshot of a controller's list state.
///
/// `phase` and `refreshing` are deliberately separate: pull-to-refresh keeps
/// the list visible behind its own indicator, while the loading phase covers
/// mount and query-change reloads.
#[derive(Debug, Clone, Default)]
pub struct ListState {
    /// Current book snapshot. Preserved verbatim across failed reloads.
    pub books: Vec<Book>,

    /// Load cycle phase.
    pub phase: LoadPhase,

    /// Whether a pull-to-refresh reload is in flight.
    pub refreshing: bool,

    /// User-facing message of the most recent applied failure, cleared when a
    /// new reload starts.
    pub last_error: Option<String>,

    /// Sequence number of the last applied reload. Completions carrying an
    /// older ticket are discarded (see the controller's ordering guard).
    pub revision: u64,
}

impl ListState {
    /// `true` while the very first load is in flight and there is nothing to
    /// show yet: the "render a full spinner" case, as opposed to reloading
    /// behind an already-visible list.
    #[must_use]
    pub fn is_initial_load(&self) -> bool {
        self.phase == LoadPhase::Loading && self.books.is_empty() && self.revision == 0
    }

    /// `true` when the most recent applied reload failed.
    #[must_use]
    pub fn has_failed(&self) -> bool {
        self.phase == LoadPhase::Failed
    }
}
