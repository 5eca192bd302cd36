//! Shelfsync: the client-side synchronization engine of a book-catalog app.
//!
//! Shelfsync keeps per-screen book lists consistent with a remote catalog
//! service. It provides:
//! - Debounced query dispatch (search text, filter chips, sort preference)
//! - Authoritative snapshot reloads guarded against out-of-order completions
//! - Cross-screen invalidation over an explicit publish/subscribe channel
//! - Mutation wrappers that refetch instead of patching local state
//! - An in-memory store adapter mirroring the service for tests and demos

#![allow(clippy::multiple_crate_versions)]

//!
//! # Architecture
//!
//! The crate follows a layered architecture pattern:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │  Host Application (screens, navigation, dialogs)    │  ← out of scope
//! └─────────────────────────────────────────────────────┘
//!        │ lifecycle + input              ▲ watches state
//! ┌─────────────────────────────────────────────────────┐
//! │  Sync Layer (sync/)                                 │  ← per-screen controller
//! │  - Reload triggers: mount, focus, debounce,         │
//! │    invalidation, pull-to-refresh                    │
//! │  - Ordering guard over in-flight reloads            │
//! │  - Mutation wrappers (reload + publish on success)  │
//! └─────────────────────────────────────────────────────┘
//!         │                                │
//! ┌───────────────────┐          ┌───────────────────┐
//! │ Events (events/)  │          │ Remote (remote/)  │
//! │ - Pub/sub channel │          │ - BookStore port  │
//! │ - Subscriptions   │          │ - HTTP adapter    │
//! │ - Origin tags     │          │ - Memory adapter  │
//! └───────────────────┘          └───────────────────┘
//!         │                                │
//! ┌─────────────────────────────────────────────────────┐
//! │  Domain Layer (domain/)                             │
//! │  - Book, Note, drafts, patches, stats               │
//! │  - Query state and wire parameters                  │
//! │  - Error taxonomy                                   │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`domain`]: Core data model, query building, error types
//! - [`events`]: Cross-screen invalidation channel
//! - [`remote`]: Book store port with HTTP and in-memory adapters
//! - [`sync`]: Per-screen controllers and observable list state
//! - [`observability`]: Tracing subscriber setup
//!
//! # Getting Started
//!
//! ```no_run
//! use shelfsync::{Config, SyncEngine};
//!
//! # async fn run() -> shelfsync::Result<()> {
//! let config = Config::default();
//! shelfsync::observability::init_tracing(&config);
//!
//! let engine = SyncEngine::new(config)?;
//! let list = engine.controller();
//!
//! // screen mounts: subscribe to invalidations and perform the initial load
//! list.activate().await;
//!
//! // user types in the search box; the fetch fires once typing goes quiet
//! list.update_query(|q| q.text = "tolkien".to_string());
//!
//! // pull-to-refresh reloads immediately behind its own indicator
//! list.refresh().await;
//!
//! for book in &list.state().books {
//!     println!("{} by {}", book.name, book.author);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Key Design Decisions
//!
//! ## Authoritative Snapshots
//!
//! The engine never patches the cached list after a mutation. Every change
//! goes to the service first and is followed by a full refetch, so the list
//! is always a complete, server-ordered snapshot. What this costs in round
//! trips it saves in reconciliation logic: there is none.
//!
//! ## Ordered Reloads Without Locks
//!
//! Overlapping reloads are allowed; each carries a monotonically increasing
//! ticket and completions older than the last applied one are dropped. A slow
//! debounced fetch cannot clobber a refresh that finished after it.
//!
//! ## Explicit Event Channel
//!
//! Invalidation uses an injected [`events::EventChannel`] value rather than a
//! process-wide registry. Tests build as many isolated channels as they need,
//! and nothing subscribes implicitly.
//!
//! # Concurrency
//!
//! Controllers run on tokio: debounce timers and invalidation listeners are
//! spawned tasks, list state is observed through a `watch` channel, and no
//! lock is held across an await point. In-flight requests are never
//! cancelled; newer completions simply win.

pub mod domain;
pub mod events;
pub mod observability;
pub mod remote;
pub mod sync;

pub use domain::{
    Book, BookDraft, BookPatch, BookQuery, Filter, LibraryStats, Note, QueryState, Result,
    SortField, SortOrder, SyncError,
};
pub use events::{ChangeNotice, EventChannel, Subscription, COLLECTION_CHANGED};
pub use remote::{BookStore, HttpBookStore, MemoryBookStore};
pub use sync::{AlertSink, ListState, LoadPhase, SyncController, TracingAlerts};

use std::sync::Arc;

/// Engine configuration.
///
/// Loaded from a TOML file or built in code; every field has a default so a
/// partial file (or none at all) works.
///
/// # Example
///
/// ```toml
/// # shelfsync.toml
/// base_url = "http://192.168.1.25:3000"
/// request_timeout_secs = 10
/// debounce_ms = 400
/// trace_level = "debug"
/// ```
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Config {
    /// Origin of the remote book service.
    ///
    /// Default: `http://127.0.0.1:3000`, the development service address.
    pub base_url: String,

    /// Per-request timeout in seconds. Default: 10
    pub request_timeout_secs: u64,

    /// Quiet interval for debounced query changes, in milliseconds.
    ///
    /// A reload fires only once no further query change arrives within this
    /// window. Default: 400
    pub debounce_ms: u64,

    /// Tracing level for the default subscriber.
    ///
    /// Options: `trace`, `debug`, `info`, `warn`, `error`. Default: `"info"`
    pub trace_level: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:3000".to_string(),
            request_timeout_secs: 10,
            debounce_ms: 400,
            trace_level: None,
        }
    }
}

impl Config {
    /// Loads configuration from a TOML file.
    ///
    /// Missing keys fall back to their defaults; unknown keys are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Config`] if the file cannot be read or parsed.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use shelfsync::Config;
    ///
    /// let config = Config::from_file("shelfsync.toml")?;
    /// assert_eq!(config.debounce_ms, 400);
    /// # Ok::<(), shelfsync::SyncError>(())
    /// ```
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            SyncError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        let config = toml::from_str(&contents)
            .map_err(|e| SyncError::Config(format!("failed to parse {}: {e}", path.display())))?;
        tracing::debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }
}

/// Composition root: one shared store, one shared invalidation channel, and
/// as many per-screen controllers as the host asks for.
///
/// The engine is the host's single wiring point. Every controller it hands
/// out shares the same [`EventChannel`], which is what makes a mutation on
/// one screen resynchronize all the others.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use shelfsync::{Config, MemoryBookStore, SyncEngine};
///
/// // An engine over the in-memory adapter, as a demo host would build it.
/// let engine = SyncEngine::with_store(Config::default(), Arc::new(MemoryBookStore::new()));
/// let list_screen = engine.controller();
/// let detail_screen = engine.controller();
/// assert_ne!(list_screen.id(), detail_screen.id());
/// ```
pub struct SyncEngine {
    store: Arc<dyn BookStore>,
    events: EventChannel,
    alerts: Arc<dyn AlertSink>,
    config: Config,
}

impl SyncEngine {
    /// Builds an engine over the HTTP store with tracing-backed alerts.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: Config) -> Result<Self> {
        let store = Arc::new(HttpBookStore::new(&config)?);
        Ok(Self::with_store(config, store))
    }

    /// Builds an engine over a caller-provided store.
    #[must_use]
    pub fn with_store(config: Config, store: Arc<dyn BookStore>) -> Self {
        tracing::debug!(base_url = %config.base_url, "sync engine initialized");
        Self {
            store,
            events: EventChannel::new(),
            alerts: Arc::new(TracingAlerts),
            config,
        }
    }

    /// Replaces the alert sink, returning the engine for chaining.
    #[must_use]
    pub fn with_alert_sink(mut self, alerts: Arc<dyn AlertSink>) -> Self {
        self.alerts = alerts;
        self
    }

    /// Creates a controller for one screen instance.
    #[must_use]
    pub fn controller(&self) -> SyncController {
        SyncController::new(
            Arc::clone(&self.store),
            self.events.clone(),
            Arc::clone(&self.alerts),
            &self.config,
        )
    }

    /// The shared invalidation channel.
    #[must_use]
    pub fn events(&self) -> EventChannel {
        self.events.clone()
    }

    /// The shared store.
    #[must_use]
    pub fn store(&self) -> Arc<dyn BookStore> {
        Arc::clone(&self.store)
    }

    /// The engine configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }
}
