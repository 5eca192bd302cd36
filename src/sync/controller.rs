//! Per-screen synchronization controller.
//!
//! One [`SyncController`] instance backs one screen showing (or mutating) the
//! catalog. It owns that screen's [`ListState`], drives reloads from the five
//! triggers (activation, focus regain, debounced query change, invalidation
//! event, pull-to-refresh), and wraps every mutation so that success always
//! ends in an authoritative refetch plus a cross-screen invalidation event.
//!
//! # Ordering
//!
//! Reloads are never serialized against each other; instead each one carries
//! a monotonically increasing ticket, and a completion whose ticket is older
//! than the last applied one is discarded. A slow response can therefore
//! never overwrite the result of a newer reload that already landed.
//!
//! # Lifecycle
//!
//! `activate` subscribes to the invalidation channel and performs the initial
//! load; `deactivate` (or dropping every handle) removes the subscription and
//! stops the background tasks, so a dismissed screen can never be reloaded by
//! someone else's mutation.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::domain::error::Result;
use crate::domain::{Book, BookDraft, BookPatch, Note, QueryState};
use crate::events::{ChangeNotice, EventChannel, Subscription, COLLECTION_CHANGED};
use crate::remote::BookStore;
use crate::sync::alerts::AlertSink;
use crate::sync::state::{ListState, LoadPhase};
use crate::Config;

/// Title used for every alert raised by the controller.
const ALERT_TITLE: &str = "Error";

fn next_controller_id() -> u64 {
    static NEXT: AtomicU64 = AtomicU64::new(1);
    NEXT.fetch_add(1, Ordering::Relaxed)
}

/// Background work owned by a controller.
struct Tasks {
    /// Pending quiet-window timer; replaced on every query change.
    debounce: Option<JoinHandle<()>>,
    /// Task draining invalidation signals into reloads.
    listener: Option<JoinHandle<()>>,
    /// Registration on the invalidation channel.
    subscription: Option<Subscription>,
}

struct Inner {
    id: u64,
    store: Arc<dyn BookStore>,
    events: EventChannel,
    alerts: Arc<dyn AlertSink>,
    quiet_interval: Duration,
    query: Mutex<QueryState>,
    state: watch::Sender<ListState>,
    next_ticket: AtomicU64,
    active: AtomicBool,
    tasks: Mutex<Tasks>,
}

impl Inner {
    fn lock_query(&self) -> MutexGuard<'_, QueryState> {
        self.query.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_tasks(&self) -> MutexGuard<'_, Tasks> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        // the Subscription cancels itself on drop; timers are aborted so no
        // detached task outlives the last controller handle
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = tasks.debounce.take() {
            handle.abort();
        }
        if let Some(handle) = tasks.listener.take() {
            handle.abort();
        }
    }
}

/// Synchronization controller for one screen instance.
///
/// Cheap to clone; clones share the same state, query, and lifecycle. Hand a
/// clone to whatever task needs to trigger reloads or mutations.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use shelfsync::events::EventChannel;
/// use shelfsync::remote::HttpBookStore;
/// use shelfsync::sync::{SyncController, TracingAlerts};
/// use shelfsync::Config;
///
/// # async fn demo() -> shelfsync::domain::Result<()> {
/// let config = Config::default();
/// let store = Arc::new(HttpBookStore::new(&config)?);
/// let channel = EventChannel::new();
///
/// let controller = SyncController::new(store, channel, Arc::new(TracingAlerts), &config);
/// let mut state = controller.watch_state();
///
/// controller.activate().await;
/// state.changed().await.ok();
/// println!("{} books", state.borrow().books.len());
/// # Ok(())
/// # }
/// ```
pub struct SyncController {
    inner: Arc<Inner>,
}

impl Clone for SyncController {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl std::fmt::Debug for SyncController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncController")
            .field("id", &self.inner.id)
            .field("active", &self.inner.active.load(Ordering::SeqCst))
            .finish()
    }
}

impl SyncController {
    /// Creates an idle controller.
    ///
    /// Nothing is fetched and nothing is subscribed until [`activate`] runs.
    /// The quiet interval for debounced query changes comes from
    /// `config.debounce_ms`.
    ///
    /// [`activate`]: SyncController::activate
    #[must_use]
    pub fn new(
        store: Arc<dyn BookStore>,
        events: EventChannel,
        alerts: Arc<dyn AlertSink>,
        config: &Config,
    ) -> Self {
        let (state, _) = watch::channel(ListState::default());
        let id = next_controller_id();
        tracing::debug!(id, quiet_ms = config.debounce_ms, "controller created");
        Self {
            inner: Arc::new(Inner {
                id,
                store,
                events,
                alerts,
                quiet_interval: Duration::from_millis(config.debounce_ms),
                query: Mutex::new(QueryState::default()),
                state,
                next_ticket: AtomicU64::new(0),
                active: AtomicBool::new(false),
                tasks: Mutex::new(Tasks {
                    debounce: None,
                    listener: None,
                    subscription: None,
                }),
            }),
        }
    }

    /// Instance id, also used as the origin tag on published events.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Returns a watch handle on the list state.
    ///
    /// The receiver sees every state transition, including indicator flips.
    #[must_use]
    pub fn watch_state(&self) -> watch::Receiver<ListState> {
        self.inner.state.subscribe()
    }

    /// Current list state snapshot.
    #[must_use]
    pub fn state(&self) -> ListState {
        self.inner.state.borrow().clone()
    }

    /// Current query state snapshot.
    #[must_use]
    pub fn query(&self) -> QueryState {
        self.inner.lock_query().clone()
    }

    /// Activates the controller: subscribes to invalidation events and
    /// performs the initial load.
    ///
    /// Idempotent: a second call while active only logs. The subscription is
    /// registered before the initial fetch so a mutation racing the mount is
    /// never missed.
    pub async fn activate(&self) {
        if self.inner.active.swap(true, Ordering::SeqCst) {
            tracing::debug!(id = self.inner.id, "activate called while already active");
            return;
        }

        let (signal_tx, mut signal_rx) = mpsc::unbounded_channel::<()>();
        let own_id = self.inner.id;
        let subscription = self
            .inner
            .events
            .subscribe(COLLECTION_CHANGED, move |notice: &ChangeNotice| {
                if notice.origin == Some(own_id) {
                    // own mutation; the mutation path already reloaded
                    return;
                }
                let _ = signal_tx.send(());
            });

        // The listener holds only a weak handle: a forgotten deactivate must
        // not keep the controller alive through its own background task.
        let weak = Arc::downgrade(&self.inner);
        let listener = tokio::spawn(async move {
            while signal_rx.recv().await.is_some() {
                let Some(inner) = weak.upgrade() else { break };
                let controller = SyncController { inner };
                tracing::debug!(id = controller.inner.id, "invalidation event received");
                controller.reload(false).await;
            }
        });

        {
            let mut tasks = self.inner.lock_tasks();
            tasks.subscription = Some(subscription);
            tasks.listener = Some(listener);
        }

        tracing::debug!(id = self.inner.id, "controller activated");
        self.reload(false).await;
    }

    /// Deactivates the controller: removes the invalidation subscription and
    /// stops the background tasks.
    ///
    /// Idempotent. The list state is left as-is so a re-activated screen can
    /// render the previous snapshot while its fresh load runs.
    pub fn deactivate(&self) {
        if !self.inner.active.swap(false, Ordering::SeqCst) {
            return;
        }

        let (subscription, listener, debounce) = {
            let mut tasks = self.inner.lock_tasks();
            (
                tasks.subscription.take(),
                tasks.listener.take(),
                tasks.debounce.take(),
            )
        };
        if let Some(subscription) = subscription {
            subscription.cancel();
        }
        if let Some(handle) = debounce {
            handle.abort();
        }
        if let Some(handle) = listener {
            handle.abort();
        }
        tracing::debug!(id = self.inner.id, "controller deactivated");
    }

    /// Reload trigger for a screen regaining focus.
    ///
    /// Always refetches, discarding any staleness accumulated while the
    /// screen was backgrounded.
    pub async fn focus_regained(&self) {
        tracing::debug!(id = self.inner.id, "focus regained");
        self.reload(false).await;
    }

    /// Reload trigger for an explicit pull-to-refresh gesture.
    ///
    /// Reloads immediately and raises the `refreshing` indicator instead of
    /// the loading phase, so the visible list stays in place.
    pub async fn refresh(&self) {
        self.reload(true).await;
    }

    /// Mutates the query state and restarts the debounce window.
    ///
    /// The new state is visible immediately via [`query`]; the reload fires
    /// only once no further change arrives within the quiet interval. Must be
    /// called from within the runtime that drives the controller.
    ///
    /// [`query`]: SyncController::query
    pub fn update_query<F>(&self, mutate: F)
    where
        F: FnOnce(&mut QueryState),
    {
        {
            let mut query = self.inner.lock_query();
            mutate(&mut query);
            tracing::debug!(id = self.inner.id, query = ?*query, "query updated");
        }
        self.schedule_debounced_reload();
    }

    fn schedule_debounced_reload(&self) {
        let mut tasks = self.inner.lock_tasks();
        if let Some(pending) = tasks.debounce.take() {
            // a change during the quiet window restarts the timer
            pending.abort();
        }

        let quiet = self.inner.quiet_interval;
        let weak = Arc::downgrade(&self.inner);
        tasks.debounce = Some(tokio::spawn(async move {
            tokio::time::sleep(quiet).await;
            let Some(inner) = weak.upgrade() else { return };
            // Hand the reload to its own task: aborting a later timer must
            // never cancel a fetch that was already issued.
            tokio::spawn(async move {
                SyncController { inner }.reload(false).await;
            });
        }));
    }

    /// Fetches the list for the current query and applies it under the
    /// ordering guard.
    ///
    /// Never returns an error: failures are stored in the state and sent to
    /// the alert sink. The indicator raised at the start (loading phase or
    /// `refreshing` flag) is cleared on every completion path.
    ///
    /// A completion whose ticket is older than the last applied revision is
    /// discarded entirely (no state change, no alert) because a newer reload
    /// has already superseded it.
    pub async fn reload(&self, use_refresh_indicator: bool) {
        let ticket = self.inner.next_ticket.fetch_add(1, Ordering::Relaxed) + 1;
        let query = self.inner.lock_query().to_query();

        tracing::debug!(
            id = self.inner.id,
            ticket,
            refresh = use_refresh_indicator,
            "reload started"
        );

        self.inner.state.send_modify(|state| {
            if use_refresh_indicator {
                state.refreshing = true;
            } else {
                state.phase = LoadPhase::Loading;
            }
            state.last_error = None;
        });

        let result = self.inner.store.list_books(&query).await;

        let mut alert_message = None;
        let controller_id = self.inner.id;
        self.inner.state.send_modify(|state| {
            // guaranteed cleanup: the refresh indicator drops no matter what
            if use_refresh_indicator {
                state.refreshing = false;
            }

            if ticket <= state.revision {
                tracing::debug!(
                    id = controller_id,
                    ticket,
                    revision = state.revision,
                    "discarding stale reload completion"
                );
                return;
            }
            state.revision = ticket;

            match result {
                Ok(books) => {
                    tracing::debug!(
                        id = controller_id,
                        ticket,
                        count = books.len(),
                        "reload applied"
                    );
                    state.books = books;
                    state.phase = LoadPhase::Ready;
                }
                Err(error) => {
                    tracing::warn!(id = controller_id, ticket, error = %error, "reload failed");
                    let message = error.user_message();
                    state.phase = LoadPhase::Failed;
                    state.last_error = Some(message.clone());
                    alert_message = Some(message);
                }
            }
        });

        if let Some(message) = alert_message {
            self.inner.alerts.alert(ALERT_TITLE, &message);
        }
    }

    /// Marks a book read or unread by inverting the flag the caller saw.
    ///
    /// The current value is not re-fetched first, so a toggle racing another
    /// client's concurrent toggle can flip the wrong direction; the follow-up
    /// reload converges both screens on whatever the service decided.
    ///
    /// # Errors
    ///
    /// Propagates the store failure after surfacing it to the alert sink.
    /// On failure nothing is reloaded and no event is published.
    pub async fn toggle_read(&self, book: &Book) -> Result<Book> {
        let patch = BookPatch {
            read: Some(!book.read),
            ..BookPatch::default()
        };
        self.run_mutation("toggle_read", self.inner.store.update_book(&book.id, &patch))
            .await
    }

    /// Marks a book as favorite or not by inverting the flag the caller saw.
    ///
    /// Same race caveat as [`toggle_read`](SyncController::toggle_read).
    ///
    /// # Errors
    ///
    /// Propagates the store failure after surfacing it to the alert sink.
    pub async fn toggle_favorite(&self, book: &Book) -> Result<Book> {
        let patch = BookPatch {
            favorite: Some(!book.favorite),
            ..BookPatch::default()
        };
        self.run_mutation(
            "toggle_favorite",
            self.inner.store.update_book(&book.id, &patch),
        )
        .await
    }

    /// Sets a book's rating.
    ///
    /// # Errors
    ///
    /// Propagates the store failure after surfacing it to the alert sink.
    pub async fn set_rating(&self, id: &str, rating: u8) -> Result<Book> {
        let patch = BookPatch {
            rating: Some(rating),
            ..BookPatch::default()
        };
        self.run_mutation("set_rating", self.inner.store.update_book(id, &patch))
            .await
    }

    /// Deletes a book.
    ///
    /// # Errors
    ///
    /// Propagates the store failure after surfacing it to the alert sink.
    /// On failure the cached list is untouched and no event is published.
    pub async fn delete_book(&self, id: &str) -> Result<()> {
        self.run_mutation("delete_book", self.inner.store.delete_book(id))
            .await
    }

    /// Creates a book from a draft.
    ///
    /// # Errors
    ///
    /// Propagates the store failure after surfacing it to the alert sink.
    pub async fn create_book(&self, draft: &BookDraft) -> Result<Book> {
        self.run_mutation("create_book", self.inner.store.create_book(draft))
            .await
    }

    /// Applies a partial update to a book.
    ///
    /// # Errors
    ///
    /// Propagates the store failure after surfacing it to the alert sink.
    pub async fn update_book(&self, id: &str, patch: &BookPatch) -> Result<Book> {
        self.run_mutation("update_book", self.inner.store.update_book(id, patch))
            .await
    }

    /// Attaches a note to a book and returns that book's refreshed notes.
    ///
    /// Notes do not change the book list, so this performs the narrower
    /// refetch of one book's notes instead of a full reload, and publishes
    /// nothing.
    ///
    /// # Errors
    ///
    /// Propagates either store failure (create or refetch) after surfacing it
    /// to the alert sink.
    pub async fn add_note(&self, book_id: &str, content: &str) -> Result<Vec<Note>> {
        let result = async {
            self.inner.store.create_note(book_id, content).await?;
            self.inner.store.list_notes(book_id).await
        }
        .await;

        match result {
            Ok(notes) => {
                tracing::debug!(id = self.inner.id, book_id, count = notes.len(), "note added");
                Ok(notes)
            }
            Err(error) => {
                tracing::warn!(id = self.inner.id, book_id, error = %error, "add note failed");
                self.inner.alerts.alert(ALERT_TITLE, &error.user_message());
                Err(error)
            }
        }
    }

    /// Common mutation path: remote call, then on success an authoritative
    /// reload followed by the cross-screen invalidation event. Failures alert
    /// and propagate without reloading or publishing.
    async fn run_mutation<T, F>(&self, operation: &'static str, call: F) -> Result<T>
    where
        F: std::future::Future<Output = Result<T>>,
    {
        match call.await {
            Ok(value) => {
                tracing::debug!(id = self.inner.id, operation, "mutation succeeded, resynchronizing");
                self.reload(false).await;
                self.inner
                    .events
                    .publish(COLLECTION_CHANGED, &ChangeNotice::from_origin(self.inner.id));
                Ok(value)
            }
            Err(error) => {
                tracing::warn!(id = self.inner.id, operation, error = %error, "mutation failed");
                self.inner.alerts.alert(ALERT_TITLE, &error.user_message());
                Err(error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Filter, SortField, SyncError};
    use crate::remote::MemoryBookStore;
    use crate::sync::alerts::RecordingAlerts;

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

    fn seeded_store() -> Arc<MemoryBookStore> {
        Arc::new(MemoryBookStore::with_books(vec![
            book("1", "The Hobbit", "J.R.R. Tolkien", true, true),
            book("2", "Dune", "Frank Herbert", false, false),
            book("3", "The Silmarillion", "J.R.R. Tolkien", false, true),
        ]))
    }

    fn screen(
        store: &Arc<MemoryBookStore>,
        events: &EventChannel,
    ) -> (SyncController, Arc<RecordingAlerts>) {
        let alerts = Arc::new(RecordingAlerts::new());
        let controller = SyncController::new(
            Arc::clone(store) as _,
            events.clone(),
            Arc::clone(&alerts) as _,
            &Config::default(),
        );
        (controller, alerts)
    }

    /// Lets spawned listener tasks and the reloads they trigger run to
    /// completion. No timers are involved in those paths, so a handful of
    /// scheduler turns is enough.
    async fn settle() {
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn activation_subscribes_and_performs_the_initial_load() {
        let store = seeded_store();
        let events = EventChannel::new();
        let (controller, alerts) = screen(&store, &events);

        assert_eq!(controller.state().phase, LoadPhase::Idle);
        controller.activate().await;

        let state = controller.state();
        assert_eq!(state.phase, LoadPhase::Ready);
        assert_eq!(state.books.len(), 3);
        assert_eq!(state.revision, 1);
        assert_eq!(store.list_count(), 1);
        assert_eq!(events.subscriber_count(COLLECTION_CHANGED), 1);
        assert_eq!(alerts.count(), 0);
    }

    #[tokio::test]
    async fn repeated_activation_does_not_stack_loads_or_subscriptions() {
        let store = seeded_store();
        let events = EventChannel::new();
        let (controller, _alerts) = screen(&store, &events);

        controller.activate().await;
        controller.activate().await;

        assert_eq!(store.list_count(), 1);
        assert_eq!(events.subscriber_count(COLLECTION_CHANGED), 1);
    }

    #[tokio::test]
    async fn focus_regain_refetches_unconditionally() {
        let store = seeded_store();
        let events = EventChannel::new();
        let (controller, _alerts) = screen(&store, &events);
        controller.activate().await;

        store.insert(book("4", "Emma", "Jane Austen", false, false));
        controller.focus_regained().await;

        assert_eq!(store.list_count(), 2);
        assert_eq!(controller.state().books.len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_keeps_the_list_visible_behind_its_own_indicator() {
        let store = seeded_store();
        let events = EventChannel::new();
        let (controller, _alerts) = screen(&store, &events);
        controller.activate().await;

        store.delay_next(Duration::from_millis(50));
        let refresh = tokio::spawn({
            let controller = controller.clone();
            async move { controller.refresh().await }
        });
        tokio::task::yield_now().await;

        // mid-flight: the list and its Ready phase stay on screen
        let mid = controller.state();
        assert!(mid.refreshing);
        assert_eq!(mid.phase, LoadPhase::Ready);
        assert_eq!(mid.books.len(), 3);

        refresh.await.unwrap();
        let done = controller.state();
        assert!(!done.refreshing);
        assert_eq!(done.phase, LoadPhase::Ready);
    }

    #[tokio::test]
    async fn failed_reload_keeps_the_previous_snapshot_and_alerts() {
        let store = seeded_store();
        let events = EventChannel::new();
        let (controller, alerts) = screen(&store, &events);
        controller.activate().await;

        store.fail_next(SyncError::Network("connection refused".to_string()));
        controller.focus_regained().await;

        let state = controller.state();
        assert_eq!(state.phase, LoadPhase::Failed);
        assert_eq!(state.books.len(), 3);
        assert_eq!(
            state.last_error.as_deref(),
            Some("Network error: connection refused")
        );
        assert_eq!(
            alerts.recorded(),
            vec![(
                "Error".to_string(),
                "Network error: connection refused".to_string()
            )]
        );

        // the next successful reload clears the failure
        controller.focus_regained().await;
        let state = controller.state();
        assert_eq!(state.phase, LoadPhase::Ready);
        assert!(state.last_error.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn query_changes_collapse_into_one_trailing_reload() {
        let store = seeded_store();
        let events = EventChannel::new();
        let (controller, _alerts) = screen(&store, &events);
        controller.activate().await;
        assert_eq!(store.list_count(), 1);

        controller.update_query(|q| q.text = "to".to_string());
        assert_eq!(controller.query().text, "to"); // visible before the fetch

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(store.list_count(), 1); // quiet window still open

        controller.update_query(|q| q.text = "tol".to_string());
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(store.list_count(), 1); // window restarted by the change

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(store.list_count(), 2);
        assert_eq!(
            store.requests().last().map(String::as_str),
            Some("GET /books?q=tol")
        );
        let state = controller.state();
        let names: Vec<&str> = state.books.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["The Hobbit", "The Silmarillion"]);
    }

    #[tokio::test(start_paused = true)]
    async fn filter_and_sort_changes_share_the_debounce_path() {
        let store = seeded_store();
        let events = EventChannel::new();
        let (controller, _alerts) = screen(&store, &events);
        controller.activate().await;

        controller.update_query(|q| {
            q.filter = Filter::Favorite;
            q.sort_field = Some(SortField::Name);
        });
        tokio::time::sleep(Duration::from_millis(450)).await;

        assert_eq!(store.list_count(), 2);
        assert_eq!(
            store.requests().last().map(String::as_str),
            Some("GET /books?favorite=true&sort=name&order=asc")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn slow_completion_cannot_clobber_a_newer_one() {
        let store = seeded_store();
        let events = EventChannel::new();
        let (controller, alerts) = screen(&store, &events);
        controller.activate().await;

        // a reload whose response is slow in transit: it computes a 3-book
        // snapshot now and delivers it 200ms later
        store.delay_next(Duration::from_millis(200));
        let slow = tokio::spawn({
            let controller = controller.clone();
            async move { controller.focus_regained().await }
        });
        settle().await;

        // the dataset changes and a faster reload delivers it first
        store.insert(book("4", "Emma", "Jane Austen", false, false));
        controller.refresh().await;
        assert_eq!(controller.state().books.len(), 4);
        let applied_revision = controller.state().revision;

        slow.await.unwrap();
        let state = controller.state();
        assert_eq!(state.books.len(), 4, "stale snapshot must be discarded");
        assert_eq!(state.revision, applied_revision);
        assert_eq!(state.phase, LoadPhase::Ready);
        assert!(state.last_error.is_none());
        assert_eq!(alerts.count(), 0);
    }

    #[tokio::test]
    async fn toggles_write_the_inverted_flag_then_resync_every_screen() {
        let store = seeded_store();
        let events = EventChannel::new();
        let (list, _list_alerts) = screen(&store, &events);
        let (detail, _detail_alerts) = screen(&store, &events);
        list.activate().await;
        detail.activate().await;
        store.clear_requests();

        let dune = list.state().books[1].clone();
        assert!(!dune.read);
        let updated = list.toggle_read(&dune).await.unwrap();
        assert!(updated.read);
        settle().await;

        // one PUT, one reload for the originator, one for the other screen
        assert!(store
            .requests()
            .contains(&r#"PUT /books/2 {"read":true}"#.to_string()));
        assert_eq!(store.list_count(), 2);
        assert!(list.state().books[1].read);
        assert!(detail.state().books[1].read);
    }

    #[tokio::test]
    async fn delete_on_one_screen_reloads_the_others() {
        let store = seeded_store();
        let events = EventChannel::new();
        let (list, _list_alerts) = screen(&store, &events);
        let (detail, _detail_alerts) = screen(&store, &events);
        list.activate().await;
        detail.activate().await;
        store.clear_requests();

        list.delete_book("3").await.unwrap();
        settle().await;

        let state = detail.state();
        let remaining: Vec<&str> = state.books.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(remaining, vec!["1", "2"]);
        assert_eq!(store.list_count(), 2);
    }

    #[tokio::test]
    async fn mutations_publish_with_their_own_origin() {
        let store = seeded_store();
        let events = EventChannel::new();
        let (controller, _alerts) = screen(&store, &events);
        controller.activate().await;

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _probe = events.subscribe(COLLECTION_CHANGED, move |notice: &ChangeNotice| {
            sink.lock().unwrap().push(notice.clone());
        });

        let hobbit = controller.state().books[0].clone();
        controller.toggle_favorite(&hobbit).await.unwrap();

        let notices = seen.lock().unwrap().clone();
        assert_eq!(notices, vec![ChangeNotice::from_origin(controller.id())]);
    }

    #[tokio::test]
    async fn failed_mutation_neither_reloads_nor_publishes() {
        let store = seeded_store();
        let events = EventChannel::new();
        let (list, list_alerts) = screen(&store, &events);
        let (detail, _detail_alerts) = screen(&store, &events);
        list.activate().await;
        detail.activate().await;
        store.clear_requests();

        store.fail_next(SyncError::Remote {
            status: 500,
            message: "boom".to_string(),
        });
        let err = list.delete_book("1").await.unwrap_err();
        assert!(matches!(err, SyncError::Remote { status: 500, .. }));
        settle().await;

        assert_eq!(store.list_count(), 0);
        assert_eq!(list.state().books.len(), 3);
        assert_eq!(detail.state().books.len(), 3);
        assert_eq!(
            list_alerts.recorded(),
            vec![("Error".to_string(), "boom".to_string())]
        );
    }

    #[tokio::test]
    async fn create_and_rate_flow_through_the_same_resync_path() {
        let store = seeded_store();
        let events = EventChannel::new();
        let (controller, _alerts) = screen(&store, &events);
        controller.activate().await;

        let created = controller
            .create_book(&BookDraft::new("Emma", "Jane Austen", "John Murray", 1815))
            .await
            .unwrap();
        assert_eq!(controller.state().books.len(), 4);

        let rated = controller.set_rating(&created.id, 5).await.unwrap();
        assert_eq!(rated.rating, Some(5));
        assert!(store
            .requests()
            .contains(&format!(r#"PUT /books/{} {{"rating":5}}"#, created.id)));
    }

    #[tokio::test]
    async fn add_note_refetches_notes_without_reloading_the_list() {
        let store = seeded_store();
        let events = EventChannel::new();
        let (controller, _alerts) = screen(&store, &events);
        controller.activate().await;
        store.clear_requests();

        let seen = Arc::new(Mutex::new(0usize));
        let sink = Arc::clone(&seen);
        let _probe = events.subscribe(COLLECTION_CHANGED, move |_| {
            *sink.lock().unwrap() += 1;
        });

        let notes = controller.add_note("2", "slow start, worth it").await.unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].content, "slow start, worth it");

        assert_eq!(
            store.requests(),
            vec![
                "POST /books/2/notes".to_string(),
                "GET /books/2/notes".to_string(),
            ]
        );
        assert_eq!(store.list_count(), 0);
        assert_eq!(*seen.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn deactivated_screen_ignores_other_screens_mutations() {
        let store = seeded_store();
        let events = EventChannel::new();
        let (list, _list_alerts) = screen(&store, &events);
        let (detail, _detail_alerts) = screen(&store, &events);
        list.activate().await;
        detail.activate().await;
        assert_eq!(events.subscriber_count(COLLECTION_CHANGED), 2);

        detail.deactivate();
        assert_eq!(events.subscriber_count(COLLECTION_CHANGED), 1);
        store.clear_requests();

        list.delete_book("1").await.unwrap();
        settle().await;

        // only the originator reloaded; the dismissed screen kept its snapshot
        assert_eq!(store.list_count(), 1);
        assert_eq!(detail.state().books.len(), 3);
        assert_eq!(list.state().books.len(), 2);

        // reactivation resubscribes and loads fresh
        detail.activate().await;
        assert_eq!(events.subscriber_count(COLLECTION_CHANGED), 2);
        assert_eq!(detail.state().books.len(), 2);
    }

    #[tokio::test]
    async fn dropping_every_handle_tears_the_subscription_down() {
        let store = seeded_store();
        let events = EventChannel::new();
        let (controller, _alerts) = screen(&store, &events);
        controller.activate().await;
        assert_eq!(events.subscriber_count(COLLECTION_CHANGED), 1);

        drop(controller);
        assert_eq!(events.subscriber_count(COLLECTION_CHANGED), 0);
    }
}
