//! In-process publish/subscribe channel for cross-screen invalidation.
//!
//! The channel is an explicit value passed to whoever needs it; there is no
//! process-wide global. Clones are cheap and share one registry, so the host
//! creates a single channel at startup and hands a clone to every controller.
//!
//! Dispatch semantics:
//!
//! - handlers registered under an event name fire in registration order;
//! - `publish` iterates a snapshot of the registrations taken at call time,
//!   so subscribing or cancelling during a dispatch never affects that
//!   dispatch;
//! - a panicking handler is caught and logged, and the remaining handlers in
//!   the same dispatch still run;
//! - cancellation is idempotent and also happens when a [`Subscription`] is
//!   dropped.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

/// Event name published after a successful book mutation.
///
/// Subscribed controllers treat it as "the collection may have changed,
/// reload to find out".
pub const COLLECTION_CHANGED: &str = "books:changed";

/// Payload carried by an invalidation event.
///
/// The origin tag identifies the publishing controller instance, letting a
/// controller skip events it caused itself (its own mutation path already
/// reloads directly).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeNotice {
    /// Instance id of the publishing controller, `None` for host-initiated
    /// invalidations (e.g. after a data reset).
    pub origin: Option<u64>,
}

impl ChangeNotice {
    /// A notice originating from the given controller instance.
    #[must_use]
    pub fn from_origin(origin: u64) -> Self {
        Self {
            origin: Some(origin),
        }
    }
}

type Handler = Arc<dyn Fn(&ChangeNotice) + Send + Sync>;

struct Entry {
    id: u64,
    handler: Handler,
}

type Registry = HashMap<String, Vec<Entry>>;

struct Shared {
    registry: Mutex<Registry>,
    next_id: AtomicU64,
}

impl Shared {
    /// Locks the registry, recovering from poisoning.
    ///
    /// Handlers run outside the lock, so the only way to poison it is a panic
    /// in the allocator; continuing with the inner value is always safe here.
    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.registry
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

/// Handle to a registered handler; cancelling removes exactly that handler.
///
/// Cancellation is idempotent, and dropping the subscription cancels it, so a
/// screen that forgets an explicit `cancel` still cannot leak a dangling
/// handler past its own lifetime.
pub struct Subscription {
    shared: Weak<Shared>,
    event: String,
    id: u64,
    cancelled: AtomicBool,
}

impl Subscription {
    /// Removes the handler from the registry.
    ///
    /// Safe to call more than once; later calls are no-ops. A dispatch that
    /// already snapshotted this handler still completes with it.
    pub fn cancel(&self) {
        if self.cancelled.swap(true, Ordering::SeqCst) {
            return;
        }
        let Some(shared) = self.shared.upgrade() else {
            return;
        };
        let mut registry = shared.registry();
        if let Some(entries) = registry.get_mut(&self.event) {
            entries.retain(|entry| entry.id != self.id);
            if entries.is_empty() {
                registry.remove(&self.event);
            }
        }
        tracing::trace!(event = %self.event, id = self.id, "subscription cancelled");
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("event", &self.event)
            .field("id", &self.id)
            .field("cancelled", &self.cancelled.load(Ordering::SeqCst))
            .finish()
    }
}

/// Cheap-to-clone publish/subscribe channel keyed by event name.
///
/// # Examples
///
/// ```
/// use shelfsync::events::{ChangeNotice, EventChannel, COLLECTION_CHANGED};
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
///
/// let channel = EventChannel::new();
/// let hits = Arc::new(AtomicUsize::new(0));
///
/// let counter = Arc::clone(&hits);
/// let sub = channel.subscribe(COLLECTION_CHANGED, move |_| {
///     counter.fetch_add(1, Ordering::SeqCst);
/// });
///
/// channel.publish(COLLECTION_CHANGED, &ChangeNotice::default());
/// sub.cancel();
/// channel.publish(COLLECTION_CHANGED, &ChangeNotice::default());
///
/// assert_eq!(hits.load(Ordering::SeqCst), 1);
/// ```
pub struct EventChannel {
    shared: Arc<Shared>,
}

impl EventChannel {
    /// Creates an empty channel.
    #[must_use]
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                registry: Mutex::new(HashMap::new()),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Registers `handler` under `event` and returns its cancellation handle.
    ///
    /// Handlers are invoked synchronously on the publisher's task, in
    /// registration order, and must therefore not block. The controller's
    /// handler only forwards a signal into its own task.
    pub fn subscribe<F>(&self, event: &str, handler: F) -> Subscription
    where
        F: Fn(&ChangeNotice) + Send + Sync + 'static,
    {
        let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);
        self.shared
            .registry()
            .entry(event.to_string())
            .or_default()
            .push(Entry {
                id,
                handler: Arc::new(handler),
            });

        tracing::trace!(event, id, "handler subscribed");
        Subscription {
            shared: Arc::downgrade(&self.shared),
            event: event.to_string(),
            id,
            cancelled: AtomicBool::new(false),
        }
    }

    /// Synchronously invokes the handlers registered for `event`.
    ///
    /// Iterates a snapshot taken at call time; mutations to the subscriber
    /// set during dispatch affect only later publishes. A handler panic is
    /// caught, logged at warn level, and never propagated to the publisher.
    pub fn publish(&self, event: &str, notice: &ChangeNotice) {
        let snapshot: Vec<Handler> = self
            .shared
            .registry()
            .get(event)
            .map(|entries| entries.iter().map(|e| Arc::clone(&e.handler)).collect())
            .unwrap_or_default();

        tracing::debug!(event, handlers = snapshot.len(), origin = ?notice.origin, "publishing event");

        for handler in snapshot {
            if let Err(panic) = std::panic::catch_unwind(AssertUnwindSafe(|| handler(notice))) {
                let reason = panic
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "non-string panic payload".to_string());
                tracing::warn!(event, %reason, "event handler panicked during dispatch");
            }
        }
    }

    /// Number of handlers currently registered for `event`.
    ///
    /// Mostly useful to assert that deactivation cleaned up after itself.
    #[must_use]
    pub fn subscriber_count(&self, event: &str) -> usize {
        self.shared
            .registry()
            .get(event)
            .map_or(0, std::vec::Vec::len)
    }
}

impl Clone for EventChannel {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl Default for EventChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventChannel")
            .field("events", &self.shared.registry().len())
            .finish()
    }
}
