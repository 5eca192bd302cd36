//! Cross-screen invalidation events.
//!
//! One event matters to the engine: [`COLLECTION_CHANGED`], published after a
//! successful mutation so every other screen showing the catalog reloads.
//! The channel itself is generic over event names and deliberately small; see
//! [`channel`] for the dispatch semantics.
//!
//! # Modules
//!
//! - `channel`: the publish/subscribe registry and subscription handles

pub mod channel;

pub use channel::{ChangeNotice, EventChannel, Subscription, COLLECTION_CHANGED};
