//! Synchronization layer: per-screen controllers and their observable state.
//!
//! This is where the temporal behavior lives; everything else in the crate
//! is either a data shape or an adapter. The controller decides *when* to
//! fetch (debounce, focus, invalidation, refresh), *what* to keep (the last
//! applied snapshot, guarded by reload tickets), and *who* to tell (the alert
//! sink on failure, the event channel after successful mutations).
//!
//! # Modules
//!
//! - `controller`: the [`SyncController`] state machine
//! - `state`: the [`ListState`] snapshot render collaborators watch
//! - `alerts`: the alert collaborator seam

pub mod alerts;
pub mod controller;
pub mod state;

pub use alerts::{AlertSink, RecordingAlerts, TracingAlerts};
pub use controller::SyncController;
pub use state::{ListState, LoadPhase};
