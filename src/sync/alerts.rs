//! Alert collaborator seam.
//!
//! The engine never renders; when something fails it hands a title and a
//! message to whatever the host installed here (a native alert dialog, a
//! toast, a log). The default sink just records the alert in the trace
//! stream, which is what headless hosts and tests usually want.

use std::sync::{Mutex, PoisonError};

/// Receives user-facing failure notifications.
///
/// Implementations must not block: alerts are raised from async tasks.
pub trait AlertSink: Send + Sync {
    /// Surfaces a failure to the user.
    fn alert(&self, title: &str, message: &str);
}

/// Default sink logging alerts at warn level instead of displaying them.
#[derive(Debug, Default)]
pub struct TracingAlerts;

impl AlertSink for TracingAlerts {
    fn alert(&self, title: &str, message: &str) {
        tracing::warn!(title, message, "user alert");
    }
}

/// Sink capturing alerts for inspection, used by tests.
#[derive(Debug, Default)]
pub struct RecordingAlerts {
    alerts: Mutex<Vec<(String, String)>>,
}

impl RecordingAlerts {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded `(title, message)` pairs, oldest first.
    #[must_use]
    pub fn recorded(&self) -> Vec<(String, String)> {
        self.alerts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of alerts recorded so far.
    #[must_use]
    pub fn count(&self) -> usize {
        self.alerts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl AlertSink for RecordingAlerts {
    fn alert(&self, title: &str, message: &str) {
        self.alerts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((title.to_string(), message.to_string()));
    }
}
