//! Error types for the synchronization engine.
//!
//! This module defines the centralized error type [`SyncError`] and a type alias
//! [`Result`] for convenient error handling throughout the crate. All errors are
//! implemented using the `thiserror` crate for automatic `Error` trait implementation.

use thiserror::Error;

/// The main error type for synchronization operations.
///
/// This enum consolidates the failure modes of talking to the remote book
/// service, split along the boundary that matters to callers: whether a
/// response was received at all, whether the service rejected the request,
/// and whether a successful response could be understood.
///
/// # Examples
///
/// ```
/// use shelfsync::domain::SyncError;
///
/// fn rejected() -> Result<(), SyncError> {
///     Err(SyncError::Remote {
///         status: 404,
///         message: "book not found".to_string(),
///     })
/// }
/// ```
#[derive(Debug, Error)]
pub enum SyncError {
    /// No response was received from the remote service.
    ///
    /// Covers connect failures, timeouts, and transport-level errors. The
    /// string contains a description of what went wrong; the request may or
    /// may not have reached the service.
    #[error("Network error: {0}")]
    Network(String),

    /// The remote service answered with a non-success status.
    ///
    /// Carries the HTTP status and the human-readable message extracted from
    /// the response body (`error` or `message` field), or a per-operation
    /// fallback when the body carries neither.
    #[error("Remote error ({status}): {message}")]
    Remote {
        /// HTTP status code of the rejected request.
        status: u16,
        /// Message extracted from the error body, or the operation fallback.
        message: String,
    },

    /// A successful response could not be decoded into the expected shape.
    ///
    /// The string contains the deserialization failure description.
    #[error("Decode error: {0}")]
    Decode(String),

    /// Configuration is invalid or missing.
    ///
    /// Occurs when the configuration file cannot be read or parsed.
    /// The string describes the specific configuration problem.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl SyncError {
    /// Returns the user-facing message for this error.
    ///
    /// This is what the alert collaborator shows: the extracted remote
    /// message for [`SyncError::Remote`], the full display form otherwise.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Remote { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

/// A specialized `Result` type for synchronization operations.
///
/// This is a type alias for `std::result::Result<T, SyncError>` that simplifies
/// function signatures throughout the codebase.
///
/// # Examples
///
/// ```
/// use shelfsync::domain::Result;
///
/// fn refresh() -> Result<()> {
///     Ok(())
/// }
/// ```
pub type Result<T> = std::result::Result<T, SyncError>;
