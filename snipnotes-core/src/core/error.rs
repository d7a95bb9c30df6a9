//! Error types for the Snipnotes core library.

use serde::Serialize;
use thiserror::Error;

/// All errors that can occur within the Snipnotes core library.
#[derive(Debug, Error)]
pub enum SnipnotesError {
    /// The note table could not be read (network, auth or storage failure).
    #[error("Connection error: {0}")]
    Connection(String),

    /// A single insert, update or delete was rejected by the gateway.
    #[error("Write error: {0}")]
    Write(String),

    /// A note ID was requested that does not exist.
    #[error("Note not found: {0}")]
    NoteNotFound(String),

    /// Another write touching this note is still outstanding.
    #[error("Write already in flight for note: {0}")]
    InFlight(String),

    /// A value failed validation before reaching the gateway.
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    /// The settings file or gateway configuration is unusable.
    #[error("Invalid settings: {0}")]
    Settings(String),

    /// An I/O operation on the filesystem failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Row or settings data could not be (de)serialized as JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The HTTP client failed before a response could be classified.
    #[cfg(feature = "remote")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Convenience alias that pins the error type to [`SnipnotesError`].
pub type Result<T> = std::result::Result<T, SnipnotesError>;

/// The three failure classes the presentation layer distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    /// Loading failed; the tree is unavailable until a retry succeeds.
    Connection,
    /// A mutation failed; prior state stays interactive.
    Write,
    /// The target vanished between read and write.
    NotFound,
}

impl ErrorKind {
    /// Returns `true` when the failure blocks the whole view.
    #[must_use]
    pub fn is_blocking(self) -> bool {
        matches!(self, Self::Connection)
    }
}

impl SnipnotesError {
    /// Classifies this error into the [`ErrorKind`] shown to the user.
    ///
    /// Anything that is not a read failure or a vanished target is reported
    /// as a write failure: the mutation was aborted and nothing changed locally.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Connection(_) => ErrorKind::Connection,
            Self::NoteNotFound(_) => ErrorKind::NotFound,
            _ => ErrorKind::Write,
        }
    }

    /// Returns a short, human-readable message suitable for display to the end user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Connection(e) => format!("Could not load notes: {e}"),
            Self::Write(e) => format!("Failed to save: {e}"),
            Self::NoteNotFound(_) => "Note no longer exists".to_string(),
            Self::InFlight(_) => "Still saving this note, try again in a moment".to_string(),
            Self::ValidationFailed(msg) => msg.clone(),
            Self::Settings(msg) => format!("Settings problem: {msg}"),
            Self::Io(e) => format!("File error: {e}"),
            Self::Json(e) => format!("Data format error: {e}"),
            #[cfg(feature = "remote")]
            Self::Http(e) => format!("Network error: {e}"),
        }
    }
}

/// The failure last recorded by a session, as observed by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LastError {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&SnipnotesError> for LastError {
    fn from(err: &SnipnotesError) -> Self {
        Self {
            kind: err.kind(),
            message: err.user_message(),
        }
    }
}
