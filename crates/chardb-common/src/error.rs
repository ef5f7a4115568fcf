//! Error taxonomy shared by every chardb crate.
//!
//! `Connection` and `Migration` are startup failures the caller is expected
//! to abort on. `Persistence` and `NotFound` are ordinary per-operation
//! results the caller may retry, report, or ignore.

/// Common error type for chardb.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The storage engine could not be opened or a connection checked out.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The on-disk schema could not be converged with the declared one.
    #[error("Migration error: {0}")]
    Migration(String),

    /// A write was rejected (constraint violation or engine failure).
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// No matching, non-deleted row exists.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input was provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// An I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// An internal error occurred.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new Connection error.
    pub fn connection<S: Into<String>>(msg: S) -> Self {
        Self::Connection(msg.into())
    }

    /// Create a new Migration error.
    pub fn migration<S: Into<String>>(msg: S) -> Self {
        Self::Migration(msg.into())
    }

    /// Create a new Persistence error.
    pub fn persistence<S: Into<String>>(msg: S) -> Self {
        Self::Persistence(msg.into())
    }

    /// Create a new NotFound error.
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a new InvalidInput error.
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a new Internal error.
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether this error must abort startup rather than be handled per call.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Migration(_))
    }

    /// Whether this error is a missing-row result.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Internal(format!("JSON error: {e}"))
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;
