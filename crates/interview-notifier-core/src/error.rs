//! Error types for interview-notifier-core

use thiserror::Error;

use crate::mapping::Field;

/// Boxed error coming from an adapter (mail client, table file).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in interview-notifier-core
#[derive(Debug, Error)]
pub enum Error {
    /// The mail client could not be reached or is not configured
    #[error("Mail client unavailable: {0}")]
    MailUnavailable(#[source] BoxError),

    /// A single message was rejected by the mail client
    #[error("Send failed: {0}")]
    SendFailed(#[source] BoxError),

    /// The table file could not be read, updated or saved
    #[error("Table store error: {0}")]
    Store(#[source] BoxError),

    /// Header name not present in the table
    #[error("Unknown header '{header}' for {field} column")]
    UnknownHeader { field: Field, header: String },

    /// Row index outside the table
    #[error("Row {0} out of bounds (rows: {1})")]
    RowOutOfBounds(usize, usize),

    /// IO error (activity log)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a new "other" error with a message
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Error::Other(msg.into())
    }

    /// Wrap an adapter error as a store failure
    pub fn store<E: Into<BoxError>>(err: E) -> Self {
        Error::Store(err.into())
    }

    /// Wrap an adapter error as a failed send
    pub fn send_failed<E: Into<BoxError>>(err: E) -> Self {
        Error::SendFailed(err.into())
    }

    /// Wrap an adapter error as an unreachable mail client
    pub fn mail_unavailable<E: Into<BoxError>>(err: E) -> Self {
        Error::MailUnavailable(err.into())
    }
}
