//! Mail adapter error types

use thiserror::Error;

/// Result type for mail adapter operations
pub type MailResult<T> = std::result::Result<T, MailError>;

/// Errors raised by the mail client adapters
#[derive(Debug, Error)]
pub enum MailError {
    /// Failed to start or talk to the client process
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The client program is not installed
    #[error("'{0}' not found. Install it or set its path in the mail configuration.")]
    NotInstalled(String),

    /// The client has no account to send from
    #[error("No email accounts configured in {0}")]
    NoAccount(String),

    /// The client ran but reported a failure
    #[error("{program} exited with {status}: {stderr}")]
    Client {
        program: String,
        status: String,
        stderr: String,
    },

    /// Unexpected output from the client
    #[error("Unexpected response from {program}: {output}")]
    UnexpectedOutput { program: String, output: String },

    /// Recipient or header value that cannot be put in a message
    #[error("Invalid address '{0}'")]
    InvalidAddress(String),
}
