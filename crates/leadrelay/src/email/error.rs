//! Mailbox error types.

use thiserror::Error;

use super::session::ConnectionState;

#[derive(Error, Debug)]
pub enum EmailError {
    #[error("IMAP connection failed: {0}")]
    ConnectionFailed(String),

    #[error("TLS error: {0}")]
    TlsError(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("IMAP protocol error: {0}")]
    ProtocolError(String),

    /// The fetched bytes are not a MIME message.
    #[error("Failed to parse email: {0}")]
    ParseError(String),

    #[error("IMAP folder '{0}' could not be opened: {1}")]
    FolderNotFound(String, String),

    /// The session refused an operation in its current state.
    #[error("Operation '{operation}' not allowed while {state}")]
    InvalidState {
        operation: &'static str,
        state: ConnectionState,
    },
}

impl From<async_native_tls::Error> for EmailError {
    fn from(err: async_native_tls::Error) -> Self {
        EmailError::TlsError(err.to_string())
    }
}

impl From<async_imap::error::Error> for EmailError {
    fn from(err: async_imap::error::Error) -> Self {
        EmailError::ProtocolError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, EmailError>;
