//! Error types for the bridge.
//!
//! Each layer has its own error enum so callers can tell the taxonomy apart:
//! transport failures force a reconnect, lookup misses are user-facing,
//! storage failures are operational, remote failures carry their cause.

use thiserror::Error;
use troet_proto::ProtocolError;

use crate::db::DbError;

// ============================================================================
// Transport Errors (IRC connection)
// ============================================================================

/// Errors that end an IRC connection.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid server name for TLS: {0}")]
    InvalidServerName(String),

    #[error("tls setup failed: {0}")]
    TlsSetup(#[from] tokio_rustls::rustls::Error),

    #[error("tls handshake failed: {0}")]
    Handshake(#[source] std::io::Error),

    #[error("connection closed by peer")]
    Closed,

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

// ============================================================================
// Store Errors (message id bridge)
// ============================================================================

/// Errors from storing or resolving message ids.
///
/// `NotFound` is a user mistake; `Unavailable` means the backing store is in
/// trouble.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no message with id {0}")]
    NotFound(String),

    #[error("message store unavailable: {0}")]
    Unavailable(#[from] DbError),
}

// ============================================================================
// Social Errors (Mastodon adapter)
// ============================================================================

/// Errors returned by the social adapter.
#[derive(Debug, Error)]
pub enum SocialError {
    /// Unknown shorthand, or the toot is gone remotely.
    #[error("No toot found with id {0}")]
    NotFound(String),

    #[error("storage failure: {0}")]
    Storage(#[from] DbError),

    /// Remote API failure; the message is the cause as reported.
    #[error("{0}")]
    Remote(String),

    /// The action is not allowed for this account.
    #[error("{0}")]
    Forbidden(String),

    /// A search came back empty.
    #[error("No toot found")]
    NoResults,
}

impl From<reqwest::Error> for SocialError {
    fn from(err: reqwest::Error) -> Self {
        SocialError::Remote(err.to_string())
    }
}

impl From<StoreError> for SocialError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => SocialError::NotFound(id),
            StoreError::Unavailable(db) => SocialError::Storage(db),
        }
    }
}
