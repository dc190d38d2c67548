//! Error types for the protocol helpers.

use thiserror::Error;

/// Convenience type alias for Results using [`ProtocolError`].
pub type Result<T, E = ProtocolError> = std::result::Result<T, E>;

/// Protocol-level errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// The peer sent more bytes than the framer will hold without seeing a
    /// line terminator.
    #[error("unterminated line exceeds buffer limit ({buffered} > {limit} bytes)")]
    BufferOverflow {
        /// Bytes currently held back.
        buffered: usize,
        /// Configured limit.
        limit: usize,
    },
}
