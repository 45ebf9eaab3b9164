//! Transport layer error types.

use std::io;

use thiserror::Error;

/// Transport layer errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// I/O error on the underlying link.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    /// The channel to the link task is closed.
    #[error("transport channel closed")]
    ChannelClosed,

    /// The peer or the link went away.
    #[error("transport disconnected")]
    Disconnected,

    /// A chunk larger than the transport accepts was written.
    #[error("chunk of {len} bytes exceeds transport limit {limit}")]
    ChunkTooLarge {
        /// Chunk size.
        len: usize,
        /// Transport limit.
        limit: usize,
    },
}

impl TransportError {
    /// Check if the link is gone for good.
    pub fn is_disconnect(&self) -> bool {
        matches!(
            self,
            TransportError::ChannelClosed | TransportError::Disconnected
        )
    }
}

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;
