//! Error types for Spool core.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in Spool core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] spool_storage::StorageError),

    /// CBOR codec error.
    #[error("codec error: {0}")]
    Codec(#[from] spool_codec::CodecError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The store directory does not exist and could not be created.
    #[error("directory unavailable: {}: {message}", path.display())]
    DirectoryUnavailable {
        /// The requested path.
        path: PathBuf,
        /// What went wrong.
        message: String,
    },

    /// Another process holds the directory lock.
    #[error("store locked: another process owns {}", path.display())]
    StoreLocked {
        /// The locked directory.
        path: PathBuf,
    },

    /// The executor has shut down; the operation did not run.
    #[error("store executor has stopped")]
    ExecutorStopped,

    /// Every sequence number has been handed out; no new entry can be saved.
    #[error("sequence numbers exhausted after {last}")]
    SequenceExhausted {
        /// The highest sequence in use.
        last: u64,
    },

    /// A bounded wait elapsed before the operation completed.
    #[error("timed out waiting for the store")]
    Timeout,

    /// Operation not permitted in current state.
    #[error("invalid operation: {message}")]
    InvalidOperation {
        /// Description of why operation is invalid.
        message: String,
    },
}

impl CoreError {
    /// Creates a directory unavailable error.
    pub fn directory_unavailable(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::DirectoryUnavailable {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }
}
