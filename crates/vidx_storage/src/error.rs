//! Error types for storage operations.

use std::io;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A manifest or metadata file is corrupted.
    #[error("storage corrupted: {0}")]
    Corrupted(String),

    /// A manifest could not be encoded.
    #[error("encode error: {0}")]
    Encode(String),

    /// The requested part does not exist.
    #[error("part not found: {name}")]
    PartNotFound {
        /// Name of the missing part.
        name: String,
    },

    /// A part with this name already exists.
    #[error("part already exists: {name}")]
    PartExists {
        /// Name of the existing part.
        name: String,
    },

    /// A file does not match its recorded checksum.
    #[error("checksum mismatch for {file}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// File name inside the part directory.
        file: String,
        /// Recorded digest.
        expected: String,
        /// Digest of the file on disk.
        actual: String,
    },
}

impl StorageError {
    /// Creates a corruption error.
    pub fn corrupted(message: impl Into<String>) -> Self {
        Self::Corrupted(message.into())
    }

    /// Creates a part-not-found error.
    pub fn part_not_found(name: impl Into<String>) -> Self {
        Self::PartNotFound { name: name.into() }
    }
}
