//! Error types for vidx core.

use std::io;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in vidx core operations.
///
/// These are faults (I/O, corruption, bad input). Expected outcomes such as
/// "part already merged away" or "index already built" are not errors; they
/// are reported as [`crate::BuildStatus`] values.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Storage layer error.
    #[error("storage error: {0}")]
    Storage(#[from] vidx_storage::StorageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Event log record could not be serialized or parsed.
    #[error("event log serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The event log sink rejected a record.
    #[error("event log error: {message}")]
    EventLog {
        /// Description of the failure.
        message: String,
    },

    /// A table identifier is not a valid UUID.
    #[error("invalid table uuid: {value}")]
    InvalidTableId {
        /// The rejected identifier.
        value: String,
    },

    /// Part is not stored on a local volume.
    #[error("part {name} is not stored on disk")]
    NotOnDisk {
        /// Name of the part.
        name: String,
    },

    /// Operation not permitted in current state.
    #[error("invalid operation: {message}")]
    InvalidOperation {
        /// Description of why operation is invalid.
        message: String,
    },
}

impl CoreError {
    /// Creates an event log error.
    pub fn event_log(message: impl Into<String>) -> Self {
        Self::EventLog {
            message: message.into(),
        }
    }

    /// Creates an invalid table id error.
    pub fn invalid_table_id(value: impl Into<String>) -> Self {
        Self::InvalidTableId {
            value: value.into(),
        }
    }

    /// Creates a not-on-disk error.
    pub fn not_on_disk(name: impl Into<String>) -> Self {
        Self::NotOnDisk { name: name.into() }
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }
}
