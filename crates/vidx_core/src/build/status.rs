//! Build outcomes and engine errors.

use super::error_codes;
use crate::event_log::ExecutionStatus;
use std::io;
use thiserror::Error;

/// Error raised by the index-building engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("code {code}: {message}")]
pub struct EngineError {
    /// Engine error code.
    pub code: i32,
    /// Human-readable message.
    pub message: String,
}

impl EngineError {
    /// Creates an engine error.
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// The part to build on no longer exists.
    pub fn part_not_found(part_name: &str) -> Self {
        Self::new(
            error_codes::NOT_FOUND_EXPECTED_DATA_PART,
            format!("part {part_name} not found"),
        )
    }

    /// The segment being built already exists.
    pub fn already_exists(part_name: &str, index_name: &str) -> Self {
        Self::new(
            error_codes::VECTOR_INDEX_ALREADY_EXISTS,
            format!("vector index {index_name} already exists on part {part_name}"),
        )
    }

    /// Adapts an I/O error.
    #[must_use]
    pub fn from_io(err: &io::Error) -> Self {
        Self::new(error_codes::STD_EXCEPTION, err.to_string())
    }

    /// Adapts any other error.
    #[must_use]
    pub fn from_std(err: &(dyn std::error::Error + 'static)) -> Self {
        if let Some(engine) = err.downcast_ref::<EngineError>() {
            return engine.clone();
        }
        if let Some(io) = err.downcast_ref::<io::Error>() {
            return Self::from_io(io);
        }
        Self::new(error_codes::STD_EXCEPTION, err.to_string())
    }

    /// Origin of the error code.
    #[must_use]
    pub const fn category(&self) -> error_codes::ErrorCategory {
        error_codes::classify(self.code)
    }
}

impl From<io::Error> for EngineError {
    fn from(err: io::Error) -> Self {
        Self::from_io(&err)
    }
}

/// Outcome of a build step.
///
/// Expected outcomes are values here, not errors: a part merged away or an
/// index built by a concurrent task is part of normal operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildStatus {
    /// The step completed.
    Success,
    /// The segment already exists; nothing to do.
    Skipped,
    /// The part no longer exists.
    NoDataPart {
        /// Engine message.
        message: String,
    },
    /// The step failed.
    Failed {
        /// Engine error code.
        code: i32,
        /// Engine message.
        message: String,
    },
}

impl BuildStatus {
    /// Returns true for [`BuildStatus::Success`].
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Error code of the outcome, `0` unless it is an error.
    #[must_use]
    pub const fn code(&self) -> i32 {
        match self {
            Self::Success | Self::Skipped => 0,
            Self::NoDataPart { .. } => error_codes::NOT_FOUND_EXPECTED_DATA_PART,
            Self::Failed { code, .. } => *code,
        }
    }
}

impl From<&EngineError> for BuildStatus {
    fn from(err: &EngineError) -> Self {
        match err.code {
            error_codes::NOT_FOUND_EXPECTED_DATA_PART => Self::NoDataPart {
                message: err.message.clone(),
            },
            error_codes::VECTOR_INDEX_ALREADY_EXISTS => Self::Skipped,
            code => Self::Failed {
                code,
                message: err.message.clone(),
            },
        }
    }
}

impl From<&BuildStatus> for ExecutionStatus {
    fn from(status: &BuildStatus) -> Self {
        match status {
            BuildStatus::Success | BuildStatus::Skipped => Self::ok(),
            BuildStatus::NoDataPart { message } => Self::error(status.code(), message.clone()),
            BuildStatus::Failed { code, message } => Self::error(*code, message.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::error_codes::ErrorCategory;

    #[test]
    fn engine_codes_map_to_status() {
        assert_eq!(
            BuildStatus::from(&EngineError::part_not_found("all_1_1_0")),
            BuildStatus::NoDataPart {
                message: "part all_1_1_0 not found".to_string()
            }
        );
        assert_eq!(
            BuildStatus::from(&EngineError::already_exists("all_1_1_0", "idx")),
            BuildStatus::Skipped
        );
        assert_eq!(
            BuildStatus::from(&EngineError::new(error_codes::LOGICAL_ERROR, "bad state")),
            BuildStatus::Failed {
                code: 49,
                message: "bad state".to_string()
            }
        );
    }

    #[test]
    fn adapters_use_runtime_code() {
        let io = io::Error::new(io::ErrorKind::Other, "disk full");
        let err = EngineError::from_io(&io);
        assert_eq!(err.code, error_codes::STD_EXCEPTION);
        assert_eq!(err.category(), ErrorCategory::GenericRuntime);

        let parse = "x".parse::<u32>().unwrap_err();
        let adapted = EngineError::from_std(&parse);
        assert_eq!(adapted.code, error_codes::STD_EXCEPTION);
        assert_eq!(adapted.message, parse.to_string());
        assert_eq!(
            BuildStatus::from(&adapted),
            BuildStatus::Failed {
                code: error_codes::STD_EXCEPTION,
                message: parse.to_string()
            }
        );

        let engine = EngineError::new(665, "exists");
        assert_eq!(EngineError::from_std(&engine), engine);
    }

    #[test]
    fn execution_status_from_build_status() {
        assert_eq!(ExecutionStatus::from(&BuildStatus::Skipped), ExecutionStatus::ok());
        let failed = BuildStatus::Failed {
            code: 1001,
            message: "oom".to_string(),
        };
        assert_eq!(ExecutionStatus::from(&failed), ExecutionStatus::error(1001, "oom"));
        let gone = BuildStatus::NoDataPart {
            message: "gone".to_string(),
        };
        assert_eq!(ExecutionStatus::from(&gone).code, 232);
    }
}
