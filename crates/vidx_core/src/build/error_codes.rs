//! Engine error codes understood by the build path.

/// Internal invariant violated.
pub const LOGICAL_ERROR: i32 = 49;

/// The part to build on no longer exists.
pub const NOT_FOUND_EXPECTED_DATA_PART: i32 = 232;

/// The segment being built already exists.
pub const VECTOR_INDEX_ALREADY_EXISTS: i32 = 665;

/// Generic runtime failure without an engine code.
pub const STD_EXCEPTION: i32 = 1001;

/// Failure of unknown origin.
pub const UNKNOWN_EXCEPTION: i32 = 1002;

/// Coarse origin of an error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Code raised by the engine itself.
    EngineInternal,
    /// Generic runtime failure adapted into an engine error.
    GenericRuntime,
    /// Failure of unknown origin.
    Unknown,
}

/// Classifies an error code by origin.
#[must_use]
pub const fn classify(code: i32) -> ErrorCategory {
    match code {
        STD_EXCEPTION => ErrorCategory::GenericRuntime,
        UNKNOWN_EXCEPTION => ErrorCategory::Unknown,
        c if c > 0 && c < STD_EXCEPTION => ErrorCategory::EngineInternal,
        _ => ErrorCategory::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_codes() {
        assert_eq!(classify(LOGICAL_ERROR), ErrorCategory::EngineInternal);
        assert_eq!(classify(NOT_FOUND_EXPECTED_DATA_PART), ErrorCategory::EngineInternal);
        assert_eq!(classify(VECTOR_INDEX_ALREADY_EXISTS), ErrorCategory::EngineInternal);
        assert_eq!(classify(STD_EXCEPTION), ErrorCategory::GenericRuntime);
        assert_eq!(classify(UNKNOWN_EXCEPTION), ErrorCategory::Unknown);
    }

    #[test]
    fn out_of_range_is_unknown() {
        assert_eq!(classify(0), ErrorCategory::Unknown);
        assert_eq!(classify(-1), ErrorCategory::Unknown);
        assert_eq!(classify(5000), ErrorCategory::Unknown);
    }
}
