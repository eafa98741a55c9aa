//! Building segments.
//!
//! A [`BuildTask`] drives one build through an external [`IndexBuilder`].
//! Engine errors cross the builder seam as [`EngineError`]s and leave the
//! task as [`BuildStatus`] values.
//!
//! ## Invariants
//!
//! - A task never panics and never returns an error
//! - Concurrent tasks for one `(part, index)` pair yield at most one
//!   `Success`; the builder reports the rest as already existing

pub mod error_codes;
mod status;
mod task;

pub use error_codes::ErrorCategory;
pub use status::{BuildStatus, EngineError};
pub use task::{BuildState, BuildTask, IndexBuilder};
