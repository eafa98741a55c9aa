//! # vidx Testkit
//!
//! Test utilities for vidx.
//!
//! This crate provides:
//! - Temporary tables with a bound engine context and event log
//! - A fake index builder writing real segment files
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust,ignore
//! use vidx_testkit::prelude::*;
//!
//! #[test]
//! fn builds_once() {
//!     let t = TestTable::new();
//!     t.part("all_1_1_0");
//!     assert_eq!(t.build("all_1_1_0", &t.index()), BuildStatus::Success);
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use vidx_core::{BuildStatus, EventType};
}

pub use fixtures::*;
pub use generators::*;
