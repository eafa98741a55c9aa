//! # vidx Core
//!
//! Lifecycle of secondary vector indexes attached to immutable storage parts.
//!
//! This crate provides:
//! - Segment identity: what a built index "is" on disk and in cache
//! - Merge migration: relocating and purging inherited segments
//! - Build tasks: a typed prepare/execute state machine
//! - The vector-index event log
//!
//! The ANN algorithm, the part scheduler and the segment cache itself are
//! external; they are reached through the [`IndexBuilder`], [`DataPart`]
//! and [`SegmentCache`] traits.
//!
//! [`DataPart`]: vidx_storage::DataPart

#![deny(unsafe_code)]
#![warn(missing_docs)]

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod build;
pub mod cache;
mod catalog;
mod config;
mod context;
mod error;
pub mod event_log;
pub mod migration;
pub mod segment;

pub use build::{BuildState, BuildStatus, BuildTask, EngineError, ErrorCategory, IndexBuilder};
pub use cache::{CacheStats, InMemorySegmentCache, SegmentCache};
pub use catalog::{MemoryCatalog, TableCatalog};
pub use config::VectorIndexConfig;
pub use context::VectorIndexContext;
pub use error::{CoreError, CoreResult};
pub use event_log::{
    EventLogRecord, EventLogSink, EventType, ExecutionStatus, JsonLinesEventLog, MemoryEventLog,
};
pub use migration::{
    MergeMigrator, PurgeReport, RelocationFailure, RelocationReport, VerificationReport,
};
pub use segment::{CacheKey, Provenance, SegmentId};
