//! Vector-index event log.
//!
//! An append-only record of every lifecycle transition: definitions created
//! and dropped, builds started, finished, failed and canceled, loads and
//! unloads, and inherited segments cleared.
//!
//! The log is a diagnostic side channel. Emitting an event must never abort
//! the operation being described, so the context-based entry points swallow
//! every failure and report it through `tracing` instead.
//!
//! # Usage
//!
//! ```rust,ignore
//! use vidx_core::event_log::{self, EventType, ExecutionStatus};
//!
//! event_log::record_for_part(&ctx, &part, EventType::BuildStart, &ExecutionStatus::ok());
//! ```

mod sink;

pub use sink::{EventLogSink, JsonLinesEventLog, MemoryEventLog};

use crate::context::VectorIndexContext;
use crate::error::CoreResult;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;
use vidx_storage::DataPart;

const LOG_TARGET: &str = "vidx::event_log";

/// Column names of a tabular event log, in order.
pub const COLUMNS: [&str; 10] = [
    "database",
    "table",
    "part_name",
    "partition_id",
    "event_type",
    "event_date",
    "event_time",
    "event_time_microseconds",
    "error",
    "exception",
];

/// Kind of lifecycle transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    /// Index definition added to a table.
    DefinitionCreated,
    /// Index definition removed from a table.
    DefinitionDropped,
    /// Index definition rejected.
    DefinitionError,
    /// Build of a segment started.
    BuildStart,
    /// Build of a segment finished.
    BuildSucceed,
    /// Build of a segment failed.
    BuildError,
    /// Build of a segment canceled by the scheduler.
    BuildCanceled,
    /// Load of a segment into the cache started.
    LoadStart,
    /// Load of a segment finished.
    LoadSucceed,
    /// Load of a segment canceled.
    LoadCanceled,
    /// Load of a segment failed without an error to report.
    LoadFailed,
    /// Load of a segment failed with an error.
    LoadError,
    /// Segment evicted from the cache.
    Unload,
    /// Segment scheduled for eviction.
    WillUnload,
    /// Inherited segments and row-id maps cleared from a part.
    Cleared,
}

impl EventType {
    /// Every event type, in enum order.
    pub const ALL: [EventType; 15] = [
        Self::DefinitionCreated,
        Self::DefinitionDropped,
        Self::DefinitionError,
        Self::BuildStart,
        Self::BuildSucceed,
        Self::BuildError,
        Self::BuildCanceled,
        Self::LoadStart,
        Self::LoadSucceed,
        Self::LoadCanceled,
        Self::LoadFailed,
        Self::LoadError,
        Self::Unload,
        Self::WillUnload,
        Self::Cleared,
    ];

    /// Name of the event type as stored in the log.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DefinitionCreated => "DefinitionCreated",
            Self::DefinitionDropped => "DefinitionDropped",
            Self::DefinitionError => "DefinitionError",
            Self::BuildStart => "BuildStart",
            Self::BuildSucceed => "BuildSucceed",
            Self::BuildError => "BuildError",
            Self::BuildCanceled => "BuildCanceled",
            Self::LoadStart => "LoadStart",
            Self::LoadSucceed => "LoadSucceed",
            Self::LoadCanceled => "LoadCanceled",
            Self::LoadFailed => "LoadFailed",
            Self::LoadError => "LoadError",
            Self::Unload => "Unload",
            Self::WillUnload => "WillUnload",
            Self::Cleared => "Cleared",
        }
    }

    /// Returns true for event types that carry an error.
    #[must_use]
    pub const fn is_error(self) -> bool {
        matches!(
            self,
            Self::DefinitionError | Self::BuildError | Self::LoadFailed | Self::LoadError
        )
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error code and message attached to an event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionStatus {
    /// Error code, `0` for success.
    pub code: i32,
    /// Error message, empty for success.
    pub message: String,
}

impl ExecutionStatus {
    /// Status of a non-error event.
    #[must_use]
    pub fn ok() -> Self {
        Self::default()
    }

    /// Status carrying an error.
    pub fn error(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// One row of the event log.
///
/// Field order is the column order of a tabular sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventLogRecord {
    /// Database of the table.
    pub database: String,
    /// Table name.
    pub table: String,
    /// Part the event concerns.
    pub part_name: String,
    /// Partition of the part.
    pub partition_id: String,
    /// Kind of transition.
    pub event_type: EventType,
    /// Days since the Unix epoch, derived from `event_time`.
    pub event_date: u16,
    /// Seconds since the Unix epoch.
    pub event_time: u64,
    /// Microseconds since the Unix epoch, from the same instant as `event_time`.
    pub event_time_microseconds: u64,
    /// Error code, `0` for non-error events.
    pub error: u16,
    /// Error message, empty for non-error events.
    pub exception: String,
}

impl EventLogRecord {
    /// Builds a record stamped with `instant`.
    ///
    /// Both timestamps are derived from the one instant, so truncating
    /// `event_time_microseconds` to seconds always yields `event_time`.
    #[must_use]
    pub fn at(
        instant: SystemTime,
        database: &str,
        table: &str,
        part_name: &str,
        partition_id: &str,
        event_type: EventType,
        status: &ExecutionStatus,
    ) -> Self {
        let micros = instant
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_micros();
        let micros = u64::try_from(micros).unwrap_or(u64::MAX);
        let seconds = micros / 1_000_000;

        Self {
            database: database.to_string(),
            table: table.to_string(),
            part_name: part_name.to_string(),
            partition_id: partition_id.to_string(),
            event_type,
            event_date: u16::try_from(seconds / 86_400).unwrap_or(u16::MAX),
            event_time: seconds,
            event_time_microseconds: micros,
            // Saturates instead of wrapping: a code above u16::MAX must not
            // alias a smaller, unrelated code.
            error: u16::try_from(status.code.max(0)).unwrap_or(u16::MAX),
            exception: status.message.clone(),
        }
    }
}

/// Appends one event to `sink`, stamped with the current time.
///
/// # Errors
///
/// Returns the sink's error. Callers outside this module should prefer the
/// context-based entry points, which never fail.
pub fn record(
    sink: &dyn EventLogSink,
    database: &str,
    table: &str,
    part_name: &str,
    partition_id: &str,
    event_type: EventType,
    status: &ExecutionStatus,
) -> CoreResult<()> {
    let record = EventLogRecord::at(
        SystemTime::now(),
        database,
        table,
        part_name,
        partition_id,
        event_type,
        status,
    );
    sink.add(record)
}

fn report_failure(result: CoreResult<()>, event_type: EventType) {
    if let Err(e) = result {
        tracing::warn!(
            target: LOG_TARGET,
            event = %event_type,
            error = %e,
            "failed to append vector index event"
        );
    }
}

/// Appends one event to the context's sink. No-op if the sink is unbound.
pub fn record_in_context(
    ctx: &VectorIndexContext,
    database: &str,
    table: &str,
    part_name: &str,
    partition_id: &str,
    event_type: EventType,
    status: &ExecutionStatus,
) {
    let Some(sink) = ctx.event_log() else {
        return;
    };
    report_failure(
        record(
            sink.as_ref(),
            database,
            table,
            part_name,
            partition_id,
            event_type,
            status,
        ),
        event_type,
    );
}

/// Appends one event about `part`, taking database and table from the part.
pub fn record_for_part(
    ctx: &VectorIndexContext,
    part: &dyn DataPart,
    event_type: EventType,
    status: &ExecutionStatus,
) {
    let table = part.table();
    record_in_context(
        ctx,
        &table.database,
        &table.table,
        part.name(),
        &part.partition_id(),
        event_type,
        status,
    );
}

/// Appends one event about a table known only by its uuid.
///
/// Nothing is logged if the uuid does not currently resolve: the table may
/// have been dropped concurrently.
pub fn record_for_table_uuid(
    ctx: &VectorIndexContext,
    table_uuid: &str,
    part_name: &str,
    partition_id: &str,
    event_type: EventType,
    status: &ExecutionStatus,
) {
    if ctx.event_log().is_none() {
        return;
    }

    let uuid = match Uuid::parse_str(table_uuid) {
        Ok(uuid) => uuid,
        Err(_) => {
            report_failure(
                Err(crate::error::CoreError::invalid_table_id(table_uuid)),
                event_type,
            );
            return;
        }
    };

    let Some((database, table)) = ctx.catalog().and_then(|c| c.resolve(&uuid)) else {
        tracing::debug!(
            target: LOG_TARGET,
            table_uuid,
            "table no longer resolves, event dropped"
        );
        return;
    };

    record_in_context(
        ctx,
        &database,
        &table,
        part_name,
        partition_id,
        event_type,
        status,
    );
}
