//! Build task for one `(part, index)` pair.

use super::error_codes;
use super::status::{BuildStatus, EngineError};
use crate::context::VectorIndexContext;
use crate::event_log::{self, EventType, ExecutionStatus};
use std::sync::Arc;
use vidx_storage::{IndexDefinition, PartInfo, TableMetadata};

const LOG_TARGET: &str = "vidx::build_task";

/// The index-building engine.
///
/// Failures are reported as [`EngineError`]s carrying engine codes; the task
/// turns them into [`BuildStatus`] values.
pub trait IndexBuilder: Send + Sync {
    /// Everything the build step needs, captured by the prepare step.
    type Context: Send;

    /// Captures the inputs of a build.
    ///
    /// # Errors
    ///
    /// Fails with `NOT_FOUND_EXPECTED_DATA_PART` if the part is gone and
    /// `VECTOR_INDEX_ALREADY_EXISTS` if the segment is already built.
    fn prepare_build_context(
        &self,
        metadata: &Arc<TableMetadata>,
        part_name: &str,
        index_name: &str,
        slow_mode: bool,
    ) -> Result<Self::Context, EngineError>;

    /// Builds the segment.
    ///
    /// # Errors
    ///
    /// Returns the engine error that stopped the build.
    fn build(&self, context: &Self::Context) -> Result<(), EngineError>;
}

/// Lifecycle state of a [`BuildTask`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildState {
    /// Not prepared yet.
    Created,
    /// Build context captured.
    Prepared,
    /// Prepare did not produce a context.
    PrepareFailed,
    /// Segment built.
    Succeeded,
    /// Segment already existed.
    Skipped,
    /// Build failed.
    Failed,
}

/// A unit of work building one segment.
///
/// Single-use: `prepare` then `execute`. Neither step panics nor returns an
/// error; every outcome is a [`BuildStatus`].
pub struct BuildTask<B: IndexBuilder> {
    builder: Arc<B>,
    context: Arc<VectorIndexContext>,
    part_name: String,
    index: IndexDefinition,
    metadata: Arc<TableMetadata>,
    slow_mode: bool,
    state: BuildState,
    build_context: Option<B::Context>,
    status: Option<BuildStatus>,
    canceled: bool,
}

impl<B: IndexBuilder> BuildTask<B> {
    /// Creates a task. Slow mode defaults to the context's configuration.
    pub fn new(
        builder: Arc<B>,
        context: Arc<VectorIndexContext>,
        part_name: impl Into<String>,
        index: IndexDefinition,
        metadata: Arc<TableMetadata>,
    ) -> Self {
        let slow_mode = context.config().slow_mode;
        Self {
            builder,
            context,
            part_name: part_name.into(),
            index,
            metadata,
            slow_mode,
            state: BuildState::Created,
            build_context: None,
            status: None,
            canceled: false,
        }
    }

    /// Overrides slow mode.
    #[must_use]
    pub fn with_slow_mode(mut self, slow_mode: bool) -> Self {
        self.slow_mode = slow_mode;
        self
    }

    /// Part the segment is built on.
    #[must_use]
    pub fn part_name(&self) -> &str {
        &self.part_name
    }

    /// Index being built.
    #[must_use]
    pub fn index(&self) -> &IndexDefinition {
        &self.index
    }

    /// Whether the build runs in slow mode.
    #[must_use]
    pub fn slow_mode(&self) -> bool {
        self.slow_mode
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> BuildState {
        self.state
    }

    /// Status of the last completed step, if any.
    #[must_use]
    pub fn status(&self) -> Option<&BuildStatus> {
        self.status.as_ref()
    }

    /// Returns true once [`BuildTask::cancel`] has been called.
    #[must_use]
    pub fn is_canceled(&self) -> bool {
        self.canceled
    }

    /// Captures the build context.
    ///
    /// A part that no longer exists yields [`BuildStatus::NoDataPart`], an
    /// already built segment [`BuildStatus::Skipped`], and any other engine
    /// error [`BuildStatus::Failed`] with the code and message unchanged.
    /// Only `Failed` is recorded as a `BuildError` event. Calling it again
    /// returns the first outcome.
    pub fn prepare(&mut self) -> BuildStatus {
        if let Some(status) = &self.status {
            return status.clone();
        }

        let status = match self.builder.prepare_build_context(
            &self.metadata,
            &self.part_name,
            &self.index.name,
            self.slow_mode,
        ) {
            Ok(build_context) => {
                self.build_context = Some(build_context);
                self.state = BuildState::Prepared;
                BuildStatus::Success
            }
            Err(e) => {
                tracing::error!(
                    target: LOG_TARGET,
                    part = %self.part_name,
                    index = %self.index.name,
                    code = e.code,
                    "prepare build vector index error: {}",
                    e.message
                );
                self.state = BuildState::PrepareFailed;
                let status = BuildStatus::from(&e);
                if matches!(status, BuildStatus::Failed { .. }) {
                    self.emit(EventType::BuildError, &ExecutionStatus::from(&status));
                }
                status
            }
        };

        self.status = Some(status.clone());
        status
    }

    /// Builds the segment from the prepared context.
    ///
    /// Emits `BuildStart`, then `BuildSucceed` or `BuildError`. Without a
    /// successful prepare the prepare outcome is returned and nothing runs;
    /// a canceled task returns [`BuildStatus::Skipped`] without running.
    pub fn execute(&mut self) -> BuildStatus {
        match self.state {
            BuildState::Prepared => {}
            BuildState::Created => {
                return BuildStatus::Failed {
                    code: error_codes::LOGICAL_ERROR,
                    message: format!("build task for part {} was not prepared", self.part_name),
                };
            }
            _ => {
                return self.status.clone().unwrap_or(BuildStatus::Skipped);
            }
        }

        if self.canceled {
            tracing::debug!(
                target: LOG_TARGET,
                part = %self.part_name,
                index = %self.index.name,
                "build canceled before start"
            );
            return BuildStatus::Skipped;
        }

        let Some(build_context) = self.build_context.take() else {
            return BuildStatus::Failed {
                code: error_codes::LOGICAL_ERROR,
                message: "prepared build task has no context".to_string(),
            };
        };

        self.emit(EventType::BuildStart, &ExecutionStatus::ok());
        tracing::info!(
            target: LOG_TARGET,
            part = %self.part_name,
            index = %self.index.name,
            slow_mode = self.slow_mode,
            "building vector index"
        );

        let status = match self.builder.build(&build_context) {
            Ok(()) => BuildStatus::Success,
            Err(e) => BuildStatus::from(&e),
        };

        match &status {
            BuildStatus::Success | BuildStatus::Skipped => {
                self.state = if status.is_success() {
                    BuildState::Succeeded
                } else {
                    BuildState::Skipped
                };
                self.emit(EventType::BuildSucceed, &ExecutionStatus::ok());
            }
            BuildStatus::NoDataPart { .. } | BuildStatus::Failed { .. } => {
                let exec = ExecutionStatus::from(&status);
                tracing::error!(
                    target: LOG_TARGET,
                    part = %self.part_name,
                    index = %self.index.name,
                    code = exec.code,
                    "build vector index error: {}",
                    exec.message
                );
                self.state = BuildState::Failed;
                self.emit(EventType::BuildError, &exec);
            }
        }

        self.status = Some(status.clone());
        status
    }

    /// Marks the task canceled and records a `BuildCanceled` event.
    ///
    /// A build already running is not interrupted. Once the build has
    /// finished, canceling does nothing.
    pub fn cancel(&mut self) {
        if self.canceled
            || matches!(
                self.state,
                BuildState::Succeeded | BuildState::Skipped | BuildState::Failed
            )
        {
            return;
        }
        self.canceled = true;
        self.emit(EventType::BuildCanceled, &ExecutionStatus::ok());
    }

    fn emit(&self, event_type: EventType, status: &ExecutionStatus) {
        event_log::record_in_context(
            &self.context,
            &self.metadata.database,
            &self.metadata.table,
            &self.part_name,
            &PartInfo::partition_of(&self.part_name),
            event_type,
            status,
        );
    }
}

impl<B: IndexBuilder> Drop for BuildTask<B> {
    fn drop(&mut self) {
        tracing::debug!(
            target: LOG_TARGET,
            part = %self.part_name,
            index = %self.index.name,
            "destroy vector index task"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::error_codes::{LOGICAL_ERROR, NOT_FOUND_EXPECTED_DATA_PART};
    use crate::cache::InMemorySegmentCache;
    use crate::config::VectorIndexConfig;
    use crate::event_log::MemoryEventLog;
    use parking_lot::Mutex;

    /// Builder whose prepare and build outcomes are scripted.
    struct ScriptedBuilder {
        prepare: Mutex<Option<EngineError>>,
        build: Mutex<Option<EngineError>>,
        builds: Mutex<u32>,
    }

    impl ScriptedBuilder {
        fn new(prepare: Option<EngineError>, build: Option<EngineError>) -> Arc<Self> {
            Arc::new(Self {
                prepare: Mutex::new(prepare),
                build: Mutex::new(build),
                builds: Mutex::new(0),
            })
        }
    }

    impl IndexBuilder for ScriptedBuilder {
        type Context = (String, bool);

        fn prepare_build_context(
            &self,
            _metadata: &Arc<TableMetadata>,
            part_name: &str,
            _index_name: &str,
            slow_mode: bool,
        ) -> Result<Self::Context, EngineError> {
            match self.prepare.lock().clone() {
                Some(e) => Err(e),
                None => Ok((part_name.to_string(), slow_mode)),
            }
        }

        fn build(&self, _context: &Self::Context) -> Result<(), EngineError> {
            *self.builds.lock() += 1;
            match self.build.lock().clone() {
                Some(e) => Err(e),
                None => Ok(()),
            }
        }
    }

    fn context(log: &Arc<MemoryEventLog>) -> Arc<VectorIndexContext> {
        Arc::new(
            VectorIndexContext::new(
                VectorIndexConfig::default(),
                Arc::new(InMemorySegmentCache::<()>::new()),
            )
            .unwrap()
            .with_event_log(log.clone()),
        )
    }

    fn task(builder: Arc<ScriptedBuilder>, log: &Arc<MemoryEventLog>) -> BuildTask<ScriptedBuilder> {
        BuildTask::new(
            builder,
            context(log),
            "all_1_1_0",
            IndexDefinition::new("idx", "vec"),
            Arc::new(TableMetadata::new("db", "items")),
        )
    }

    fn event_types(log: &MemoryEventLog) -> Vec<EventType> {
        log.records().iter().map(|r| r.event_type).collect()
    }

    #[test]
    fn prepare_and_execute() {
        let log = Arc::new(MemoryEventLog::new());
        let builder = ScriptedBuilder::new(None, None);
        let mut task = task(builder.clone(), &log);

        assert_eq!(task.prepare(), BuildStatus::Success);
        assert_eq!(task.state(), BuildState::Prepared);
        assert_eq!(task.execute(), BuildStatus::Success);
        assert_eq!(task.state(), BuildState::Succeeded);
        assert_eq!(*builder.builds.lock(), 1);

        assert_eq!(
            event_types(&log),
            vec![EventType::BuildStart, EventType::BuildSucceed]
        );
        let records = log.records();
        assert_eq!(records[0].database, "db");
        assert_eq!(records[0].table, "items");
        assert_eq!(records[0].partition_id, "all");
    }

    #[test]
    fn prepare_maps_engine_codes() {
        let log = Arc::new(MemoryEventLog::new());

        let mut gone = task(
            ScriptedBuilder::new(Some(EngineError::part_not_found("all_1_1_0")), None),
            &log,
        );
        assert!(matches!(gone.prepare(), BuildStatus::NoDataPart { .. }));
        assert_eq!(gone.state(), BuildState::PrepareFailed);

        let mut exists = task(
            ScriptedBuilder::new(Some(EngineError::already_exists("all_1_1_0", "idx")), None),
            &log,
        );
        assert_eq!(exists.prepare(), BuildStatus::Skipped);

        let mut broken = task(
            ScriptedBuilder::new(Some(EngineError::new(LOGICAL_ERROR, "broken")), None),
            &log,
        );
        assert_eq!(
            broken.prepare(),
            BuildStatus::Failed {
                code: LOGICAL_ERROR,
                message: "broken".to_string()
            }
        );

        let records = log.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].event_type, EventType::BuildError);
        assert_eq!(i32::from(records[0].error), LOGICAL_ERROR);
        assert_eq!(records[0].exception, "broken");
    }

    #[test]
    fn failed_prepare_is_logged_once() {
        let log = Arc::new(MemoryEventLog::new());
        let builder = ScriptedBuilder::new(Some(EngineError::new(1001, "out of memory")), None);
        let mut task = task(builder.clone(), &log);

        assert_eq!(task.prepare().code(), 1001);
        assert_eq!(task.prepare().code(), 1001);
        assert_eq!(task.execute().code(), 1001);
        assert_eq!(*builder.builds.lock(), 0);
        assert_eq!(event_types(&log), vec![EventType::BuildError]);
    }

    #[test]
    fn execute_after_failed_prepare_returns_prepare_status() {
        let log = Arc::new(MemoryEventLog::new());
        let builder = ScriptedBuilder::new(Some(EngineError::already_exists("all_1_1_0", "idx")), None);
        let mut task = task(builder.clone(), &log);

        assert_eq!(task.prepare(), BuildStatus::Skipped);
        assert_eq!(task.execute(), BuildStatus::Skipped);
        assert_eq!(*builder.builds.lock(), 0);
        assert!(log.is_empty());
    }

    #[test]
    fn execute_without_prepare_is_a_logic_error() {
        let log = Arc::new(MemoryEventLog::new());
        let mut task = task(ScriptedBuilder::new(None, None), &log);
        assert_eq!(task.execute().code(), LOGICAL_ERROR);
        assert_eq!(task.state(), BuildState::Created);
    }

    #[test]
    fn build_error_is_logged_with_code() {
        let log = Arc::new(MemoryEventLog::new());
        let builder = ScriptedBuilder::new(None, Some(EngineError::part_not_found("all_1_1_0")));
        let mut task = task(builder, &log);

        task.prepare();
        assert!(matches!(task.execute(), BuildStatus::NoDataPart { .. }));
        assert_eq!(task.state(), BuildState::Failed);

        let records = log.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].event_type, EventType::BuildError);
        assert_eq!(i32::from(records[1].error), NOT_FOUND_EXPECTED_DATA_PART);
        assert_eq!(records[1].exception, "part all_1_1_0 not found");
    }

    #[test]
    fn cancel_before_execute() {
        let log = Arc::new(MemoryEventLog::new());
        let builder = ScriptedBuilder::new(None, None);
        let mut task = task(builder.clone(), &log);

        task.prepare();
        task.cancel();
        task.cancel();
        assert!(task.is_canceled());
        assert_eq!(task.execute(), BuildStatus::Skipped);
        assert_eq!(*builder.builds.lock(), 0);
        assert_eq!(event_types(&log), vec![EventType::BuildCanceled]);
    }

    #[test]
    fn cancel_after_success_is_ignored() {
        let log = Arc::new(MemoryEventLog::new());
        let builder = ScriptedBuilder::new(None, None);
        let mut task = task(builder.clone(), &log);

        task.prepare();
        assert_eq!(task.execute(), BuildStatus::Success);
        task.cancel();

        assert!(!task.is_canceled());
        assert_eq!(task.state(), BuildState::Succeeded);
        assert_eq!(task.execute(), BuildStatus::Success);
        assert_eq!(*builder.builds.lock(), 1);
        assert_eq!(
            event_types(&log),
            vec![EventType::BuildStart, EventType::BuildSucceed]
        );
    }

    #[test]
    fn cancel_after_failed_build_is_ignored() {
        let log = Arc::new(MemoryEventLog::new());
        let builder = ScriptedBuilder::new(None, Some(EngineError::new(1001, "out of memory")));
        let mut task = task(builder, &log);

        task.prepare();
        assert_eq!(task.execute().code(), 1001);
        task.cancel();

        assert!(!task.is_canceled());
        assert_eq!(
            event_types(&log),
            vec![EventType::BuildStart, EventType::BuildError]
        );
    }

    #[test]
    fn slow_mode_follows_config_unless_overridden() {
        let log = Arc::new(MemoryEventLog::new());
        let ctx = Arc::new(
            VectorIndexContext::new(
                VectorIndexConfig::new().slow_mode(true),
                Arc::new(InMemorySegmentCache::<()>::new()),
            )
            .unwrap()
            .with_event_log(log.clone()),
        );
        let builder = ScriptedBuilder::new(None, None);
        let metadata = Arc::new(TableMetadata::new("db", "items"));
        let index = IndexDefinition::new("idx", "vec");

        let task = BuildTask::new(builder.clone(), ctx.clone(), "all_1_1_0", index.clone(), metadata.clone());
        assert!(task.slow_mode());

        let task = BuildTask::new(builder, ctx, "all_1_1_0", index, metadata).with_slow_mode(false);
        assert!(!task.slow_mode());
    }
}
