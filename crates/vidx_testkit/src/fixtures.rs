//! Test fixtures and table helpers.
//!
//! Provides a temporary table bound to an engine context, and a fake index
//! builder that writes real segment files so the lifecycle code has
//! something to resolve, relocate and purge.

use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use vidx_core::{
    BuildStatus, BuildTask, EngineError, EventType, InMemorySegmentCache, IndexBuilder,
    MemoryEventLog, MergeMigrator, VectorIndexConfig, VectorIndexContext,
};
use vidx_storage::{checksums, naming, DiskPart, IndexDefinition, TableDir, TableMetadata};

/// Contents of the description file the fake builder writes.
#[derive(Debug, Serialize)]
struct Description<'a> {
    index: &'a str,
    part: &'a str,
    slow_mode: bool,
}

/// Name of the data file the fake builder writes for `index_name`.
pub fn data_file_name(index_name: &str) -> String {
    format!("{index_name}-data{}", naming::INDEX_FILE_SUFFIX)
}

/// Writes a complete segment for `index_name` into `dir`: a data file, a
/// description file and a checksums file covering both.
pub fn write_segment_files(dir: &Path, part_name: &str, index_name: &str, slow_mode: bool) -> io::Result<()> {
    let data = data_file_name(index_name);
    fs::write(dir.join(&data), format!("vectors of {part_name}"))?;

    let description = naming::description_file_name(index_name);
    let body = serde_json::to_vec(&Description {
        index: index_name,
        part: part_name,
        slow_mode,
    })
    .map_err(io::Error::other)?;
    fs::write(dir.join(&description), body)?;

    let sums = checksums::compute(dir, &[data, description]).map_err(io::Error::other)?;
    checksums::write(&dir.join(naming::checksums_file_name(index_name)), &sums)
        .map_err(io::Error::other)
}

/// What the fake builder captures at prepare time.
#[derive(Debug, Clone)]
pub struct FakeBuildContext {
    /// Part directory.
    pub dir: PathBuf,
    /// Part name.
    pub part_name: String,
    /// Index name.
    pub index_name: String,
    /// Slow mode flag.
    pub slow_mode: bool,
}

/// An index builder that writes small but well-formed segment files.
///
/// Prepare claims the `(part, index)` pair, so concurrent tasks for one
/// pair see at most one success; the rest are told the index exists.
#[derive(Debug)]
pub struct FakeIndexBuilder {
    root: PathBuf,
    claims: Mutex<HashSet<(String, String)>>,
    fail_builds: Mutex<Option<EngineError>>,
}

impl FakeIndexBuilder {
    /// Creates a builder for the table stored at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            claims: Mutex::new(HashSet::new()),
            fail_builds: Mutex::new(None),
        }
    }

    /// Makes every following build fail with `error`.
    pub fn fail_builds_with(&self, error: EngineError) {
        *self.fail_builds.lock() = Some(error);
    }
}

impl IndexBuilder for FakeIndexBuilder {
    type Context = FakeBuildContext;

    fn prepare_build_context(
        &self,
        _metadata: &Arc<TableMetadata>,
        part_name: &str,
        index_name: &str,
        slow_mode: bool,
    ) -> Result<Self::Context, EngineError> {
        let dir = self.root.join(part_name);
        if !dir.is_dir() {
            return Err(EngineError::part_not_found(part_name));
        }

        let mut claims = self.claims.lock();
        let key = (part_name.to_string(), index_name.to_string());
        if claims.contains(&key) || dir.join(naming::description_file_name(index_name)).is_file() {
            return Err(EngineError::already_exists(part_name, index_name));
        }
        claims.insert(key);

        Ok(FakeBuildContext {
            dir,
            part_name: part_name.to_string(),
            index_name: index_name.to_string(),
            slow_mode,
        })
    }

    fn build(&self, context: &Self::Context) -> Result<(), EngineError> {
        if let Some(error) = self.fail_builds.lock().clone() {
            return Err(error);
        }
        if !context.dir.is_dir() {
            return Err(EngineError::part_not_found(&context.part_name));
        }
        write_segment_files(
            &context.dir,
            &context.part_name,
            &context.index_name,
            context.slow_mode,
        )
        .map_err(EngineError::from)
    }
}

/// A temporary table with automatic cleanup.
///
/// The table defines the index `idx` on column `vec` unless created with
/// [`TestTable::with_indices`]. Its context binds an in-memory segment cache
/// and an in-memory event log.
pub struct TestTable {
    /// The table directory.
    pub table: TableDir,
    /// The segment cache bound to the context.
    pub cache: Arc<InMemorySegmentCache<()>>,
    /// The event log bound to the context.
    pub log: Arc<MemoryEventLog>,
    /// The engine context.
    pub context: Arc<VectorIndexContext>,
    /// The fake builder for this table.
    pub builder: Arc<FakeIndexBuilder>,
    /// The temporary directory (kept alive to prevent cleanup).
    _temp_dir: TempDir,
}

impl TestTable {
    /// Creates a table defining `idx` on `vec`.
    pub fn new() -> Self {
        Self::with_indices(&[IndexDefinition::new("idx", "vec")])
    }

    /// Creates a table defining the given indexes.
    pub fn with_indices(indices: &[IndexDefinition]) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");

        let mut metadata = TableMetadata::new("db", "items");
        for index in indices {
            metadata = metadata.with_index(index.clone());
        }
        let table = TableDir::create(&temp_dir.path().join("items"), metadata)
            .expect("Failed to create table");

        let config = VectorIndexConfig::new()
            .cache_path(temp_dir.path().join("cache"))
            .event_log_max_history(1_000);
        let cache = Arc::new(InMemorySegmentCache::<()>::new());
        let log = Arc::new(MemoryEventLog::with_max_history(config.event_log_max_history));
        let context = VectorIndexContext::new(config, cache.clone())
            .expect("Failed to create context")
            .with_event_log(log.clone());
        let builder = Arc::new(FakeIndexBuilder::new(table.root()));

        Self {
            table,
            cache,
            log,
            context: Arc::new(context),
            builder,
            _temp_dir: temp_dir,
        }
    }

    /// First index defined on the table.
    pub fn index(&self) -> IndexDefinition {
        self.table
            .metadata()
            .vector_indices
            .first()
            .cloned()
            .expect("Table defines no index")
    }

    /// Creates an empty part.
    pub fn part(&self, name: &str) -> DiskPart {
        self.table.create_part(name).expect("Failed to create part")
    }

    /// Reopens an existing part from disk.
    pub fn open_part(&self, name: &str) -> DiskPart {
        self.table
            .part(name)
            .expect("Failed to open part")
            .expect("Part does not exist")
    }

    /// Merges existing parts into a new part.
    pub fn merge(&self, destination: &str, sources: &[&str]) -> DiskPart {
        self.table
            .commit_merged_part(destination, sources)
            .expect("Failed to merge parts")
    }

    /// Creates a build task for a part.
    pub fn task(&self, part_name: &str, index: &IndexDefinition) -> BuildTask<FakeIndexBuilder> {
        BuildTask::new(
            Arc::clone(&self.builder),
            Arc::clone(&self.context),
            part_name,
            index.clone(),
            Arc::clone(self.table.metadata()),
        )
    }

    /// Prepares and executes a build, returning the final status.
    pub fn build(&self, part_name: &str, index: &IndexDefinition) -> BuildStatus {
        let mut task = self.task(part_name, index);
        let prepared = task.prepare();
        if !prepared.is_success() {
            return prepared;
        }
        task.execute()
    }

    /// A migrator bound to the table's context.
    pub fn migrator(&self) -> MergeMigrator {
        MergeMigrator::new(Arc::clone(&self.context))
    }

    /// Event types logged so far, oldest first.
    pub fn event_types(&self) -> Vec<EventType> {
        self.log.records().iter().map(|r| r.event_type).collect()
    }
}

impl Default for TestTable {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Deref for TestTable {
    type Target = TableDir;

    fn deref(&self) -> &Self::Target {
        &self.table
    }
}
