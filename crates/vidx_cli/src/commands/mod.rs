//! CLI command implementations.

pub mod events;
pub mod purge;
pub mod relocate;
pub mod segments;
pub mod verify;

use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use vidx_core::{InMemorySegmentCache, MergeMigrator, VectorIndexConfig, VectorIndexContext};
use vidx_storage::{DiskPart, IndexDefinition, TableDir};

/// Errors raised by the commands themselves.
#[derive(Debug, Error)]
pub enum CliError {
    /// The part directory does not exist.
    #[error("part {0} not found")]
    PartNotFound(String),

    /// The index is not defined on the table.
    #[error("index {0} is not defined on the table")]
    IndexNotFound(String),
}

/// An opened table plus the migrator bound to it.
///
/// The CLI runs outside the engine, so the segment cache it holds is empty:
/// cache evictions it reports are always zero.
pub struct Session {
    /// The table directory.
    pub table: TableDir,
    /// Migrator bound to a fresh context.
    pub migrator: MergeMigrator,
}

impl Session {
    /// Opens the table at `path`, binding `event_log` if given.
    pub fn open(path: &Path, event_log: Option<&Path>) -> Result<Self, Box<dyn std::error::Error>> {
        let table = TableDir::open(path)?;

        let mut config = VectorIndexConfig::new();
        if let Some(log) = event_log {
            config = config.event_log_path(log);
        }
        let context = VectorIndexContext::new(config, Arc::new(InMemorySegmentCache::<()>::new()))?;

        Ok(Self {
            table,
            migrator: MergeMigrator::new(Arc::new(context)),
        })
    }

    /// Opens a part of the table.
    pub fn part(&self, name: &str) -> Result<DiskPart, Box<dyn std::error::Error>> {
        Ok(self
            .table
            .part(name)?
            .ok_or_else(|| CliError::PartNotFound(name.to_string()))?)
    }

    /// Returns the named index, or every index when `name` is `None`.
    pub fn indexes(&self, name: Option<&str>) -> Result<Vec<IndexDefinition>, CliError> {
        let metadata = self.table.metadata();
        match name {
            Some(name) => metadata
                .index(name)
                .cloned()
                .map(|index| vec![index])
                .ok_or_else(|| CliError::IndexNotFound(name.to_string())),
            None => Ok(metadata.vector_indices.clone()),
        }
    }
}
