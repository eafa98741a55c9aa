//! Migration of vector-index segments across part merges.
//!
//! When ancestor parts merge into a new part, their already built segments
//! are moved into the new part's directory instead of being discarded. The
//! merged part serves queries from these inherited segments, through row-id
//! maps, until it builds its own; then the inherited segments are purged.
//!
//! ## Invariants
//!
//! - Relocation is a best-effort loop of independent renames, never rolled
//!   back; [`MergeMigrator::verify_relocation`] reconciles after the fact
//! - A purge evicts every inherited segment from the cache before any file
//!   is deleted, so a concurrent reader misses and reloads rather than
//!   reading a deleted file
//! - Purging is idempotent

use crate::context::VectorIndexContext;
use crate::error::{CoreError, CoreResult};
use crate::event_log::{self, EventType, ExecutionStatus};
use crate::segment::{resolve_inherited_segments, SegmentId};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use vidx_storage::naming::{self, IndexFileKind};
use vidx_storage::{checksums, DataPart, IndexDefinition, MergedSourcePart};

const LOG_TARGET: &str = "vidx::migration";

/// A file that could not be moved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelocationFailure {
    /// Source path.
    pub path: PathBuf,
    /// Why the rename failed.
    pub error: String,
}

/// Outcome of relocating one or more ancestors' segment files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelocationReport {
    /// Names of the relocated files inside the destination directory.
    pub moved: Vec<String>,
    /// Files left behind.
    pub failed: Vec<RelocationFailure>,
}

impl RelocationReport {
    /// Returns true if no file was left behind.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    fn absorb(&mut self, other: RelocationReport) {
        self.moved.extend(other.moved);
        self.failed.extend(other.failed);
    }
}

/// Outcome of a reconciliation scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerificationReport {
    /// Relocated files found in the destination.
    pub present: Vec<String>,
    /// Relocated files expected but absent.
    pub missing: Vec<String>,
}

impl VerificationReport {
    /// Returns true if nothing is missing.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Outcome of purging a part's inherited segments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PurgeReport {
    /// Inherited segments found on the part.
    pub segments: usize,
    /// Cache entries evicted.
    pub cache_entries_removed: usize,
    /// Row-id maps and relocated files deleted.
    pub files_removed: usize,
    /// Failures, logged and not propagated.
    pub errors: Vec<String>,
}

/// Moves, verifies and purges inherited segments.
///
/// # Example
///
/// ```rust,ignore
/// let migrator = MergeMigrator::new(ctx);
/// for ancestor in merged.merged_source_parts() {
///     let dir = table.part_path(&ancestor.name);
///     migrator.relocate_segment_files(&ancestor, &dir, merged.path());
/// }
/// // ... once the merged part has built its own index:
/// migrator.purge_inherited_segments(&merged, &index);
/// ```
#[derive(Debug, Clone)]
pub struct MergeMigrator {
    context: Arc<VectorIndexContext>,
}

impl MergeMigrator {
    /// Creates a migrator bound to an engine context.
    #[must_use]
    pub fn new(context: Arc<VectorIndexContext>) -> Self {
        Self { context }
    }

    /// Returns the engine context.
    #[must_use]
    pub fn context(&self) -> &Arc<VectorIndexContext> {
        &self.context
    }

    /// Lists the segments `part` inherited for `index`, in merge order.
    ///
    /// Empty unless the part still carries row-id maps.
    #[must_use]
    pub fn discover_inherited_segments(
        &self,
        part: &dyn DataPart,
        index: &IndexDefinition,
    ) -> Vec<SegmentId> {
        resolve_inherited_segments(&self.context, part, index)
    }

    /// Lists the inherited segments of every index defined on the table.
    #[must_use]
    pub fn discover_inherited_segments_all(&self, part: &dyn DataPart) -> Vec<SegmentId> {
        part.table()
            .vector_indices
            .iter()
            .flat_map(|index| self.discover_inherited_segments(part, index))
            .collect()
    }

    /// Moves every index file found under `ancestor_dir` into
    /// `destination_dir`, renamed `merged-<ordinal>-<ancestor>-<file>`.
    ///
    /// The scan is recursive and the destination is flat. A failed rename
    /// is logged and reported; files already moved stay moved.
    pub fn relocate_segment_files(
        &self,
        ancestor: &MergedSourcePart,
        ancestor_dir: &Path,
        destination_dir: &Path,
    ) -> RelocationReport {
        let mut report = RelocationReport::default();
        let mut files = Vec::new();
        collect_index_files(ancestor_dir, &mut files, &mut report);

        for path in files {
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let relocated = naming::merged_file_name(ancestor.ordinal, &ancestor.name, file_name);

            match fs::rename(&path, destination_dir.join(&relocated)) {
                Ok(()) => {
                    tracing::debug!(
                        target: LOG_TARGET,
                        from = %path.display(),
                        to = %relocated,
                        "relocated vector index file"
                    );
                    report.moved.push(relocated);
                }
                Err(e) => {
                    tracing::warn!(
                        target: LOG_TARGET,
                        file = %path.display(),
                        error = %e,
                        "failed to relocate vector index file"
                    );
                    report.failed.push(RelocationFailure {
                        path,
                        error: e.to_string(),
                    });
                }
            }
        }

        report.moved.sort();
        report
    }

    /// Relocates the segment files of every ancestor of `part`.
    ///
    /// Ancestor directories are looked up next to the part's own directory.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotOnDisk`] if the part has no local storage.
    pub fn relocate_inherited_segments(&self, part: &dyn DataPart) -> CoreResult<RelocationReport> {
        let storage = part
            .storage()
            .ok_or_else(|| CoreError::not_on_disk(part.name()))?;
        let destination = storage.full_path.as_path();
        let parent = destination
            .parent()
            .ok_or_else(|| CoreError::invalid_operation("part directory has no parent"))?;

        let mut report = RelocationReport::default();
        for ancestor in part.merged_source_parts() {
            let ancestor_dir = parent.join(&ancestor.name);
            if !ancestor_dir.is_dir() {
                tracing::debug!(
                    target: LOG_TARGET,
                    ancestor = %ancestor.name,
                    "ancestor directory gone, nothing to relocate"
                );
                continue;
            }
            report.absorb(self.relocate_segment_files(&ancestor, &ancestor_dir, destination));
        }

        tracing::info!(
            target: LOG_TARGET,
            part = %part.name(),
            moved = report.moved.len(),
            failed = report.failed.len(),
            "relocated inherited vector index files"
        );
        Ok(report)
    }

    /// Checks that every file in `expected` (original names) sits in
    /// `destination_dir` under its relocated name.
    ///
    /// Read-only; safe to run any number of times.
    #[must_use]
    pub fn verify_relocation(
        &self,
        ancestor: &MergedSourcePart,
        destination_dir: &Path,
        expected: &[String],
    ) -> VerificationReport {
        let mut report = VerificationReport::default();
        for original in expected {
            let relocated = naming::merged_file_name(ancestor.ordinal, &ancestor.name, original);
            if destination_dir.join(&relocated).is_file() {
                report.present.push(relocated);
            } else {
                report.missing.push(relocated);
            }
        }
        report
    }

    /// Verifies an inherited segment against the checksums its ancestor
    /// wrote at build time.
    ///
    /// # Errors
    ///
    /// Returns an error if the checksums file is missing or unreadable, a
    /// listed file is missing, or a digest differs.
    pub fn verify_segment_checksums(&self, segment: &SegmentId) -> CoreResult<()> {
        let sums = checksums::read(&segment.data_root().join(segment.checksums_file_name()))?;
        checksums::verify(segment.data_root(), &sums, |name| segment.file_name(name))?;
        Ok(())
    }

    /// Purges the inherited segments of `part` once `index` no longer needs
    /// them.
    ///
    /// The row-id maps are shared by every index on the part, so the purge
    /// evicts the inherited cache entries of all indexes before deleting
    /// the row-id maps and every relocated file. `segments` counts the
    /// segments of `index` only.
    ///
    /// Emits a `Cleared` event. A part without row-id maps is left
    /// untouched, which makes repeated calls no-ops.
    pub fn purge_inherited_segments(
        &self,
        part: &dyn DataPart,
        index: &IndexDefinition,
    ) -> PurgeReport {
        let segments = self.discover_inherited_segments(part, index).len();
        let mut report = self.purge(part);
        if report != PurgeReport::default() {
            report.segments = segments;
        }
        report
    }

    /// Purges the inherited segments of every index defined on the table.
    pub fn purge_all_inherited_segments(&self, part: &dyn DataPart) -> PurgeReport {
        self.purge(part)
    }

    fn purge(&self, part: &dyn DataPart) -> PurgeReport {
        let mut report = PurgeReport::default();
        if part.storage().is_none() || !part.contains_row_ids_maps() {
            return report;
        }

        let segments = self.discover_inherited_segments_all(part);
        tracing::debug!(
            target: LOG_TARGET,
            part = %part.name(),
            segments = segments.len(),
            "removing inherited vector index segments"
        );
        report.segments = segments.len();

        for segment in &segments {
            if self.context.cache().remove(&segment.cache_key()) {
                report.cache_entries_removed += 1;
            }
        }

        let status = match part.remove_all_row_ids_maps() {
            Ok(Some(removed)) => {
                report.files_removed = removed;
                ExecutionStatus::ok()
            }
            Ok(None) => {
                tracing::debug!(
                    target: LOG_TARGET,
                    part = %part.name(),
                    "row ids maps already removed"
                );
                return report;
            }
            Err(e) => {
                tracing::warn!(
                    target: LOG_TARGET,
                    part = %part.name(),
                    error = %e,
                    "failed to remove row ids maps"
                );
                report.errors.push(e.to_string());
                ExecutionStatus::error(crate::build::error_codes::STD_EXCEPTION, e.to_string())
            }
        };

        event_log::record_for_part(&self.context, part, EventType::Cleared, &status);
        report
    }
}

/// Collects `.vidx3` files under `dir`, recursively.
fn collect_index_files(dir: &Path, files: &mut Vec<PathBuf>, report: &mut RelocationReport) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(
                target: LOG_TARGET,
                dir = %dir.display(),
                error = %e,
                "failed to scan directory"
            );
            report.failed.push(RelocationFailure {
                path: dir.to_path_buf(),
                error: e.to_string(),
            });
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_index_files(&path, files, report);
        } else if IndexFileKind::classify(&path) == IndexFileKind::Current {
            files.push(path);
        }
    }
}
