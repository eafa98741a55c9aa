//! Storage parts.

use crate::error::StorageResult;
use crate::manifest::{self, PartManifest};
use crate::metadata::{IndexDefinition, TableMetadata};
use crate::naming::{self, IndexFileKind};
use crate::part_info::PartInfo;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// File name of the part manifest.
pub(crate) const PART_MANIFEST_FILE: &str = "part.meta";

/// Opaque handle of the volume (disk) a part is stored on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VolumeId(pub String);

impl VolumeId {
    /// The default local volume.
    #[must_use]
    pub fn default_volume() -> Self {
        Self("default".to_string())
    }
}

impl fmt::Display for VolumeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where a part's files physically live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartStorage {
    /// Volume holding the part.
    pub volume: VolumeId,
    /// Absolute path of the part directory.
    pub full_path: PathBuf,
}

/// An ancestor part consumed by a merge.
///
/// Ancestors are never re-opened as parts. They survive only as a name and
/// the position they had in the merge.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MergedSourcePart {
    /// Name of the ancestor part (possibly with a mutation suffix).
    pub name: String,
    /// Position of the ancestor in the merge, starting at 0.
    pub ordinal: u32,
}

impl MergedSourcePart {
    /// Creates a merged-source record.
    pub fn new(name: impl Into<String>, ordinal: u32) -> Self {
        Self {
            name: name.into(),
            ordinal,
        }
    }
}

/// The view of a storage part needed by the vector-index lifecycle.
///
/// The host engine owns parts; this trait is the seam through which the
/// lifecycle code inspects and mutates them.
///
/// # Invariants
///
/// - `contains_row_ids_maps()` implies `merged_source_parts()` is non-empty
/// - `remove_all_row_ids_maps()` is idempotent
pub trait DataPart: Send + Sync {
    /// Full part name, including any mutation suffix.
    fn name(&self) -> &str;

    /// Parsed part name, if the name is well-formed.
    fn info(&self) -> Option<&PartInfo>;

    /// Metadata snapshot of the owning table.
    fn table(&self) -> &TableMetadata;

    /// Returns the on-disk location, or `None` if the part is not stored on disk.
    fn storage(&self) -> Option<&PartStorage>;

    /// Returns true if the part holds its own built index for `index`.
    fn contains_vector_index(&self, index: &IndexDefinition) -> bool;

    /// Returns true if the part still carries unconverted row-id maps.
    fn contains_row_ids_maps(&self) -> bool;

    /// Ancestors recorded by the merge that produced this part.
    fn merged_source_parts(&self) -> Vec<MergedSourcePart>;

    /// Deletes the row-id maps and every inherited file, and clears the
    /// merge provenance from the part's metadata.
    ///
    /// Returns the number of files removed, or `None` if the part carried
    /// no row-id maps when the call took effect.
    ///
    /// # Errors
    ///
    /// Returns an error if a file cannot be removed or the metadata cannot
    /// be persisted.
    fn remove_all_row_ids_maps(&self) -> StorageResult<Option<usize>>;

    /// Name without the mutation suffix.
    fn name_without_mutation(&self) -> String {
        match self.info() {
            Some(info) => info.name_without_mutation(),
            None => self.name().to_string(),
        }
    }

    /// Partition id, or an empty string for unparseable names.
    fn partition_id(&self) -> String {
        self.info()
            .map(|info| info.partition_id.clone())
            .unwrap_or_default()
    }
}

/// A part stored in a directory on a local volume.
///
/// # Thread Safety
///
/// The manifest is guarded by a lock; file removal and manifest rewrite in
/// [`DataPart::remove_all_row_ids_maps`] happen under the write lock so two
/// concurrent purges cannot interleave.
#[derive(Debug)]
pub struct DiskPart {
    name: String,
    info: Option<PartInfo>,
    table: Arc<TableMetadata>,
    storage: PartStorage,
    manifest: RwLock<PartManifest>,
}

impl DiskPart {
    /// Opens an existing part directory.
    ///
    /// A missing manifest is treated as an empty one.
    ///
    /// # Errors
    ///
    /// Returns an error if the manifest exists but cannot be decoded.
    pub fn open(table: Arc<TableMetadata>, path: &Path) -> StorageResult<Self> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        let manifest = manifest::load::<PartManifest>(&path.join(PART_MANIFEST_FILE))?
            .unwrap_or_default();

        Ok(Self {
            info: PartInfo::parse(&name),
            name,
            table,
            storage: PartStorage {
                volume: VolumeId::default_volume(),
                full_path: path.to_path_buf(),
            },
            manifest: RwLock::new(manifest),
        })
    }

    /// Creates a part directory with the given manifest.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or manifest cannot be written.
    pub fn create(
        table: Arc<TableMetadata>,
        path: &Path,
        manifest: PartManifest,
    ) -> StorageResult<Self> {
        fs::create_dir_all(path)?;
        manifest::save(&path.join(PART_MANIFEST_FILE), &manifest)?;
        Self::open(table, path)
    }

    /// Absolute path of the part directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.storage.full_path
    }

    /// Returns a copy of the current manifest.
    #[must_use]
    pub fn manifest(&self) -> PartManifest {
        self.manifest.read().clone()
    }

    /// Lists file names in the part directory, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be read.
    pub fn file_names(&self) -> StorageResult<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(self.path())? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                if let Some(name) = entry.file_name().to_str() {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    /// Returns true if any previous-format index file is present.
    #[must_use]
    pub fn has_legacy_index_files(&self) -> bool {
        self.file_names().is_ok_and(|names| {
            names
                .iter()
                .any(|n| IndexFileKind::classify(Path::new(n)) == IndexFileKind::Legacy)
        })
    }
}

impl DataPart for DiskPart {
    fn name(&self) -> &str {
        &self.name
    }

    fn info(&self) -> Option<&PartInfo> {
        self.info.as_ref()
    }

    fn table(&self) -> &TableMetadata {
        &self.table
    }

    fn storage(&self) -> Option<&PartStorage> {
        Some(&self.storage)
    }

    fn contains_vector_index(&self, index: &IndexDefinition) -> bool {
        let dir = self.path();
        dir.join(naming::description_file_name(&index.name)).is_file()
            && dir.join(naming::checksums_file_name(&index.name)).is_file()
    }

    fn contains_row_ids_maps(&self) -> bool {
        let manifest = self.manifest.read();
        manifest.row_ids_maps && !manifest.merged_sources.is_empty()
    }

    fn merged_source_parts(&self) -> Vec<MergedSourcePart> {
        self.manifest.read().merged_sources.clone()
    }

    fn remove_all_row_ids_maps(&self) -> StorageResult<Option<usize>> {
        let mut manifest = self.manifest.write();
        if !manifest.row_ids_maps && manifest.merged_sources.is_empty() {
            return Ok(None);
        }

        let mut removed = 0;
        for name in self.file_names()? {
            if naming::is_merged_file(&name) {
                match fs::remove_file(self.path().join(&name)) {
                    Ok(()) => removed += 1,
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                    Err(e) => return Err(e.into()),
                }
            }
        }

        let mut updated = manifest.clone();
        updated.row_ids_maps = false;
        updated.merged_sources.clear();
        manifest::save(&self.path().join(PART_MANIFEST_FILE), &updated)?;
        *manifest = updated;

        tracing::debug!(
            target: "vidx::storage",
            part = %self.name,
            removed,
            "removed row ids maps"
        );
        Ok(Some(removed))
    }
}
