//! Segment identity and cache keys.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use vidx_storage::{naming, IndexDefinition, MergedSourcePart, PartInfo, VolumeId};

/// Marks a segment as inherited from an ancestor part consumed by a merge.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Provenance {
    /// Name of the ancestor part the segment was built for.
    pub source_part_name: String,
    /// Position of the ancestor in the merge.
    pub source_part_ordinal: u32,
}

impl From<&MergedSourcePart> for Provenance {
    fn from(source: &MergedSourcePart) -> Self {
        Self {
            source_part_name: source.name.clone(),
            source_part_ordinal: source.ordinal,
        }
    }
}

/// Key addressing one segment in the segment cache.
///
/// A pure function of the segment's identity: the owning part is taken
/// without its mutation suffix so that in-place mutations of a part keep
/// hitting the same entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    /// Relative data path of the table.
    pub table_path: String,
    /// Owning part, without mutation suffix.
    pub part_name: String,
    /// Index name.
    pub index_name: String,
    /// Indexed column.
    pub index_column: String,
    /// Ancestor the segment was inherited from, if any.
    pub provenance: Option<Provenance>,
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}/{}:{}",
            self.table_path, self.part_name, self.index_name, self.index_column
        )?;
        if let Some(p) = &self.provenance {
            write!(f, "@{}-{}", p.source_part_ordinal, p.source_part_name)?;
        }
        Ok(())
    }
}

/// Identity of one physical index segment.
///
/// A segment with `provenance == None` is the part's own, freshly built
/// index. A segment with `Some` provenance was built for an ancestor part
/// and its files were relocated into the owning part by a merge; they are
/// named `merged-<ordinal>-<ancestor>-<original>` inside `data_root`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentId {
    volume: VolumeId,
    data_root: PathBuf,
    table_path: String,
    owning_part_name: String,
    index_name: String,
    index_column: String,
    cache_prefix: PathBuf,
    provenance: Option<Provenance>,
}

impl SegmentId {
    /// Creates the identity of a part's own segment.
    pub fn new(
        volume: VolumeId,
        data_root: impl Into<PathBuf>,
        table_path: impl Into<String>,
        owning_part_name: impl Into<String>,
        index: &IndexDefinition,
        cache_prefix: impl Into<PathBuf>,
    ) -> Self {
        Self {
            volume,
            data_root: data_root.into(),
            table_path: table_path.into(),
            owning_part_name: owning_part_name.into(),
            index_name: index.name.clone(),
            index_column: index.column.clone(),
            cache_prefix: cache_prefix.into(),
            provenance: None,
        }
    }

    /// Marks the segment as inherited.
    #[must_use]
    pub fn with_provenance(mut self, provenance: Provenance) -> Self {
        self.provenance = Some(provenance);
        self
    }

    /// Volume holding the segment's files.
    #[must_use]
    pub fn volume(&self) -> &VolumeId {
        &self.volume
    }

    /// Directory holding the segment's files.
    #[must_use]
    pub fn data_root(&self) -> &Path {
        &self.data_root
    }

    /// Part currently storing the segment's files.
    #[must_use]
    pub fn owning_part_name(&self) -> &str {
        &self.owning_part_name
    }

    /// Index name.
    #[must_use]
    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    /// Indexed column.
    #[must_use]
    pub fn index_column(&self) -> &str {
        &self.index_column
    }

    /// Prefix of the segment's cache directory.
    #[must_use]
    pub fn cache_prefix(&self) -> &Path {
        &self.cache_prefix
    }

    /// Ancestor the segment was inherited from.
    #[must_use]
    pub fn provenance(&self) -> Option<&Provenance> {
        self.provenance.as_ref()
    }

    /// Returns true for a segment inherited from an ancestor part.
    #[must_use]
    pub fn is_inherited(&self) -> bool {
        self.provenance.is_some()
    }

    /// Cache key of the segment.
    #[must_use]
    pub fn cache_key(&self) -> CacheKey {
        CacheKey {
            table_path: self.table_path.clone(),
            part_name: PartInfo::strip_mutation(&self.owning_part_name),
            index_name: self.index_name.clone(),
            index_column: self.index_column.clone(),
            provenance: self.provenance.clone(),
        }
    }

    /// Current name of a file the build step wrote as `original`.
    #[must_use]
    pub fn file_name(&self, original: &str) -> String {
        match &self.provenance {
            Some(p) => naming::merged_file_name(p.source_part_ordinal, &p.source_part_name, original),
            None => original.to_string(),
        }
    }

    /// Name of the description file inside `data_root`.
    #[must_use]
    pub fn description_file_name(&self) -> String {
        self.file_name(&naming::description_file_name(&self.index_name))
    }

    /// Name of the checksums file inside `data_root`.
    #[must_use]
    pub fn checksums_file_name(&self) -> String {
        self.file_name(&naming::checksums_file_name(&self.index_name))
    }

    /// Returns true if the description and checksums files are present.
    #[must_use]
    pub fn files_present(&self) -> bool {
        self.data_root.join(self.description_file_name()).is_file()
            && self.data_root.join(self.checksums_file_name()).is_file()
    }
}

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}/{}",
            self.volume, self.owning_part_name, self.index_name
        )?;
        if let Some(p) = &self.provenance {
            write!(f, " (from {} #{})", p.source_part_name, p.source_part_ordinal)?;
        }
        Ok(())
    }
}
