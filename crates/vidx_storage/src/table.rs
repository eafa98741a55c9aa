//! Table directory management.
//!
//! A [`TableDir`] is the directory holding every part of one table plus the
//! table manifest. It is the local stand-in for the host engine's part
//! registry: it can create parts, commit the result of a merge and drop
//! parts that a merge has made obsolete.

use crate::error::{StorageError, StorageResult};
use crate::manifest::{self, PartManifest};
use crate::metadata::TableMetadata;
use crate::naming;
use crate::part::{DiskPart, MergedSourcePart};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// File name of the table manifest.
const TABLE_MANIFEST_FILE: &str = "table.meta";

/// The directory of one table.
#[derive(Debug, Clone)]
pub struct TableDir {
    root: PathBuf,
    metadata: Arc<TableMetadata>,
}

impl TableDir {
    /// Creates a table directory and writes its manifest.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or manifest cannot be written.
    pub fn create(root: &Path, metadata: TableMetadata) -> StorageResult<Self> {
        fs::create_dir_all(root)?;
        manifest::save(&root.join(TABLE_MANIFEST_FILE), &metadata)?;
        Ok(Self {
            root: root.to_path_buf(),
            metadata: Arc::new(metadata),
        })
    }

    /// Opens an existing table directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the manifest is missing or corrupted.
    pub fn open(root: &Path) -> StorageResult<Self> {
        let metadata: TableMetadata = manifest::load(&root.join(TABLE_MANIFEST_FILE))?
            .ok_or_else(|| {
                StorageError::corrupted(format!("missing table manifest in {}", root.display()))
            })?;
        Ok(Self {
            root: root.to_path_buf(),
            metadata: Arc::new(metadata),
        })
    }

    /// Returns the table directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the table metadata snapshot.
    #[must_use]
    pub fn metadata(&self) -> &Arc<TableMetadata> {
        &self.metadata
    }

    /// Path a part with this name has (or would have).
    #[must_use]
    pub fn part_path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Opens a part, returning `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the part manifest is corrupted.
    pub fn part(&self, name: &str) -> StorageResult<Option<DiskPart>> {
        let path = self.part_path(name);
        if !path.is_dir() {
            return Ok(None);
        }
        DiskPart::open(Arc::clone(&self.metadata), &path).map(Some)
    }

    /// Lists the names of all parts, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be read.
    pub fn part_names(&self) -> StorageResult<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    /// Creates an empty part.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::PartExists`] if the part already exists.
    pub fn create_part(&self, name: &str) -> StorageResult<DiskPart> {
        let path = self.part_path(name);
        if path.exists() {
            return Err(StorageError::PartExists {
                name: name.to_string(),
            });
        }
        DiskPart::create(Arc::clone(&self.metadata), &path, PartManifest::new())
    }

    /// Commits the result of merging `sources` into a new part `destination`.
    ///
    /// Records the sources in merge order and writes one row-id map per
    /// source plus the inverted maps. The ancestors' own files are left in
    /// place; relocating their index files is the migration's job.
    ///
    /// # Errors
    ///
    /// Returns an error if a source is missing, the destination exists, or
    /// any file cannot be written.
    pub fn commit_merged_part(&self, destination: &str, sources: &[&str]) -> StorageResult<DiskPart> {
        let path = self.part_path(destination);
        if path.exists() {
            return Err(StorageError::PartExists {
                name: destination.to_string(),
            });
        }

        let mut merged = Vec::with_capacity(sources.len());
        for (ordinal, source) in sources.iter().enumerate() {
            if !self.part_path(source).is_dir() {
                return Err(StorageError::part_not_found(*source));
            }
            let ordinal = u32::try_from(ordinal)
                .map_err(|_| StorageError::corrupted("too many merge sources"))?;
            merged.push(MergedSourcePart::new(*source, ordinal));
        }

        let part = DiskPart::create(
            Arc::clone(&self.metadata),
            &path,
            PartManifest::merged(merged.clone()),
        )?;

        for source in &merged {
            fs::write(
                path.join(naming::row_ids_map_file_name(source.ordinal, &source.name)),
                b"",
            )?;
        }
        fs::write(path.join(naming::INVERTED_ROW_IDS_MAP_FILE), b"")?;
        fs::write(path.join(naming::INVERTED_ROW_SOURCES_MAP_FILE), b"")?;

        tracing::debug!(
            target: "vidx::storage",
            part = destination,
            sources = merged.len(),
            "committed merged part"
        );
        Ok(part)
    }

    /// Removes a part directory. Missing parts are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be removed.
    pub fn drop_part(&self, name: &str) -> StorageResult<()> {
        match fs::remove_dir_all(self.part_path(name)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::IndexDefinition;
    use crate::part::DataPart;
    use tempfile::tempdir;

    fn new_table(root: &Path) -> TableDir {
        TableDir::create(
            root,
            TableMetadata::new("db", "items").with_index(IndexDefinition::new("idx", "vec")),
        )
        .unwrap()
    }

    #[test]
    fn create_and_reopen() {
        let temp = tempdir().unwrap();
        let table = new_table(temp.path());
        table.create_part("all_1_1_0").unwrap();

        let reopened = TableDir::open(temp.path()).unwrap();
        assert_eq!(reopened.metadata().table, "items");
        assert_eq!(reopened.part_names().unwrap(), vec!["all_1_1_0"]);
        assert!(reopened.part("all_1_1_0").unwrap().is_some());
        assert!(reopened.part("all_9_9_0").unwrap().is_none());
    }

    #[test]
    fn open_without_manifest_fails() {
        let temp = tempdir().unwrap();
        assert!(matches!(
            TableDir::open(temp.path()),
            Err(StorageError::Corrupted(_))
        ));
    }

    #[test]
    fn duplicate_part_is_rejected() {
        let temp = tempdir().unwrap();
        let table = new_table(temp.path());
        table.create_part("all_1_1_0").unwrap();
        assert!(matches!(
            table.create_part("all_1_1_0"),
            Err(StorageError::PartExists { .. })
        ));
    }

    #[test]
    fn merge_records_sources_in_order() {
        let temp = tempdir().unwrap();
        let table = new_table(temp.path());
        table.create_part("all_1_1_0").unwrap();
        table.create_part("all_2_2_0").unwrap();

        let merged = table
            .commit_merged_part("all_1_2_1", &["all_1_1_0", "all_2_2_0"])
            .unwrap();

        assert!(merged.contains_row_ids_maps());
        assert_eq!(
            merged.merged_source_parts(),
            vec![
                MergedSourcePart::new("all_1_1_0", 0),
                MergedSourcePart::new("all_2_2_0", 1),
            ]
        );
        assert!(merged
            .path()
            .join("merged-1-all_2_2_0-row_ids_map.vidx3")
            .exists());
    }

    #[test]
    fn merge_with_missing_source_fails() {
        let temp = tempdir().unwrap();
        let table = new_table(temp.path());
        table.create_part("all_1_1_0").unwrap();

        let result = table.commit_merged_part("all_1_2_1", &["all_1_1_0", "all_2_2_0"]);
        assert!(matches!(result, Err(StorageError::PartNotFound { .. })));
    }

    #[test]
    fn drop_part_is_idempotent() {
        let temp = tempdir().unwrap();
        let table = new_table(temp.path());
        table.create_part("all_1_1_0").unwrap();

        table.drop_part("all_1_1_0").unwrap();
        table.drop_part("all_1_1_0").unwrap();
        assert!(table.part("all_1_1_0").unwrap().is_none());
    }
}
