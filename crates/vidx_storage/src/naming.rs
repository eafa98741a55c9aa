//! File-naming conventions for vector-index artifacts.
//!
//! These names are shared by the build step, the loader and the merge
//! migration. They must be preserved bit-exactly: the loader finds files
//! purely by name, and a renamed convention strands every existing segment.

use std::path::Path;

/// Suffix of every current-format vector-index file.
pub const INDEX_FILE_SUFFIX: &str = ".vidx3";

/// Suffix of the previous on-disk format, recognized for migration only.
pub const LEGACY_INDEX_FILE_SUFFIX: &str = ".vidx2";

/// Stem of the per-index description file.
pub const DESCRIPTION_STEM: &str = "vector_index_description";

/// Stem of the per-index checksums file.
pub const CHECKSUMS_STEM: &str = "vector_index_checksums";

/// Prefix carried by every file relocated from an ancestor part.
pub const MERGED_PREFIX: &str = "merged-";

/// Stem of the per-ancestor row-id map.
pub const ROW_IDS_MAP_STEM: &str = "row_ids_map";

/// Name of the inverted row-id map written for a merged part.
pub const INVERTED_ROW_IDS_MAP_FILE: &str = "merged-inverted_row_ids_map.vidx3";

/// Name of the inverted row-sources map written for a merged part.
pub const INVERTED_ROW_SOURCES_MAP_FILE: &str = "merged-inverted_row_sources_map.vidx3";

/// Classification of a file inside a part directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexFileKind {
    /// A current-format index file (`.vidx3`).
    Current,
    /// A previous-format index file (`.vidx2`).
    Legacy,
    /// Anything else (column data, manifests).
    Other,
}

impl IndexFileKind {
    /// Classifies a file by its name.
    #[must_use]
    pub fn classify(path: &Path) -> Self {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return Self::Other;
        };
        if name.ends_with(INDEX_FILE_SUFFIX) {
            Self::Current
        } else if name.ends_with(LEGACY_INDEX_FILE_SUFFIX) {
            Self::Legacy
        } else {
            Self::Other
        }
    }
}

/// `<index_name>-vector_index_description.vidx3`
#[must_use]
pub fn description_file_name(index_name: &str) -> String {
    format!("{index_name}-{DESCRIPTION_STEM}{INDEX_FILE_SUFFIX}")
}

/// `<index_name>-vector_index_checksums.vidx3`
#[must_use]
pub fn checksums_file_name(index_name: &str) -> String {
    format!("{index_name}-{CHECKSUMS_STEM}{INDEX_FILE_SUFFIX}")
}

/// Name a file from an ancestor part takes once relocated into the
/// destination part: `merged-<ordinal>-<ancestor_name>-<original>`.
#[must_use]
pub fn merged_file_name(ordinal: u32, ancestor_name: &str, original: &str) -> String {
    format!("{MERGED_PREFIX}{ordinal}-{ancestor_name}-{original}")
}

/// Description file of an inherited segment after relocation.
#[must_use]
pub fn merged_description_file_name(ordinal: u32, ancestor_name: &str, index_name: &str) -> String {
    merged_file_name(ordinal, ancestor_name, &description_file_name(index_name))
}

/// Checksums file of an inherited segment after relocation.
#[must_use]
pub fn merged_checksums_file_name(ordinal: u32, ancestor_name: &str, index_name: &str) -> String {
    merged_file_name(ordinal, ancestor_name, &checksums_file_name(index_name))
}

/// Row-id map translating one ancestor's row ids into the merged part.
#[must_use]
pub fn row_ids_map_file_name(ordinal: u32, ancestor_name: &str) -> String {
    merged_file_name(
        ordinal,
        ancestor_name,
        &format!("{ROW_IDS_MAP_STEM}{INDEX_FILE_SUFFIX}"),
    )
}

/// Returns true if the file name belongs to an inherited artifact.
#[must_use]
pub fn is_merged_file(name: &str) -> bool {
    name.starts_with(MERGED_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn description_and_checksums_names() {
        assert_eq!(
            description_file_name("idx"),
            "idx-vector_index_description.vidx3"
        );
        assert_eq!(
            checksums_file_name("idx"),
            "idx-vector_index_checksums.vidx3"
        );
    }

    #[test]
    fn merged_names_carry_ordinal_and_ancestor() {
        assert_eq!(
            merged_file_name(1, "all_2_2_0", "idx-data.vidx3"),
            "merged-1-all_2_2_0-idx-data.vidx3"
        );
        assert_eq!(
            merged_description_file_name(0, "all_1_1_0", "idx"),
            "merged-0-all_1_1_0-idx-vector_index_description.vidx3"
        );
        assert_eq!(
            row_ids_map_file_name(3, "p_4_4_0"),
            "merged-3-p_4_4_0-row_ids_map.vidx3"
        );
        assert!(is_merged_file(INVERTED_ROW_IDS_MAP_FILE));
        assert!(!is_merged_file("idx-vector_index_description.vidx3"));
    }

    #[test]
    fn classify_by_suffix() {
        assert_eq!(
            IndexFileKind::classify(&PathBuf::from("/p/idx-data.vidx3")),
            IndexFileKind::Current
        );
        assert_eq!(
            IndexFileKind::classify(&PathBuf::from("idx-data.vidx2")),
            IndexFileKind::Legacy
        );
        assert_eq!(
            IndexFileKind::classify(&PathBuf::from("part.meta")),
            IndexFileKind::Other
        );
        assert_eq!(
            IndexFileKind::classify(&PathBuf::from("/")),
            IndexFileKind::Other
        );
    }
}
