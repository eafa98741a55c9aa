//! Part and table manifests.
//!
//! Manifests are CBOR documents written with the write-then-rename pattern:
//! a reader either sees the previous manifest or the new one, never a torn
//! write.

use crate::error::{StorageError, StorageResult};
use crate::part::MergedSourcePart;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

/// Current part manifest version.
pub const MANIFEST_VERSION: u16 = 1;

/// Per-part metadata the lifecycle code depends on.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PartManifest {
    /// Manifest format version.
    pub version: u16,
    /// Ancestor parts consumed by the merge that produced this part.
    pub merged_sources: Vec<MergedSourcePart>,
    /// Whether the part still carries unconverted row-id maps.
    pub row_ids_maps: bool,
}

impl PartManifest {
    /// Creates a manifest for a freshly inserted part.
    #[must_use]
    pub fn new() -> Self {
        Self {
            version: MANIFEST_VERSION,
            ..Self::default()
        }
    }

    /// Creates a manifest for a part produced by merging `sources`.
    #[must_use]
    pub fn merged(sources: Vec<MergedSourcePart>) -> Self {
        Self {
            version: MANIFEST_VERSION,
            merged_sources: sources,
            row_ids_maps: true,
        }
    }
}

/// Encodes a value as CBOR.
pub(crate) fn encode<T: Serialize>(value: &T) -> StorageResult<Vec<u8>> {
    let mut buf = Vec::new();
    ciborium::into_writer(value, &mut buf).map_err(|e| StorageError::Encode(e.to_string()))?;
    Ok(buf)
}

/// Decodes a CBOR value.
pub(crate) fn decode<T: DeserializeOwned>(data: &[u8]) -> StorageResult<T> {
    ciborium::from_reader(data).map_err(|e| StorageError::corrupted(e.to_string()))
}

/// Loads a manifest, returning `None` if the file does not exist.
pub(crate) fn load<T: DeserializeOwned>(path: &Path) -> StorageResult<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    let data = fs::read(path)?;
    if data.is_empty() {
        return Ok(None);
    }
    decode(&data).map(Some)
}

/// Saves a manifest atomically.
///
/// 1. Write to `<path>.tmp`
/// 2. Sync the temporary file
/// 3. Rename over `path`
pub(crate) fn save<T: Serialize>(path: &Path, value: &T) -> StorageResult<()> {
    let data = encode(value)?;
    let temp_path = path.with_extension("tmp");

    let mut file = File::create(&temp_path)?;
    file.write_all(&data)?;
    file.sync_all()?;
    drop(file);

    fs::rename(&temp_path, path)?;
    Ok(())
}
