//! Checksums of the files making up one index segment.
//!
//! The checksums file is a JSON object mapping each file name (as written
//! by the build step, before any relocation) to its size and SHA-256.

use crate::error::{StorageError, StorageResult};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Size and digest of one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChecksum {
    /// File size in bytes.
    pub size: u64,
    /// Lowercase hex SHA-256 of the contents.
    pub sha256: String,
}

/// File name to checksum.
pub type Checksums = BTreeMap<String, FileChecksum>;

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Computes the checksum of a single file.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub fn checksum_file(path: &Path) -> StorageResult<FileChecksum> {
    let data = fs::read(path)?;
    Ok(FileChecksum {
        size: data.len() as u64,
        sha256: hex(&Sha256::digest(&data)),
    })
}

/// Computes checksums for `files` inside `dir`.
///
/// # Errors
///
/// Returns an error if any file cannot be read.
pub fn compute(dir: &Path, files: &[String]) -> StorageResult<Checksums> {
    files
        .iter()
        .map(|name| Ok((name.clone(), checksum_file(&dir.join(name))?)))
        .collect()
}

/// Writes a checksums file.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write(path: &Path, checksums: &Checksums) -> StorageResult<()> {
    let data =
        serde_json::to_vec_pretty(checksums).map_err(|e| StorageError::Encode(e.to_string()))?;
    fs::write(path, data)?;
    Ok(())
}

/// Reads a checksums file.
///
/// # Errors
///
/// Returns an error if the file is missing or not valid JSON.
pub fn read(path: &Path) -> StorageResult<Checksums> {
    let data = fs::read(path)?;
    serde_json::from_slice(&data).map_err(|e| StorageError::corrupted(e.to_string()))
}

/// Verifies every recorded file against the copy in `dir`.
///
/// `locate` maps a recorded name to the name the file has now, which differs
/// from the recorded one once a segment has been relocated by a merge.
///
/// # Errors
///
/// Returns [`StorageError::ChecksumMismatch`] for the first file whose
/// digest differs, or an I/O error if a file is missing.
pub fn verify(
    dir: &Path,
    checksums: &Checksums,
    locate: impl Fn(&str) -> String,
) -> StorageResult<()> {
    for (name, expected) in checksums {
        let current = locate(name);
        let actual = checksum_file(&dir.join(&current))?;
        if actual != *expected {
            return Err(StorageError::ChecksumMismatch {
                file: current,
                expected: expected.sha256.clone(),
                actual: actual.sha256,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn write_read_verify() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("idx-data.vidx3"), b"vectors").unwrap();

        let sums = compute(temp.path(), &["idx-data.vidx3".to_string()]).unwrap();
        assert_eq!(sums["idx-data.vidx3"].size, 7);
        assert_eq!(sums["idx-data.vidx3"].sha256.len(), 64);

        let path = temp.path().join("idx-vector_index_checksums.vidx3");
        write(&path, &sums).unwrap();
        let loaded = read(&path).unwrap();
        assert_eq!(loaded, sums);

        verify(temp.path(), &loaded, |n| n.to_string()).unwrap();
    }

    #[test]
    fn verify_follows_relocated_names() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("idx-data.vidx3"), b"abc").unwrap();
        let sums = compute(temp.path(), &["idx-data.vidx3".to_string()]).unwrap();

        fs::rename(
            temp.path().join("idx-data.vidx3"),
            temp.path().join("merged-0-all_1_1_0-idx-data.vidx3"),
        )
        .unwrap();

        verify(temp.path(), &sums, |n| format!("merged-0-all_1_1_0-{n}")).unwrap();
        assert!(verify(temp.path(), &sums, |n| n.to_string()).is_err());
    }

    #[test]
    fn tampered_file_is_reported() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("a.vidx3"), b"one").unwrap();
        let sums = compute(temp.path(), &["a.vidx3".to_string()]).unwrap();
        fs::write(temp.path().join("a.vidx3"), b"two").unwrap();

        let result = verify(temp.path(), &sums, |n| n.to_string());
        assert!(matches!(result, Err(StorageError::ChecksumMismatch { .. })));
    }
}
