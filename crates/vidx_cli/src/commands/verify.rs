//! Verify command implementation.

use super::Session;
use std::path::Path;
use vidx_core::segment::{resolve_inherited_segments, resolve_own_segment};
use vidx_storage::DataPart;

/// Verification result.
#[derive(Debug, Default)]
pub struct VerifyResult {
    /// Number of segments checked.
    pub segments_checked: usize,
    /// Number of segments whose files match their checksums.
    pub valid_segments: usize,
    /// List of errors found.
    pub errors: Vec<String>,
}

impl VerifyResult {
    fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Runs the verify command.
pub fn run(path: &Path, part_name: &str) -> Result<(), Box<dyn std::error::Error>> {
    let session = Session::open(path, None)?;
    let part = session.part(part_name)?;
    let ctx = session.migrator.context();

    println!("Verifying segments of part {part_name}");
    println!();

    let mut result = VerifyResult::default();
    for index in session.indexes(None)? {
        let mut segments: Vec<_> = resolve_own_segment(ctx, &part, &index).into_iter().collect();
        segments.extend(resolve_inherited_segments(ctx, &part, &index));

        for segment in segments {
            result.segments_checked += 1;
            if !segment.files_present() {
                result
                    .errors
                    .push(format!("{segment}: description or checksums file missing"));
                continue;
            }
            match session.migrator.verify_segment_checksums(&segment) {
                Ok(()) => {
                    println!("  ok    {segment}");
                    result.valid_segments += 1;
                }
                Err(e) => result.errors.push(format!("{segment}: {e}")),
            }
        }
    }

    if part.has_legacy_index_files() {
        println!("  note  legacy (.vidx2) index files present");
    }

    println!();
    println!(
        "Checked {} segment(s), {} valid",
        result.segments_checked, result.valid_segments
    );
    for error in &result.errors {
        println!("  error: {error}");
    }

    if result.is_ok() {
        println!("✓ Segment verification passed");
        Ok(())
    } else {
        println!("✗ Segment verification failed");
        Err("Verification failed".into())
    }
}
