//! Segments command implementation.

use super::Session;
use serde::Serialize;
use std::path::Path;
use vidx_core::segment::{resolve_all_segments, resolve_inherited_segments, resolve_own_segment};
use vidx_core::SegmentId;
use vidx_storage::DataPart;

/// One segment as listed by the command.
#[derive(Debug, Serialize)]
pub struct SegmentInfo {
    /// Index name.
    pub index: String,
    /// Indexed column.
    pub column: String,
    /// Ancestor the segment was inherited from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_part: Option<String>,
    /// Merge ordinal of the ancestor.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_ordinal: Option<u32>,
    /// Cache key.
    pub cache_key: String,
    /// Cache directory prefix.
    pub cache_prefix: String,
    /// Description and checksums files present.
    pub files_present: bool,
    /// Whether queries are served from this segment.
    pub active: bool,
}

/// Segments of one part.
#[derive(Debug, Serialize)]
pub struct PartSegments {
    /// Part name.
    pub part: String,
    /// Whether the part still carries row-id maps.
    pub row_ids_maps: bool,
    /// Whether previous-format index files are present.
    pub legacy_files: bool,
    /// Own and inherited segments.
    pub segments: Vec<SegmentInfo>,
}

fn info(segment: &SegmentId, active: bool) -> SegmentInfo {
    SegmentInfo {
        index: segment.index_name().to_string(),
        column: segment.index_column().to_string(),
        source_part: segment.provenance().map(|p| p.source_part_name.clone()),
        source_ordinal: segment.provenance().map(|p| p.source_part_ordinal),
        cache_key: segment.cache_key().to_string(),
        cache_prefix: segment.cache_prefix().display().to_string(),
        files_present: segment.files_present(),
        active,
    }
}

/// Runs the segments command.
pub fn run(
    path: &Path,
    part_name: &str,
    index: Option<&str>,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let session = Session::open(path, None)?;
    let part = session.part(part_name)?;
    let ctx = session.migrator.context();

    let mut result = PartSegments {
        part: part.name().to_string(),
        row_ids_maps: part.contains_row_ids_maps(),
        legacy_files: part.has_legacy_index_files(),
        segments: Vec::new(),
    };

    for index in session.indexes(index)? {
        let active = resolve_all_segments(ctx, &part, &index);
        if let Some(own) = resolve_own_segment(ctx, &part, &index) {
            result.segments.push(info(&own, active.contains(&own)));
        }
        for inherited in resolve_inherited_segments(ctx, &part, &index) {
            let is_active = active.contains(&inherited);
            result.segments.push(info(&inherited, is_active));
        }
    }

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            print_text_output(&result);
        }
    }

    Ok(())
}

fn print_text_output(result: &PartSegments) {
    println!("Part: {}", result.part);
    println!("Row-id maps: {}", if result.row_ids_maps { "yes" } else { "no" });
    if result.legacy_files {
        println!("Legacy (.vidx2) index files present");
    }
    println!();

    if result.segments.is_empty() {
        println!("No segments");
        return;
    }

    println!(
        "{:<16} {:<12} {:<24} {:>6} {:>6}  CACHE KEY",
        "INDEX", "COLUMN", "SOURCE", "FILES", "ACTIVE"
    );
    for seg in &result.segments {
        let source = match (&seg.source_part, seg.source_ordinal) {
            (Some(name), Some(ordinal)) => format!("{ordinal}:{name}"),
            _ => "own".to_string(),
        };
        println!(
            "{:<16} {:<12} {:<24} {:>6} {:>6}  {}",
            seg.index,
            seg.column,
            source,
            if seg.files_present { "ok" } else { "-" },
            if seg.active { "yes" } else { "no" },
            seg.cache_key
        );
    }
}
