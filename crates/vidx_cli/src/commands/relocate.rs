//! Relocate command implementation.

use super::Session;
use std::path::Path;
use tracing::info;
use vidx_storage::DataPart;

/// Runs the relocate command.
pub fn run(
    path: &Path,
    part_name: &str,
    event_log: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    info!("Relocating inherited segments into {} in {:?}", part_name, path);
    let session = Session::open(path, event_log)?;
    let part = session.part(part_name)?;

    if !part.contains_row_ids_maps() {
        println!("Part {part_name} has no row-id maps; nothing to relocate");
        return Ok(());
    }

    let report = session.migrator.relocate_inherited_segments(&part)?;

    println!("Relocated {} file(s) into {}", report.moved.len(), part_name);
    for name in &report.moved {
        println!("  {name}");
    }

    if report.is_complete() {
        Ok(())
    } else {
        println!();
        println!("{} file(s) left behind:", report.failed.len());
        for failure in &report.failed {
            println!("  {}: {}", failure.path.display(), failure.error);
        }
        Err("Relocation incomplete".into())
    }
}
