//! Purge command implementation.

use super::Session;
use std::path::Path;
use tracing::info;

/// Runs the purge command.
pub fn run(
    path: &Path,
    part_name: &str,
    index: Option<&str>,
    event_log: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    info!("Purging inherited segments of {} in {:?}", part_name, path);
    let session = Session::open(path, event_log)?;
    let part = session.part(part_name)?;

    let report = match index {
        Some(name) => {
            let index = session
                .indexes(Some(name))?
                .into_iter()
                .next()
                .ok_or_else(|| super::CliError::IndexNotFound(name.to_string()))?;
            session.migrator.purge_inherited_segments(&part, &index)
        }
        None => session.migrator.purge_all_inherited_segments(&part),
    };

    println!("Inherited segments: {}", report.segments);
    println!("Cache entries evicted: {}", report.cache_entries_removed);
    println!("Files removed: {}", report.files_removed);

    if report.errors.is_empty() {
        Ok(())
    } else {
        for error in &report.errors {
            println!("  error: {error}");
        }
        Err("Purge incomplete".into())
    }
}
