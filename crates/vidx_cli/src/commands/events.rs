//! Events command implementation.

use std::path::Path;
use vidx_core::{EventLogRecord, JsonLinesEventLog};

/// Runs the events command.
pub fn run(log: &Path, limit: Option<usize>, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    if !log.exists() {
        return Err(format!("Event log not found: {}", log.display()).into());
    }

    let mut records = JsonLinesEventLog::read_all(log)?;
    if let Some(limit) = limit {
        records.truncate(limit);
    }

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
        _ => {
            print_text_output(&records);
        }
    }

    Ok(())
}

fn print_text_output(records: &[EventLogRecord]) {
    println!(
        "{:<18} {:<24} {:<20} {:<18} {:>5}  EXCEPTION",
        "TIME (us)", "TABLE", "PART", "EVENT", "ERROR"
    );
    for record in records {
        println!(
            "{:<18} {:<24} {:<20} {:<18} {:>5}  {}",
            record.event_time_microseconds,
            format!("{}.{}", record.database, record.table),
            record.part_name,
            record.event_type.as_str(),
            record.error,
            record.exception
        );
    }
    println!();
    println!("{} record(s)", records.len());
}
