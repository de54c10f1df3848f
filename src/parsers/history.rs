use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use anyhow::{Context, Result, bail};

use crate::models::HistoryRecord;
use crate::utils::validate_file_size;

const MAX_CONSECUTIVE_ERRORS: usize = 100;

/// Parse an exported history file and return its records
///
/// Two layouts are accepted: a single JSON array (what a browser export usually
/// produces) or JSON Lines with one record per line. The layout is picked from
/// the first non-whitespace byte.
///
/// JSON Lines input tolerates malformed lines by logging and skipping them, but
/// returns an error if more than 50% of lines fail or >100 fail consecutively.
pub fn parse_history_file(path: &Path) -> Result<Vec<HistoryRecord>> {
    // Open file and validate size to avoid TOCTOU race condition
    let file = File::open(path)
        .with_context(|| format!("Failed to open history file: {}", path.display()))?;
    validate_file_size(&file, path)?;

    let mut reader = BufReader::new(file);
    let is_array = loop {
        let buf = reader.fill_buf().context("Failed to read history file")?;
        match buf.iter().position(|b| !b.is_ascii_whitespace()) {
            Some(pos) => {
                let first = buf[pos];
                break first == b'[';
            }
            None if buf.is_empty() => return Ok(Vec::new()),
            None => {
                let len = buf.len();
                reader.consume(len);
            }
        }
    };

    if is_array {
        parse_array(reader, path)
    } else {
        parse_lines(reader)
    }
}

fn parse_array<R: Read>(mut reader: R, path: &Path) -> Result<Vec<HistoryRecord>> {
    let mut content = String::new();
    reader.read_to_string(&mut content).context("Failed to read history file")?;

    let values: Vec<serde_json::Value> = serde_json::from_str(&content)
        .with_context(|| format!("History file is not a valid JSON array: {}", path.display()))?;

    let total = values.len();
    let mut records = Vec::with_capacity(total);
    let mut skipped_count = 0;

    for (index, value) in values.into_iter().enumerate() {
        match serde_json::from_value::<HistoryRecord>(value) {
            Ok(record) => records.push(record),
            Err(e) => {
                log::warn!("Failed to parse history record {}: {}", index, e);
                skipped_count += 1;
            }
        }
    }

    check_failure_rate(skipped_count, total)?;

    if skipped_count > 0 {
        log::info!("Parsed history file: {} records ({} skipped)", records.len(), skipped_count);
    }

    Ok(records)
}

fn parse_lines<R: BufRead>(reader: R) -> Result<Vec<HistoryRecord>> {
    let mut records = Vec::new();
    let mut skipped_count = 0;
    let mut total_lines = 0;
    let mut consecutive_errors = 0;

    for (line_num, line) in reader.lines().enumerate() {
        let line = line.context("Failed to read line from history file")?;

        if line.trim().is_empty() {
            continue;
        }

        total_lines += 1;

        match serde_json::from_str::<HistoryRecord>(&line) {
            Ok(record) => {
                records.push(record);
                consecutive_errors = 0;
            }
            Err(e) => {
                log::warn!("Failed to parse line {} in history file: {}", line_num + 1, e);
                skipped_count += 1;
                consecutive_errors += 1;

                if consecutive_errors >= MAX_CONSECUTIVE_ERRORS {
                    bail!(
                        "Too many consecutive parse errors ({}) in history file - file may be corrupted",
                        consecutive_errors
                    );
                }
            }
        }
    }

    check_failure_rate(skipped_count, total_lines)?;

    if skipped_count > 0 {
        log::info!("Parsed history file: {} records ({} skipped)", records.len(), skipped_count);
    }

    Ok(records)
}

fn check_failure_rate(skipped: usize, total: usize) -> Result<()> {
    if total > 0 {
        let failure_rate = (skipped as f64) / (total as f64);
        if failure_rate > 0.5 {
            bail!(
                "Too many parse failures in history file: {} of {} records failed ({:.1}%)",
                skipped,
                total,
                failure_rate * 100.0
            );
        }
    }
    Ok(())
}
