//! Reading event records from JSONL.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};
use ef_core::{EventRecord, Session};

/// Reads records from `path` (stdin for `None` or `-`) and groups them into sessions.
pub fn read_sessions(path: Option<&Path>) -> Result<Vec<Session>> {
    let records = match path {
        Some(path) if path != Path::new("-") => {
            let file =
                File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
            parse_records(BufReader::new(file))
                .with_context(|| format!("failed to read {}", path.display()))?
        }
        _ => parse_records(io::stdin().lock()).context("failed to read stdin")?,
    };

    if records.is_empty() {
        tracing::warn!("no event records in input");
    }

    ef_core::group_sessions(records).context("invalid event records")
}

/// Parses one JSON record per non-blank line.
pub fn parse_records<R: BufRead>(reader: R) -> Result<Vec<EventRecord>> {
    let mut records = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("failed to read line {}", idx + 1))?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let record: EventRecord = serde_json::from_str(trimmed)
            .with_context(|| format!("invalid JSON on line {}", idx + 1))?;
        records.push(record);
    }
    Ok(records)
}
