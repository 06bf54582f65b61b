//! First-mapped timestamps for a fixed list of OSM ways.
//!
//! Each lookup always produces a printable value: the earliest revision's
//! timestamp, [`NO_HISTORY`] when the way has no revisions, or a string
//! describing why the lookup failed. Nothing is raised to the caller.

use crate::config::HistorySettings;
use crate::error::{Result, RoadwatchError, ResultExt as _};
use crate::http;
use reqwest::StatusCode;
use std::path::Path;

/// Value reported for a way whose history document lists no versions.
pub const NO_HISTORY: &str = "No history found";

/// Header row of the timestamp table.
pub const TABLE_HEADER: [&str; 2] = ["Way ID", "First Mapped Timestamp"];

/// One row of the timestamp table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampRecord {
    pub way_id: u64,
    /// Earliest timestamp, [`NO_HISTORY`], or a failure description
    pub timestamp: String,
}

/// Extracts the first `way` version's `timestamp` from a history document.
///
/// OSM returns versions oldest first. A version without a timestamp
/// attribute yields an empty string.
pub fn earliest_timestamp(xml: &str) -> Result<Option<String>> {
    let document = roxmltree::Document::parse(xml)?;
    let first = document
        .root_element()
        .children()
        .find(|node| node.has_tag_name("way"));
    Ok(first.map(|way| way.attribute("timestamp").unwrap_or_default().to_owned()))
}

fn fetch(url: &str, settings: &HistorySettings) -> Result<String> {
    let client = http::client(settings.timeout())?;
    let response = client.get(url).send()?;
    let status = response.status();
    if status != StatusCode::OK {
        return Ok(format!("Failed to fetch: {}", status.as_u16()));
    }
    let body = response.text()?;
    Ok(earliest_timestamp(&body)?.unwrap_or_else(|| NO_HISTORY.to_owned()))
}

fn describe(err: &RoadwatchError) -> String {
    match err {
        RoadwatchError::Network(msg) | RoadwatchError::Other(msg) => format!("Error: {msg}"),
        other => format!("Error: {other}"),
    }
}

/// History endpoint for a way.
pub fn history_url(base_url: &str, way_id: u64) -> String {
    format!("{}/way/{way_id}/history", base_url.trim_end_matches('/'))
}

/// Looks up the earliest timestamp of one way.
pub fn way_timestamp(way_id: u64, settings: &HistorySettings) -> String {
    let url = history_url(&settings.base_url, way_id);
    fetch(&url, settings).unwrap_or_else(|e| describe(&e))
}

/// Looks up every configured way, one request at a time.
pub fn lookup_all(settings: &HistorySettings) -> Vec<TimestampRecord> {
    settings
        .way_ids
        .iter()
        .map(|&way_id| {
            let timestamp = way_timestamp(way_id, settings);
            tracing::info!("Way ID: {way_id} -> First mapped: {timestamp}");
            TimestampRecord { way_id, timestamp }
        })
        .collect()
}

/// Writes the two-column timestamp table.
pub fn write_table(path: &Path, records: &[TimestampRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    writer.write_record(TABLE_HEADER)?;
    for record in records {
        writer.write_record([record.way_id.to_string(), record.timestamp.clone()])?;
    }
    writer.flush()?;
    Ok(())
}

/// Looks up every way and writes the table to `output`.
pub fn run_history(settings: &HistorySettings, output: &Path) -> Result<Vec<TimestampRecord>> {
    let records = lookup_all(settings);
    write_table(output, &records)?;
    tracing::info!("Saved {} timestamps to {}", records.len(), output.display());
    Ok(records)
}
