// src/services/export.rs
use anyhow::{Context, Result};
use csv::Writer;

use crate::models::MergedRow;

/// Serializes merged rows as CSV with a header line.
pub fn merged_to_csv(rows: &[MergedRow]) -> Result<String> {
    let mut wtr = Writer::from_writer(Vec::new());
    for row in rows {
        wtr.serialize(row).context("Failed to serialize merged row")?;
    }
    let bytes = wtr.into_inner().context("Failed to flush CSV writer")?;
    Ok(String::from_utf8(bytes)?)
}
