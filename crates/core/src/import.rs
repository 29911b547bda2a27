//! Collection import
//!
//! Turns a user supplied CSV export into [`CollectionRecord`]s. Decoding the
//! stream is the only step that can fail; once rows exist every cell is
//! degraded independently, so one malformed row never aborts an import.

use std::collections::HashMap;
use std::io::Read;

use crate::record::{CollectionRecord, EnrichmentState};

/// Recognized column headers (matched case-sensitively)
pub const NAME_HEADER: &str = "Name";
pub const SET_CODE_HEADER: &str = "Set code";
pub const QUANTITY_HEADER: &str = "Quantity";
pub const FOIL_HEADER: &str = "Foil";
pub const SCRYFALL_ID_HEADER: &str = "Scryfall ID";
pub const COLLECTOR_NUMBER_HEADER: &str = "Collector number";

/// One decoded row, keyed by column header
pub type RawRow = HashMap<String, String>;

/// Error type for import decoding
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("Failed to read CSV header row: {0}")]
    Header(#[source] csv::Error),

    #[error("Failed to read CSV row {row}: {source}")]
    Row {
        row: usize,
        #[source]
        source: csv::Error,
    },
}

/// Decode a header-row CSV stream into rows
///
/// Rows may be shorter than the header (missing trailing cells are simply
/// absent from the row). Blank lines and rows whose every cell is empty are
/// skipped.
pub fn read_rows<R: Read>(reader: R) -> Result<Vec<RawRow>, ImportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = csv_reader
        .headers()
        .map_err(ImportError::Header)?
        .iter()
        .map(|header| header.trim_start_matches('\u{feff}').to_string())
        .collect();

    let mut rows = Vec::new();
    for (index, result) in csv_reader.records().enumerate() {
        let record = result.map_err(|source| ImportError::Row {
            row: index + 1,
            source,
        })?;

        if record.iter().all(str::is_empty) {
            continue;
        }

        let row: RawRow = headers
            .iter()
            .zip(record.iter())
            .map(|(header, cell)| (header.clone(), cell.to_string()))
            .collect();
        rows.push(row);
    }

    Ok(rows)
}

/// Parse a quantity cell
///
/// Reads the leading run of digits after optional whitespace and `+`.
/// Anything without digits (including negative numbers) is 0.
pub fn parse_quantity(raw: &str) -> u32 {
    let trimmed = raw.trim();
    let unsigned = trimmed.strip_prefix('+').unwrap_or(trimmed);

    unsigned
        .bytes()
        .take_while(u8::is_ascii_digit)
        .fold(0u32, |acc, digit| {
            acc.saturating_mul(10).saturating_add(u32::from(digit - b'0'))
        })
}

fn cell(row: &RawRow, header: &str) -> String {
    row.get(header).cloned().unwrap_or_default()
}

/// Normalize one decoded row into a record
pub fn parse_row(row: &RawRow) -> CollectionRecord {
    CollectionRecord {
        name: cell(row, NAME_HEADER),
        set_code: cell(row, SET_CODE_HEADER),
        quantity: row
            .get(QUANTITY_HEADER)
            .map(|raw| parse_quantity(raw))
            .unwrap_or(0),
        foil: cell(row, FOIL_HEADER),
        external_id: cell(row, SCRYFALL_ID_HEADER),
        collector_number: cell(row, COLLECTOR_NUMBER_HEADER),
        enrichment: EnrichmentState::Unenriched,
    }
}

/// Normalize decoded rows, preserving order and count
pub fn parse(rows: &[RawRow]) -> Vec<CollectionRecord> {
    rows.iter().map(parse_row).collect()
}

/// Decode and normalize a CSV export in one step
pub fn import_collection<R: Read>(reader: R) -> Result<Vec<CollectionRecord>, ImportError> {
    let rows = read_rows(reader)?;
    Ok(parse(&rows))
}
