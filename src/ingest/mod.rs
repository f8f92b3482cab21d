// src/ingest/mod.rs
pub mod decode;

use csv::{ReaderBuilder, Trim};
use std::fmt;
use thiserror::Error;
use tracing::{debug, warn};

pub use decode::{decode, DecodeError, TextEncoding};

#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("malformed CSV near line {}: {source}", .line.map(|l| l.to_string()).unwrap_or_else(|| "?".into()))]
    Csv {
        line: Option<u64>,
        #[source]
        source: csv::Error,
    },
}

impl IngestError {
    fn csv(source: csv::Error) -> Self {
        let line = source.position().map(|p| p.line());
        IngestError::Csv { line, source }
    }
}

/// One decoded, not yet validated CSV line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    /// Physical line in the uploaded file (the header is line 1).
    pub line: u64,
    /// (header, value) pairs in column order. Fields beyond the header count are dropped.
    pub values: Vec<(String, String)>,
    /// Number of fields the line actually carried.
    pub found: usize,
    /// Number of header columns.
    pub expected: usize,
}

impl RawRow {
    pub fn get(&self, field: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(k, _)| k == field)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_complete(&self) -> bool {
        self.found == self.expected
    }
}

impl fmt::Display for RawRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (k, v)) in self.values.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", k, v)?;
        }
        f.write_str("}")
    }
}

/// Parse already-decoded CSV text. The first record is the header row; every
/// later record is keyed by those header names, in input order.
pub fn read_rows(text: &str) -> Result<Vec<RawRow>, IngestError> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true) // field-count mismatches are judged by the loader
        .trim(Trim::Headers)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = rdr
        .headers()
        .map_err(IngestError::csv)?
        .iter()
        .map(str::to_string)
        .collect();
    if headers.is_empty() || headers.iter().all(String::is_empty) {
        debug!("no header line; nothing to ingest");
        return Ok(Vec::new());
    }

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result.map_err(IngestError::csv)?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        if record.len() != headers.len() {
            warn!(
                line,
                found = record.len(),
                expected = headers.len(),
                "row field count differs from header"
            );
        }
        let values = headers
            .iter()
            .zip(record.iter())
            .map(|(h, v)| (h.clone(), v.to_string()))
            .collect();
        rows.push(RawRow {
            line,
            values,
            found: record.len(),
            expected: headers.len(),
        });
    }

    debug!(rows = rows.len(), columns = headers.len(), "ingested CSV");
    Ok(rows)
}

/// Decode `bytes` with the named encoding, then split them into raw rows.
pub fn ingest(bytes: &[u8], encoding: &str) -> Result<Vec<RawRow>, IngestError> {
    let text = decode(bytes, encoding)?;
    read_rows(&text)
}
