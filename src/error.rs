use thiserror::Error;

use crate::boolean::UnrecognizedBoolean;
use crate::ingest::{DecodeError, IngestError};
use crate::store::StoreError;

/// A single rule a raw row broke. Never fatal on its own; the loader gathers
/// them per row and keeps going.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowViolation {
    #[error("does not contain {0}")]
    MissingField(&'static str),
    #[error("{field} {value:?} is not a valid integer")]
    InvalidBusinessId { field: &'static str, value: String },
    #[error("{field} is {len} characters long, at most {max} allowed")]
    TooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },
    #[error("{field}: {source}")]
    UnrecognizedBoolean {
        field: &'static str,
        #[source]
        source: UnrecognizedBoolean,
    },
    #[error("has {found} fields, expected {expected}")]
    FieldCount { found: usize, expected: usize },
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("could not decode upload: {0}")]
    Decode(#[from] DecodeError),
    #[error("malformed CSV near line {}: {source}", .line.map(|l| l.to_string()).unwrap_or_else(|| "?".into()))]
    Csv {
        line: Option<u64>,
        #[source]
        source: csv::Error,
    },
    /// Raised after every row was attempted. Rows committed before the failure
    /// stay committed unless the load ran all-or-nothing.
    #[error("{} row(s) failed validation: {}", .errors.len(), .errors.join(" | "))]
    Validation { errors: Vec<String>, committed: usize },
    /// Fatal: the in-flight transaction was rolled back and no later row was processed.
    #[error("failed to persist row at line {}: {source}", .row.map(|l| l.to_string()).unwrap_or_else(|| "?".into()))]
    Persistence {
        row: Option<u64>,
        #[source]
        source: StoreError,
    },
}

impl From<IngestError> for LoadError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::Decode(e) => LoadError::Decode(e),
            IngestError::Csv { line, source } => LoadError::Csv { line, source },
        }
    }
}
