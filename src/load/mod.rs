// src/load/mod.rs
pub mod validate;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::boolean::{BooleanParser, BooleanVocabulary};
use crate::error::LoadError;
use crate::ingest::{self, RawRow};
use crate::store::{NewBusinessSymptom, StoreError, SymptomStore};
use validate::{format_row_error, RowValidator};

/// What to do with a row whose `Symptom Diagnostic` is absent or empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticPolicy {
    /// The row is stored with NULL diagnostic columns.
    #[default]
    Optional,
    /// The row fails with `does not contain Symptom Diagnostic`.
    Required,
}

/// What to do with a row whose field count differs from the header's.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RaggedRows {
    #[default]
    Reject,
    /// Missing trailing fields count as absent, extra fields are ignored.
    Pad,
}

/// Transaction boundaries of a load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitMode {
    /// Each valid row is inserted and committed on its own; rows committed
    /// before a later validation failure stay durable.
    #[default]
    PerRow,
    /// One transaction for the whole upload; any invalid row rolls everything back.
    AllOrNothing,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadOptions {
    pub vocabulary: BooleanVocabulary,
    pub diagnostic: DiagnosticPolicy,
    pub ragged_rows: RaggedRows,
    pub commit_mode: CommitMode,
}

/// Outcome of a load in which every row was valid and committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadSummary {
    pub rows_seen: usize,
    pub rows_committed: usize,
    pub inserted_ids: Vec<i64>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Validates raw rows and writes the valid ones into a [`SymptomStore`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Loader {
    options: LoadOptions,
}

impl Loader {
    pub fn new(options: LoadOptions) -> Self {
        Self { options }
    }

    /// Decode and ingest `bytes`, then load every row. Decoding and CSV
    /// failures are fatal before any row touches the store.
    #[tracing::instrument(level = "info", skip(self, store, bytes), fields(bytes = bytes.len()))]
    pub fn load_bytes<S: SymptomStore + ?Sized>(
        &self,
        store: &mut S,
        bytes: &[u8],
        encoding: &str,
    ) -> Result<LoadSummary, LoadError> {
        let rows = ingest::ingest(bytes, encoding)?;
        self.load_rows(store, rows)
    }

    /// Validate and persist `rows` strictly in order.
    ///
    /// Invalid rows are skipped and reported together once every row has been
    /// attempted, as [`LoadError::Validation`]. A store failure on a valid row
    /// rolls back the open transaction and returns [`LoadError::Persistence`]
    /// straight away.
    #[tracing::instrument(level = "info", skip_all, fields(mode = ?self.options.commit_mode))]
    pub fn load_rows<S, I>(&self, store: &mut S, rows: I) -> Result<LoadSummary, LoadError>
    where
        S: SymptomStore + ?Sized,
        I: IntoIterator<Item = RawRow>,
    {
        let started_at = Utc::now();
        let validator = RowValidator {
            parser: BooleanParser::new(self.options.vocabulary),
            diagnostic: self.options.diagnostic,
            ragged_rows: self.options.ragged_rows,
        };
        let batch = self.options.commit_mode == CommitMode::AllOrNothing;

        let mut rows_seen = 0;
        let mut inserted_ids = Vec::new();
        let mut errors = Vec::new();
        let mut open = false;

        for row in rows {
            rows_seen += 1;
            let record = match validator.validate(&row) {
                Ok(record) => record,
                Err(violations) => {
                    let msg = format_row_error(&row, &violations);
                    debug!(line = row.line, "{}", msg);
                    errors.push(msg);
                    continue;
                }
            };

            match persist(&mut *store, &record, &mut open, batch) {
                Ok(id) => inserted_ids.push(id),
                Err(source) => {
                    error!(line = row.line, error = %source, "persisting row failed; aborting load");
                    if open {
                        abandon(store);
                    }
                    return Err(LoadError::Persistence {
                        row: Some(row.line),
                        source,
                    });
                }
            }
        }

        if !errors.is_empty() {
            let committed = if batch {
                if open {
                    abandon(store);
                }
                0
            } else {
                inserted_ids.len()
            };
            warn!(
                invalid = errors.len(),
                committed,
                rows = rows_seen,
                "load finished with validation errors"
            );
            return Err(LoadError::Validation { errors, committed });
        }

        if open {
            if let Err(source) = store.commit() {
                error!(error = %source, "final commit failed");
                abandon(store);
                return Err(LoadError::Persistence { row: None, source });
            }
        }

        let summary = LoadSummary {
            rows_seen,
            rows_committed: inserted_ids.len(),
            inserted_ids,
            started_at,
            finished_at: Utc::now(),
        };
        info!(
            rows = summary.rows_seen,
            committed = summary.rows_committed,
            "load complete"
        );
        Ok(summary)
    }
}

/// Insert one record, opening a transaction if none is open. Outside batch
/// mode the transaction is committed right away.
fn persist<S: SymptomStore + ?Sized>(
    store: &mut S,
    record: &NewBusinessSymptom,
    open: &mut bool,
    batch: bool,
) -> Result<i64, StoreError> {
    if !*open {
        store.begin()?;
        *open = true;
    }
    let id = store.insert(record)?;
    if !batch {
        store.commit()?;
        *open = false;
    }
    Ok(id)
}

fn abandon<S: SymptomStore + ?Sized>(store: &mut S) {
    if let Err(e) = store.rollback() {
        warn!(error = %e, "rollback failed");
    }
}
