// src/store/mod.rs
pub mod duck;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use duck::{Database, DuckSession};

/// Name of the table holding diagnostic records.
pub const TABLE: &str = "business_symptom_data";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] duckdb::Error),
    #[error("store session unavailable: {0}")]
    SessionUnavailable(String),
}

/// A persisted business/symptom diagnostic entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessSymptomRecord {
    pub id: i64,
    pub business_id: i64,
    pub business_name: String,
    pub symptom_code: String,
    pub symptom_name: String,
    pub symptom_diagnostic_raw: Option<String>,
    pub symptom_diagnostic: Option<bool>,
}

/// Insert payload; the store assigns `id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBusinessSymptom {
    pub business_id: i64,
    pub business_name: String,
    pub symptom_code: String,
    pub symptom_name: String,
    pub symptom_diagnostic_raw: Option<String>,
    pub symptom_diagnostic: Option<bool>,
}

impl NewBusinessSymptom {
    pub fn with_id(self, id: i64) -> BusinessSymptomRecord {
        BusinessSymptomRecord {
            id,
            business_id: self.business_id,
            business_name: self.business_name,
            symptom_code: self.symptom_code,
            symptom_name: self.symptom_name,
            symptom_diagnostic_raw: self.symptom_diagnostic_raw,
            symptom_diagnostic: self.symptom_diagnostic,
        }
    }
}

/// Transactional table store the loader writes into and the API reads from.
///
/// Transactions are explicit: callers pair every `begin` with exactly one
/// `commit` or `rollback`.
pub trait SymptomStore {
    fn begin(&mut self) -> Result<(), StoreError>;
    /// Insert one record inside the open transaction, returning its new id.
    fn insert(&mut self, record: &NewBusinessSymptom) -> Result<i64, StoreError>;
    fn commit(&mut self) -> Result<(), StoreError>;
    fn rollback(&mut self) -> Result<(), StoreError>;
    /// Records whose business id and parsed diagnostic both match exactly, by id.
    fn find(
        &self,
        business_id: i64,
        diagnostic: bool,
    ) -> Result<Vec<BusinessSymptomRecord>, StoreError>;
    fn count(&self) -> Result<i64, StoreError>;
}
