use duckdb::{params, Connection};
use std::sync::Mutex;
use tracing::{debug, info};

use super::{BusinessSymptomRecord, NewBusinessSymptom, StoreError, SymptomStore, TABLE};

const IN_MEMORY: &str = ":memory:";

/// Owns the root DuckDB connection and hands out per-request sessions.
///
/// Every session is a clone of the root connection and therefore talks to the
/// same database instance, in-memory databases included.
pub struct Database {
    root: Mutex<Connection>,
}

impl Database {
    /// Open the database at `url`, creating the file if it doesn't exist.
    /// `:memory:` (or an empty string) selects a private in-memory database.
    pub fn open(url: &str) -> Result<Self, StoreError> {
        let url = if url.is_empty() { IN_MEMORY } else { url };
        let conn = if url == IN_MEMORY {
            Connection::open_in_memory()?
        } else {
            Connection::open(url)?
        };
        let db = Self {
            root: Mutex::new(conn),
        };
        db.setup_schema()?;
        info!(url, "database ready");
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::open(IN_MEMORY)
    }

    /// Prepare the sequence and table backing the records.
    fn setup_schema(&self) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute_batch(&format!(
            "CREATE SEQUENCE IF NOT EXISTS {TABLE}_id_seq START 1;
            CREATE TABLE IF NOT EXISTS {TABLE}(
                id BIGINT PRIMARY KEY DEFAULT nextval('{TABLE}_id_seq'),
                business_id BIGINT,
                business_name VARCHAR(30) NOT NULL,
                symptom_code VARCHAR(15) NOT NULL,
                symptom_name VARCHAR(30) NOT NULL,
                symptom_diagnostic_raw VARCHAR,
                symptom_diagnostic BOOLEAN
            );"
        ))?;
        Ok(())
    }

    /// A fresh session on the shared database, scoped to one request.
    pub fn session(&self) -> Result<DuckSession, StoreError> {
        let conn = self.lock()?.try_clone()?;
        Ok(DuckSession {
            conn,
            in_transaction: false,
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StoreError> {
        self.root
            .lock()
            .map_err(|e| StoreError::SessionUnavailable(e.to_string()))
    }
}

/// One connection's view of the store.
pub struct DuckSession {
    conn: Connection,
    in_transaction: bool,
}

impl SymptomStore for DuckSession {
    fn begin(&mut self) -> Result<(), StoreError> {
        self.conn.execute_batch("BEGIN TRANSACTION;")?;
        self.in_transaction = true;
        Ok(())
    }

    fn insert(&mut self, record: &NewBusinessSymptom) -> Result<i64, StoreError> {
        let mut stmt = self.conn.prepare_cached(&format!(
            "INSERT INTO {TABLE}(
                business_id, business_name, symptom_code, symptom_name,
                symptom_diagnostic_raw, symptom_diagnostic
            ) VALUES (?, ?, ?, ?, ?, ?) RETURNING id"
        ))?;
        let id: i64 = stmt.query_row(
            params![
                record.business_id,
                record.business_name,
                record.symptom_code,
                record.symptom_name,
                record.symptom_diagnostic_raw,
                record.symptom_diagnostic,
            ],
            |r| r.get(0),
        )?;
        debug!(id, business_id = record.business_id, "inserted record");
        Ok(id)
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        self.conn.execute_batch("COMMIT;")?;
        self.in_transaction = false;
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), StoreError> {
        if !self.in_transaction {
            return Ok(());
        }
        self.in_transaction = false;
        self.conn.execute_batch("ROLLBACK;")?;
        Ok(())
    }

    fn find(
        &self,
        business_id: i64,
        diagnostic: bool,
    ) -> Result<Vec<BusinessSymptomRecord>, StoreError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT id, business_id, business_name, symptom_code, symptom_name,
                    symptom_diagnostic_raw, symptom_diagnostic
             FROM {TABLE}
             WHERE business_id = ? AND symptom_diagnostic = ?
             ORDER BY id"
        ))?;
        let rows = stmt.query_map(params![business_id, diagnostic], |r| {
            Ok(BusinessSymptomRecord {
                id: r.get(0)?,
                business_id: r.get(1)?,
                business_name: r.get(2)?,
                symptom_code: r.get(3)?,
                symptom_name: r.get(4)?,
                symptom_diagnostic_raw: r.get(5)?,
                symptom_diagnostic: r.get(6)?,
            })
        })?;
        let records = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    fn count(&self) -> Result<i64, StoreError> {
        let n: i64 = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {TABLE};"), [], |r| r.get(0))?;
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    fn sample(business_id: i64, diagnostic: Option<bool>) -> NewBusinessSymptom {
        NewBusinessSymptom {
            business_id,
            business_name: "Acme Bakery".into(),
            symptom_code: "SYMPT01".into(),
            symptom_name: "Stale Bread".into(),
            symptom_diagnostic_raw: diagnostic.map(|d| if d { "Yes" } else { "No" }.to_string()),
            symptom_diagnostic: diagnostic,
        }
    }

    #[test]
    fn insert_assigns_increasing_ids() -> Result<()> {
        let db = Database::open_in_memory()?;
        let mut s = db.session()?;
        s.begin()?;
        let a = s.insert(&sample(1004, Some(true)))?;
        let b = s.insert(&sample(1004, Some(true)))?;
        s.commit()?;
        assert!(b > a);
        assert_eq!(s.count()?, 2);
        Ok(())
    }

    #[test]
    fn find_filters_on_both_fields() -> Result<()> {
        let db = Database::open_in_memory()?;
        let mut s = db.session()?;
        s.begin()?;
        let hit = s.insert(&sample(1004, Some(true)))?;
        s.insert(&sample(1004, Some(false)))?;
        s.insert(&sample(1005, Some(true)))?;
        s.insert(&sample(1004, None))?;
        s.commit()?;

        let found = s.find(1004, true)?;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, hit);
        assert_eq!(found[0].symptom_diagnostic_raw.as_deref(), Some("Yes"));
        assert!(s.find(2000, true)?.is_empty());
        Ok(())
    }

    #[test]
    fn rollback_discards_uncommitted_rows() -> Result<()> {
        let db = Database::open_in_memory()?;
        let mut s = db.session()?;
        s.begin()?;
        s.insert(&sample(1, Some(true)))?;
        s.rollback()?;
        assert_eq!(s.count()?, 0);
        // nothing open: a second rollback is a no-op
        s.rollback()?;
        Ok(())
    }

    #[test]
    fn sessions_share_one_database() -> Result<()> {
        let db = Database::open_in_memory()?;
        let mut writer = db.session()?;
        writer.begin()?;
        writer.insert(&sample(9, Some(false)))?;
        writer.commit()?;

        let reader = db.session()?;
        assert_eq!(reader.find(9, false)?.len(), 1);
        Ok(())
    }

    #[test]
    fn on_disk_database_survives_reopen() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("symptoms.duckdb");
        let url = path.to_string_lossy().to_string();
        {
            let db = Database::open(&url)?;
            let mut s = db.session()?;
            s.begin()?;
            s.insert(&sample(42, Some(true)))?;
            s.commit()?;
        }
        let db = Database::open(&url)?;
        assert_eq!(db.session()?.find(42, true)?.len(), 1);
        Ok(())
    }
}
