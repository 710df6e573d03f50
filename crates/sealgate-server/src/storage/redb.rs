//! Redb-backed durable record store.
//!
//! Uses Redb's ACID transactions with Copy-on-Write for crash safety. Stored
//! fingerprints and outstanding codes survive a restart; code expiry timers
//! do not, so a code issued before a crash never expires on its own.

use std::{path::Path, sync::Arc};

use redb::{Database, ReadableTable, TableDefinition};

use super::{RecordStore, StorageError};

/// Table: records
/// Key: `owner \0 field` (owner identifiers never contain NUL)
/// Value: field value
const RECORDS: TableDefinition<&str, &str> = TableDefinition::new("records");

/// Durable record store backed by Redb.
///
/// Thread-safe through Redb's internal locking. Clone is cheap (Arc).
#[derive(Clone)]
pub struct RedbRecordStore {
    db: Arc<Database>,
}

impl RedbRecordStore {
    /// Open or create a Redb database at the given path.
    ///
    /// Creates the RECORDS table if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Io` if the database cannot be opened or created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let db = Database::create(path.as_ref()).map_err(io)?;

        let txn = db.begin_write().map_err(io)?;
        {
            let _ = txn.open_table(RECORDS).map_err(io)?;
        }
        txn.commit().map_err(io)?;

        Ok(Self { db: Arc::new(db) })
    }
}

impl RecordStore for RedbRecordStore {
    fn get(&self, owner: &str, field: &str) -> Result<Option<String>, StorageError> {
        let txn = self.db.begin_read().map_err(io)?;
        let table = txn.open_table(RECORDS).map_err(io)?;

        let key = record_key(owner, field);
        let value = table.get(key.as_str()).map_err(io)?;

        Ok(value.map(|v| v.value().to_string()))
    }

    fn set(&self, owner: &str, field: &str, value: &str) -> Result<(), StorageError> {
        let txn = self.db.begin_write().map_err(io)?;
        {
            let mut table = txn.open_table(RECORDS).map_err(io)?;
            let key = record_key(owner, field);
            table.insert(key.as_str(), value).map_err(io)?;
        }
        txn.commit().map_err(io)?;

        Ok(())
    }
}

fn record_key(owner: &str, field: &str) -> String {
    format!("{owner}\0{field}")
}

fn io(err: impl std::fmt::Display) -> StorageError {
    StorageError::Io(err.to_string())
}
