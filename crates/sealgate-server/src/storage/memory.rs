#![allow(clippy::disallowed_types, reason = "Synchronous in-memory operations only")]
#![allow(clippy::expect_used, reason = "Mutex poisoning should cause a panic")]

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use super::{RecordStore, StorageError};

/// In-memory record store for tests, simulation and store-less deployments.
///
/// One `HashMap` of rows, each a `HashMap` of fields, behind an
/// `Arc<Mutex<_>>` so clones share state.
#[derive(Clone, Default)]
pub struct MemoryRecordStore {
    rows: Arc<Mutex<HashMap<String, HashMap<String, String>>>>,
}

impl MemoryRecordStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of owners with at least one field written.
    pub fn owner_count(&self) -> usize {
        self.rows.lock().expect("Mutex poisoned").len()
    }
}

impl RecordStore for MemoryRecordStore {
    fn get(&self, owner: &str, field: &str) -> Result<Option<String>, StorageError> {
        let rows = self.rows.lock().expect("Mutex poisoned");
        Ok(rows.get(owner).and_then(|row| row.get(field)).cloned())
    }

    fn set(&self, owner: &str, field: &str, value: &str) -> Result<(), StorageError> {
        let mut rows = self.rows.lock().expect("Mutex poisoned");
        rows.entry(owner.to_string()).or_default().insert(field.to_string(), value.to_string());
        Ok(())
    }
}
