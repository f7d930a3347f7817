use std::collections::HashMap;
use std::sync::Mutex;

use serde_json::Value;

use super::{StateStore, WriteBatch};
use crate::error::StoreError;

/// In-process store. Loses everything when dropped.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.lock().map(|v| v.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl StateStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let values = self.values.lock().map_err(|_| StoreError::Locked)?;
        Ok(values.get(key).cloned())
    }

    fn set_many(&self, batch: WriteBatch) -> Result<(), StoreError> {
        let mut values = self.values.lock().map_err(|_| StoreError::Locked)?;
        for (key, value) in batch.into_entries() {
            if value.is_null() {
                values.remove(&key);
            } else {
                values.insert(key, value);
            }
        }
        Ok(())
    }
}
