mod config;
pub mod database;
pub mod keys;
mod memory;

pub use config::{
    AdmissionConfig, AudioConfig, CapEviction, Config, DestructConfig, FocusConfig,
    LockdownConfig, NotificationsConfig,
};
pub use database::SqliteStore;
pub use memory::MemoryStore;

use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{ConfigError, StoreError};

/// Durable key/value store; the single authority for timer state after a restart.
///
/// Values are JSON. Absent keys mean "never configured". Writing `Value::Null`
/// through [`StateStore::set_many`] deletes the key.
pub trait StateStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    /// Apply every entry of the batch together.
    fn set_many(&self, batch: WriteBatch) -> Result<(), StoreError>;

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.set_many(WriteBatch::new().clear(key))
    }
}

/// A set of key writes applied in one `set_many` call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    entries: Vec<(String, Value)>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.entries.push((key.to_string(), value.into()));
        self
    }

    pub fn clear(self, key: &str) -> Self {
        self.put(key, Value::Null)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[(String, Value)] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<(String, Value)> {
        self.entries
    }
}

/// Read and decode a key.
///
/// A value that no longer decodes into `T` is stale state from an older or
/// partially written record: it is logged and read as absent. Store I/O
/// failures are returned so the caller can retry on its next tick.
pub fn read<T: DeserializeOwned>(store: &dyn StateStore, key: &str) -> Result<Option<T>, StoreError> {
    let Some(value) = store.get(key)? else {
        return Ok(None);
    };
    if value.is_null() {
        return Ok(None);
    }
    match serde_json::from_value(value) {
        Ok(v) => Ok(Some(v)),
        Err(e) => {
            tracing::warn!(key, error = %e, "ignoring undecodable stored value");
            Ok(None)
        }
    }
}

/// Returns the data directory.
///
/// `TABWARDEN_DATA_DIR` wins when set; otherwise `~/.config/tabwarden[-dev]/`
/// based on `TABWARDEN_ENV`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("TABWARDEN_DATA_DIR") {
        Some(custom) => PathBuf::from(custom),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("TABWARDEN_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("tabwarden-dev")
            } else {
                base_dir.join("tabwarden")
            }
        }
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
