//! Core error types for tabwarden-core.
//!
//! Nothing in this crate is fatal to the host process. Store and host failures
//! are logged and retried on the next tick; validation failures are returned to
//! the command surface before any state is written.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for tabwarden-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Durable store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Rejected command input
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// Tab, notification or audio host failures
    #[error("Host error: {0}")]
    Host(#[from] HostError),
}

/// Durable store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to open the backing database
    #[error("Failed to open store at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Stored value could not be encoded or decoded
    #[error("Invalid stored value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Database is locked
    #[error("Store is locked")]
    Locked,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Unknown dot-path key
    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Data directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Command input rejected at the command boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Durations must be at least one second
    #[error("{field} must be at least 1 second (got {value})")]
    NonPositiveDuration { field: &'static str, value: i64 },

    /// Lockdown end time is not in the future
    #[error("Lockdown end time {end_time_ms} is not in the future")]
    EndTimeInPast { end_time_ms: i64 },

    /// Lockdown needs a tab cap
    #[error("Please set max tabs first")]
    MissingTabCap,

    /// Tab cap must allow at least one tab
    #[error("max tabs must be at least 1")]
    InvalidTabCap,

    /// The cap is frozen while a lockdown runs
    #[error("max tabs cannot change during a lockdown")]
    LockdownActive,

    /// Lockdown-with-focus needs a running focus timer
    #[error("Pomodoro timer is not running")]
    FocusNotRunning,

    /// Intent text is empty
    #[error("intent must not be empty")]
    EmptyIntent,
}

/// Failures reported by the host collaborators (tabs, notifications, audio).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    /// Tab no longer exists
    #[error("No tab with id {0}")]
    NoSuchTab(u32),

    /// Host channel is gone or refused the request
    #[error("{0}")]
    Unavailable(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg) => {
                if e.code == rusqlite::ErrorCode::DatabaseLocked
                    || e.code == rusqlite::ErrorCode::DatabaseBusy
                {
                    StoreError::Locked
                } else {
                    StoreError::QueryFailed(err.to_string())
                }
            }
            _ => StoreError::QueryFailed(err.to_string()),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
