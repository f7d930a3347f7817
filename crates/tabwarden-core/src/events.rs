use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::focus::FocusMode;
use crate::host::TabId;

/// Every state change in the system produces an Event.
/// The host bridge forwards them to UI surfaces; tests assert on them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    FocusStarted {
        mode: FocusMode,
        remaining_secs: i64,
        at: DateTime<Utc>,
    },
    FocusPaused {
        mode: FocusMode,
        remaining_secs: i64,
        at: DateTime<Utc>,
    },
    FocusModeSwitched {
        mode: FocusMode,
        remaining_secs: i64,
        at: DateTime<Utc>,
    },
    /// Switch requested while the timer was running; nothing changed.
    FocusModeSwitchRejected {
        requested: FocusMode,
        current: FocusMode,
        at: DateTime<Utc>,
    },
    /// Republished remaining time for display.
    FocusTick {
        mode: FocusMode,
        remaining_secs: i64,
    },
    FocusCompleted {
        mode: FocusMode,
        at: DateTime<Utc>,
    },
    DestructEnabled {
        duration_secs: i64,
        at: DateTime<Utc>,
    },
    DestructWarning {
        remaining_secs: i64,
        at: DateTime<Utc>,
    },
    DestructExpired {
        closed_tabs: Vec<TabId>,
        at: DateTime<Utc>,
    },
    DestructCancelled {
        at: DateTime<Utc>,
    },
    TabRegistered {
        tab_id: TabId,
    },
    LockdownStarted {
        end_time_ms: i64,
        max_tabs: u32,
        at: DateTime<Utc>,
    },
    LockdownEnded {
        at: DateTime<Utc>,
    },
    /// Lockdown refused a new tab and closed it.
    TabBlocked {
        tab_id: TabId,
        max_tabs: u32,
        at: DateTime<Utc>,
    },
    /// The soft cap closed a tab outside of lockdown.
    TabEvicted {
        tab_id: TabId,
        max_tabs: u32,
        at: DateTime<Utc>,
    },
    MaxTabsChanged {
        max_tabs: Option<u32>,
    },
}

/// Convert epoch milliseconds to a UTC timestamp, clamping unrepresentable values to the epoch.
pub fn at(now_ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(now_ms).unwrap_or_default()
}
