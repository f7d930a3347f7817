//! Durable store key names.
//!
//! Each timer is spread over several keys rather than one blob so that a
//! partially written record degrades to "not configured" field by field.

pub const DESTRUCT_DURATION_SECS: &str = "destruct_duration_secs";
pub const DESTRUCT_STARTED_AT_MS: &str = "destruct_started_at_ms";
pub const DESTRUCT_TAB_IDS: &str = "destruct_tab_ids";
pub const DESTRUCT_WARNING_PLAYED: &str = "destruct_warning_played";

pub const FOCUS_MODE: &str = "focus_mode";
pub const FOCUS_RUNNING: &str = "focus_running";
pub const FOCUS_STARTED_AT_MS: &str = "focus_started_at_ms";
pub const FOCUS_DURATION_SECS: &str = "focus_duration_secs";
/// Display value republished on every focus tick.
pub const FOCUS_TIME_REMAINING_SECS: &str = "focus_time_remaining_secs";

pub const LOCKDOWN_ACTIVE: &str = "lockdown_active";
pub const LOCKDOWN_END_TIME_MS: &str = "lockdown_end_time_ms";

/// Tab cap shared by lockdown and the admission policy.
pub const MAX_TABS: &str = "max_tabs";

pub const TAB_INTENTS: &str = "tab_intents";
