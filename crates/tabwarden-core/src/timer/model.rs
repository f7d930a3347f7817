//! Timer model shared by the focus, self-destruct and lockdown controllers.
//!
//! Remaining time is always derived from a persisted `(started_at, duration)`
//! pair and the current wall clock, never from an in-memory counter, so a
//! restarted process lands exactly where the countdown stood.
//!
//! ```text
//! elapsed   = floor((now - started_at) / 1000)
//! remaining = duration - elapsed
//! ```

use serde::{Deserialize, Serialize};

/// Persisted countdown state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    /// Epoch milliseconds when this run (or pause) began.
    pub started_at_ms: i64,
    /// Countdown length in seconds, measured from `started_at_ms`.
    pub duration_secs: i64,
    pub running: bool,
}

impl TimerSnapshot {
    pub fn running(started_at_ms: i64, duration_secs: i64) -> Self {
        Self {
            started_at_ms,
            duration_secs,
            running: true,
        }
    }

    pub fn paused(at_ms: i64, remaining_secs: i64) -> Self {
        Self {
            started_at_ms: at_ms,
            duration_secs: remaining_secs,
            running: false,
        }
    }

    /// Remaining seconds at `now_ms`.
    ///
    /// A paused snapshot does not count down. May be negative (expired but not
    /// finalized yet) or larger than `duration_secs` (clock skew).
    pub fn remaining_at(&self, now_ms: i64) -> i64 {
        if self.running {
            remaining_secs(self.duration_secs, elapsed_secs(now_ms, self.started_at_ms))
        } else {
            self.duration_secs
        }
    }

    pub fn is_expired_at(&self, now_ms: i64) -> bool {
        self.remaining_at(now_ms) <= 0
    }
}

/// Whole seconds elapsed since `started_at_ms`, floored.
///
/// Negative when `started_at_ms` lies in the future.
pub fn elapsed_secs(now_ms: i64, started_at_ms: i64) -> i64 {
    now_ms.saturating_sub(started_at_ms).div_euclid(1000)
}

pub fn remaining_secs(duration_secs: i64, elapsed_secs: i64) -> i64 {
    duration_secs.saturating_sub(elapsed_secs)
}

/// Clamp a derived remaining value into something displayable.
pub fn display_secs(remaining_secs: i64) -> u64 {
    remaining_secs.max(0) as u64
}

/// `mm:ss`, the way the popup renders the focus timer.
pub fn format_clock(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// `1h 2m 3s` / `2m 3s` / `3s`, the way the activity log renders durations.
pub fn format_span(secs: u64) -> String {
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let s = secs % 60;
    if hours > 0 {
        format!("{hours}h {minutes}m {s}s")
    } else if minutes > 0 {
        format!("{minutes}m {s}s")
    } else {
        format!("{s}s")
    }
}
