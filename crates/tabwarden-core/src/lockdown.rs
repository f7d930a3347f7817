//! Tab lockdown.
//!
//! While a lockdown runs, new tabs beyond the configured cap are refused (see
//! [`crate::admission`]). Existing tabs are never closed. The controller only
//! evaluates to notice the end time passing.
//!
//! The cap itself (`max_tabs`) lives in its own store key: it is shared with
//! the admission policy and outlives any single lockdown.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, StoreError, ValidationError};
use crate::events::{at, Event};
use crate::host::{Host, Priority};
use crate::storage::{keys, read, LockdownConfig, WriteBatch};
use crate::timer::elapsed_secs;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockdownState {
    pub active: bool,
    pub end_time_ms: Option<i64>,
}

impl LockdownState {
    /// Active with an end time still in the future.
    pub fn is_live(&self, now_ms: i64) -> bool {
        self.active && self.end_time_ms.is_some_and(|end| now_ms < end)
    }

    /// Marked active but past (or missing) its end time.
    pub fn is_stale(&self, now_ms: i64) -> bool {
        self.active && !self.is_live(now_ms)
    }

    pub fn remaining_secs(&self, now_ms: i64) -> Option<i64> {
        let end = self.end_time_ms.filter(|_| self.active)?;
        Some(-elapsed_secs(now_ms, end))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockdownStatus {
    pub active: bool,
    pub end_time_ms: Option<i64>,
    pub remaining_secs: Option<i64>,
    pub max_tabs: Option<u32>,
}

fn cleared() -> WriteBatch {
    WriteBatch::new()
        .put(keys::LOCKDOWN_ACTIVE, false)
        .clear(keys::LOCKDOWN_END_TIME_MS)
}

pub struct LockdownController {
    host: Host,
    config: LockdownConfig,
    scheduled: bool,
    /// End time of the lockdown this controller is counting down to.
    watched_end_ms: Option<i64>,
}

impl LockdownController {
    pub fn new(host: Host, config: LockdownConfig) -> Self {
        Self {
            host,
            config,
            scheduled: false,
            watched_end_ms: None,
        }
    }

    pub fn is_scheduled(&self) -> bool {
        self.scheduled
    }

    pub fn tick_ms(&self) -> u64 {
        self.config.tick_ms
    }

    pub fn state(&self) -> Result<LockdownState, StoreError> {
        let store = self.host.store.as_ref();
        Ok(LockdownState {
            active: read(store, keys::LOCKDOWN_ACTIVE)?.unwrap_or(false),
            end_time_ms: read(store, keys::LOCKDOWN_END_TIME_MS)?,
        })
    }

    /// The configured tab cap. A stored zero is treated as unset.
    pub fn max_tabs(&self) -> Result<Option<u32>, StoreError> {
        Ok(read::<u32>(self.host.store.as_ref(), keys::MAX_TABS)?.filter(|n| *n > 0))
    }

    pub fn status(&self, now_ms: i64) -> Result<LockdownStatus, StoreError> {
        let active = self.is_active(now_ms)?;
        let state = self.state()?;
        Ok(LockdownStatus {
            active,
            end_time_ms: state.end_time_ms.filter(|_| active),
            remaining_secs: state.remaining_secs(now_ms).filter(|_| active),
            max_tabs: self.max_tabs()?,
        })
    }

    /// Whether a lockdown is in force at `now_ms`.
    ///
    /// Any caller observing an expired lockdown collapses it to inactive.
    pub fn is_active(&self, now_ms: i64) -> Result<bool, StoreError> {
        let state = self.state()?;
        if state.is_stale(now_ms) {
            tracing::debug!(end_time_ms = ?state.end_time_ms, "collapsing expired lockdown");
            if let Err(e) = self.host.store.set_many(cleared()) {
                tracing::warn!(error = %e, "could not clear expired lockdown");
            }
            return Ok(false);
        }
        Ok(state.is_live(now_ms))
    }

    fn require_cap(&self) -> Result<u32, CoreError> {
        Ok(self.max_tabs()?.ok_or(ValidationError::MissingTabCap)?)
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self, end_time_ms: i64, now_ms: i64) -> Result<Event, CoreError> {
        let max_tabs = self.require_cap()?;
        if end_time_ms <= now_ms {
            return Err(ValidationError::EndTimeInPast { end_time_ms }.into());
        }

        self.host.store.set_many(
            WriteBatch::new()
                .put(keys::LOCKDOWN_ACTIVE, true)
                .put(keys::LOCKDOWN_END_TIME_MS, end_time_ms),
        )?;
        self.scheduled = true;
        self.watched_end_ms = Some(end_time_ms);
        tracing::info!(end_time_ms, max_tabs, "lockdown started");

        Ok(Event::LockdownStarted {
            end_time_ms,
            max_tabs,
            at: at(now_ms),
        })
    }

    /// Lock down for a fixed number of seconds from now.
    pub fn start_for(&mut self, duration_secs: i64, now_ms: i64) -> Result<Event, CoreError> {
        if duration_secs < 1 {
            return Err(ValidationError::NonPositiveDuration {
                field: "lockdown duration",
                value: duration_secs,
            }
            .into());
        }
        self.start(now_ms.saturating_add(duration_secs.saturating_mul(1000)), now_ms)
    }

    /// Lock down until the running focus interval ends.
    ///
    /// `focus_remaining` is copied once; later pauses of the focus timer do
    /// not move the lockdown end.
    pub fn start_with_focus(&mut self, focus_remaining: Option<i64>, now_ms: i64) -> Result<Event, CoreError> {
        self.require_cap()?;
        match focus_remaining {
            Some(remaining) if remaining > 0 => {
                self.start(now_ms.saturating_add(remaining.saturating_mul(1000)), now_ms)
            }
            _ => Err(ValidationError::FocusNotRunning.into()),
        }
    }

    /// Set or clear the tab cap. Frozen while a lockdown is in force.
    pub fn set_max_tabs(&self, max_tabs: Option<u32>, now_ms: i64) -> Result<Event, CoreError> {
        if max_tabs == Some(0) {
            return Err(ValidationError::InvalidTabCap.into());
        }
        if self.is_active(now_ms)? {
            return Err(ValidationError::LockdownActive.into());
        }

        let batch = match max_tabs {
            Some(n) => WriteBatch::new().put(keys::MAX_TABS, n),
            None => WriteBatch::new().clear(keys::MAX_TABS),
        };
        self.host.store.set_many(batch)?;
        tracing::info!(?max_tabs, "tab cap changed");
        Ok(Event::MaxTabsChanged { max_tabs })
    }

    // ── Evaluation ───────────────────────────────────────────────────

    pub fn evaluate(&mut self, now_ms: i64) -> Option<Event> {
        let state = match self.state() {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!(error = %e, "lockdown state unreadable; retrying next tick");
                return None;
            }
        };

        if !state.active {
            // An observer may have collapsed the lockdown we were watching.
            let lapsed = self.watched_end_ms.is_some_and(|end| now_ms >= end);
            self.scheduled = false;
            self.watched_end_ms = None;
            return lapsed.then(|| self.announce_end(now_ms));
        }
        if state.is_live(now_ms) {
            return None;
        }

        if let Err(e) = self.host.store.set_many(cleared()) {
            tracing::warn!(error = %e, "could not clear lockdown; retrying next tick");
            return None;
        }
        self.scheduled = false;
        self.watched_end_ms = None;
        Some(self.announce_end(now_ms))
    }

    fn announce_end(&self, now_ms: i64) -> Event {
        self.host
            .notifier
            .notify("Tab Lockdown", "Lockdown period has ended", Priority::Normal);
        tracing::info!("lockdown ended");
        Event::LockdownEnded { at: at(now_ms) }
    }

    /// Resume a lockdown that is still in force; clear an expired one silently.
    pub fn recover(&mut self, now_ms: i64) {
        let state = match self.state() {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!(error = %e, "lockdown state unreadable at start-up");
                self.scheduled = true;
                return;
            }
        };

        if state.is_live(now_ms) {
            tracing::info!(end_time_ms = ?state.end_time_ms, "resuming lockdown");
            self.scheduled = true;
            self.watched_end_ms = state.end_time_ms;
        } else if state.active {
            tracing::info!("lockdown expired while stopped; clearing");
            if let Err(e) = self.host.store.set_many(cleared()) {
                tracing::warn!(error = %e, "could not clear expired lockdown");
            }
        }
    }
}
