//! Self-destruct countdown.
//!
//! Closes every tab opened while the countdown runs once it expires.
//!
//! ## Phases
//!
//! ```text
//! Idle -> Running -> Warning -> Expired -> Idle
//! ```
//!
//! `Warning` is entered once when `0 < remaining <= warning_secs`: a looping
//! warning sound starts and a one-shot notification is raised. The persisted
//! `warning_played` flag keeps later ticks (and restarts) from re-entering it.
//! `Expired` stops the warning, closes the tracked tabs and clears every field
//! in one batch.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{CoreError, StoreError, ValidationError};
use crate::events::{at, Event};
use crate::host::{AudioOwner, Host, Priority, Sound, TabId};
use crate::storage::{keys, read, DestructConfig, StateStore, WriteBatch};
use crate::timer::TimerSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DestructPhase {
    Idle,
    Running,
    Warning,
    Expired,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelfDestructState {
    pub timer: Option<TimerSnapshot>,
    /// Only meaningful while `timer` is set.
    pub tracked_tab_ids: Vec<TabId>,
    pub warning_played: bool,
}

impl SelfDestructState {
    pub fn phase(&self, now_ms: i64, warning_secs: i64) -> DestructPhase {
        match self.timer {
            None => DestructPhase::Idle,
            Some(timer) => {
                let remaining = timer.remaining_at(now_ms);
                if remaining <= 0 {
                    DestructPhase::Expired
                } else if remaining <= warning_secs {
                    DestructPhase::Warning
                } else {
                    DestructPhase::Running
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestructStatus {
    pub phase: DestructPhase,
    pub remaining_secs: Option<i64>,
    pub tracked_tabs: usize,
    pub warning_played: bool,
}

/// Result of reading the persisted fields; `partial` marks a half-written timer.
struct Loaded {
    state: SelfDestructState,
    partial: bool,
}

fn load(store: &dyn StateStore) -> Result<Loaded, StoreError> {
    let duration: Option<i64> = read(store, keys::DESTRUCT_DURATION_SECS)?;
    let started: Option<i64> = read(store, keys::DESTRUCT_STARTED_AT_MS)?;
    let (timer, partial) = match (started, duration) {
        (Some(started), Some(duration)) if duration > 0 => {
            (Some(TimerSnapshot::running(started, duration)), false)
        }
        (None, None) => (None, false),
        _ => (None, true),
    };
    Ok(Loaded {
        state: SelfDestructState {
            timer,
            tracked_tab_ids: read(store, keys::DESTRUCT_TAB_IDS)?.unwrap_or_default(),
            warning_played: read(store, keys::DESTRUCT_WARNING_PLAYED)?.unwrap_or(false),
        },
        partial,
    })
}

fn cleared() -> WriteBatch {
    WriteBatch::new()
        .clear(keys::DESTRUCT_DURATION_SECS)
        .clear(keys::DESTRUCT_STARTED_AT_MS)
        .put(keys::DESTRUCT_TAB_IDS, json!([]))
        .put(keys::DESTRUCT_WARNING_PLAYED, false)
}

/// Dedupe while keeping first-registration order.
fn unique(ids: &[TabId]) -> Vec<TabId> {
    let mut seen = Vec::with_capacity(ids.len());
    for id in ids {
        if !seen.contains(id) {
            seen.push(*id);
        }
    }
    seen
}

pub struct SelfDestructController {
    host: Host,
    config: DestructConfig,
    /// Whether periodic evaluation is running. Transient; rebuilt by `recover`.
    scheduled: bool,
}

impl SelfDestructController {
    pub fn new(host: Host, config: DestructConfig) -> Self {
        Self {
            host,
            config,
            scheduled: false,
        }
    }

    pub fn is_scheduled(&self) -> bool {
        self.scheduled
    }

    pub fn state(&self) -> Result<SelfDestructState, StoreError> {
        Ok(load(self.host.store.as_ref())?.state)
    }

    pub fn status(&self, now_ms: i64) -> Result<DestructStatus, StoreError> {
        let state = self.state()?;
        Ok(DestructStatus {
            phase: state.phase(now_ms, self.config.warning_secs),
            remaining_secs: state.timer.map(|t| t.remaining_at(now_ms)),
            tracked_tabs: state.tracked_tab_ids.len(),
            warning_played: state.warning_played,
        })
    }

    /// Arm a fresh countdown of `duration_secs`, replacing any running one.
    pub fn enable(&mut self, duration_secs: i64, now_ms: i64) -> Result<Event, CoreError> {
        if duration_secs < 1 {
            return Err(ValidationError::NonPositiveDuration {
                field: "self-destruct duration",
                value: duration_secs,
            }
            .into());
        }

        self.host.store.set_many(
            WriteBatch::new()
                .put(keys::DESTRUCT_DURATION_SECS, duration_secs)
                .put(keys::DESTRUCT_STARTED_AT_MS, now_ms)
                .put(keys::DESTRUCT_TAB_IDS, json!([]))
                .put(keys::DESTRUCT_WARNING_PLAYED, false),
        )?;
        self.host.audio.stop(AudioOwner::SelfDestruct, now_ms);
        self.scheduled = true;
        tracing::info!(duration_secs, "self-destruct enabled");

        Ok(Event::DestructEnabled {
            duration_secs,
            at: at(now_ms),
        })
    }

    /// Track a newly created tab. Returns `false` when no countdown exists.
    ///
    /// Read-modify-write on the id list; a concurrent writer may drop an id,
    /// which only leaves that tab open at expiry.
    pub fn register_tab(&self, tab_id: TabId) -> Result<bool, StoreError> {
        let mut state = self.state()?;
        if state.timer.is_none() {
            return Ok(false);
        }
        state.tracked_tab_ids.push(tab_id);
        self.host.store.set_many(
            WriteBatch::new().put(keys::DESTRUCT_TAB_IDS, state.tracked_tab_ids),
        )?;
        tracing::debug!(tab_id, "tab registered for self-destruct");
        Ok(true)
    }

    /// One evaluation tick.
    pub fn evaluate(&mut self, now_ms: i64) -> Option<Event> {
        let state = match self.state() {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!(error = %e, "self-destruct state unreadable; retrying next tick");
                return None;
            }
        };

        let Some(timer) = state.timer else {
            if self.scheduled {
                tracing::debug!("self-destruct cleared externally; stopping evaluation");
            }
            self.scheduled = false;
            return None;
        };

        let remaining = timer.remaining_at(now_ms);
        tracing::debug!(remaining, warning_played = state.warning_played, "self-destruct check");

        if remaining <= 0 {
            return Some(self.expire(&state, now_ms));
        }

        if remaining <= self.config.warning_secs && !state.warning_played {
            if let Err(e) = self
                .host
                .store
                .set_many(WriteBatch::new().put(keys::DESTRUCT_WARNING_PLAYED, true))
            {
                tracing::warn!(error = %e, "could not persist warning flag; retrying next tick");
                return None;
            }
            self.host
                .audio
                .play_looping(AudioOwner::SelfDestruct, Sound::SelfDestructWarning);
            self.host.notifier.notify(
                "Self-Destruct Warning",
                &format!("Tabs will close in {remaining} seconds!"),
                Priority::High,
            );
            tracing::info!(remaining, "self-destruct warning raised");
            return Some(Event::DestructWarning {
                remaining_secs: remaining,
                at: at(now_ms),
            });
        }

        None
    }

    fn expire(&mut self, state: &SelfDestructState, now_ms: i64) -> Event {
        self.host.audio.stop(AudioOwner::SelfDestruct, now_ms);

        let targets = unique(&state.tracked_tab_ids);
        tracing::info!(tabs = ?targets, "self-destruct expired; closing tabs");
        for tab_id in &targets {
            if let Err(e) = self.host.tabs.close(*tab_id) {
                tracing::debug!(tab_id, error = %e, "tab already gone");
            }
        }

        match self.host.store.set_many(cleared()) {
            Ok(()) => self.scheduled = false,
            // Stay armed: the next tick sees the expired timer again and the
            // repeated close requests are harmless.
            Err(e) => tracing::warn!(error = %e, "could not clear self-destruct state"),
        }

        Event::DestructExpired {
            closed_tabs: targets,
            at: at(now_ms),
        }
    }

    /// Rebuild from persisted state after a restart.
    ///
    /// A countdown that expired while the process was down is finalized right
    /// away so its tabs are not left open.
    pub fn recover(&mut self, now_ms: i64) -> Option<Event> {
        let loaded = match load(self.host.store.as_ref()) {
            Ok(loaded) => loaded,
            Err(e) => {
                tracing::warn!(error = %e, "self-destruct state unreadable at start-up");
                self.scheduled = true;
                return None;
            }
        };

        if loaded.partial {
            tracing::warn!("discarding partially written self-destruct state");
            if let Err(e) = self.host.store.set_many(cleared()) {
                tracing::warn!(error = %e, "could not clear partial self-destruct state");
            }
            return None;
        }

        let timer = loaded.state.timer?;
        if loaded.state.warning_played {
            // The host may still be looping the warning from the previous run.
            self.host.audio.adopt(AudioOwner::SelfDestruct);
        }
        let remaining = timer.remaining_at(now_ms);
        if remaining > 0 {
            tracing::info!(remaining, "resuming self-destruct countdown");
            self.scheduled = true;
            None
        } else {
            Some(self.expire(&loaded.state, now_ms))
        }
    }

    /// Drop the countdown without closing anything.
    pub fn cancel(&mut self, now_ms: i64) -> Result<Option<Event>, StoreError> {
        let state = self.state()?;
        self.host.store.set_many(cleared())?;
        self.host.audio.stop(AudioOwner::SelfDestruct, now_ms);
        self.scheduled = false;
        Ok(state.timer.map(|_| {
            tracing::info!("self-destruct cancelled");
            Event::DestructCancelled { at: at(now_ms) }
        }))
    }
}
