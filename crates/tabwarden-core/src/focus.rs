//! Focus-interval (Pomodoro) timer.
//!
//! Three named modes with fixed base durations. The persisted snapshot is the
//! only record of progress: `start` stores `(now, remaining)`, `pause` folds
//! the elapsed time back into a paused snapshot, and completion clears it so
//! the mode's full base duration applies again.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, StoreError, ValidationError};
use crate::events::{at, Event};
use crate::host::{AudioOwner, Host, Priority, Sound};
use crate::storage::{keys, read, FocusConfig, StateStore, WriteBatch};
use crate::timer::{display_secs, format_clock, TimerSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum FocusMode {
    #[default]
    #[serde(alias = "pomodoro")]
    Focus,
    ShortBreak,
    LongBreak,
}

impl FocusMode {
    pub fn base_secs(self, config: &FocusConfig) -> i64 {
        let minutes = match self {
            FocusMode::Focus => config.focus_minutes,
            FocusMode::ShortBreak => config.short_break_minutes,
            FocusMode::LongBreak => config.long_break_minutes,
        };
        i64::from(minutes) * 60
    }

    pub fn is_break(self) -> bool {
        !matches!(self, FocusMode::Focus)
    }

    fn completion_message(self) -> &'static str {
        if self.is_break() {
            "Break is over!"
        } else {
            "Time for a break!"
        }
    }
}

impl fmt::Display for FocusMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FocusMode::Focus => "focus",
            FocusMode::ShortBreak => "shortBreak",
            FocusMode::LongBreak => "longBreak",
        })
    }
}

impl FromStr for FocusMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "focus" | "pomodoro" => Ok(FocusMode::Focus),
            "shortBreak" | "short-break" | "short" => Ok(FocusMode::ShortBreak),
            "longBreak" | "long-break" | "long" => Ok(FocusMode::LongBreak),
            other => Err(format!("unknown focus mode: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusState {
    pub mode: FocusMode,
    /// `None` means the mode's full base duration is pending.
    pub timer: Option<TimerSnapshot>,
}

impl FocusState {
    pub fn is_running(&self) -> bool {
        self.timer.is_some_and(|t| t.running)
    }

    pub fn remaining_at(&self, now_ms: i64, config: &FocusConfig) -> i64 {
        match self.timer {
            Some(timer) => timer.remaining_at(now_ms),
            None => self.mode.base_secs(config),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusStatus {
    pub mode: FocusMode,
    pub running: bool,
    pub remaining_secs: u64,
    /// `mm:ss`
    pub display: String,
}

struct Loaded {
    state: FocusState,
    /// Running flag set without a usable snapshot.
    partial: bool,
}

fn load(store: &dyn StateStore) -> Result<Loaded, StoreError> {
    let mode = read(store, keys::FOCUS_MODE)?.unwrap_or_default();
    let running = read(store, keys::FOCUS_RUNNING)?.unwrap_or(false);
    let started: Option<i64> = read(store, keys::FOCUS_STARTED_AT_MS)?;
    let duration: Option<i64> = read(store, keys::FOCUS_DURATION_SECS)?;
    let timer = match (started, duration) {
        (Some(started_at_ms), Some(duration_secs)) => Some(TimerSnapshot {
            started_at_ms,
            duration_secs,
            running,
        }),
        _ => None,
    };
    Ok(Loaded {
        partial: running && timer.is_none(),
        state: FocusState { mode, timer },
    })
}

pub struct FocusController {
    host: Host,
    config: FocusConfig,
    scheduled: bool,
}

impl FocusController {
    pub fn new(host: Host, config: FocusConfig) -> Self {
        Self {
            host,
            config,
            scheduled: false,
        }
    }

    pub fn is_scheduled(&self) -> bool {
        self.scheduled
    }

    pub fn state(&self) -> Result<FocusState, StoreError> {
        Ok(load(self.host.store.as_ref())?.state)
    }

    pub fn status(&self, now_ms: i64) -> Result<FocusStatus, StoreError> {
        let state = self.state()?;
        let remaining = display_secs(state.remaining_at(now_ms, &self.config));
        Ok(FocusStatus {
            mode: state.mode,
            running: state.is_running(),
            remaining_secs: remaining,
            display: format_clock(remaining),
        })
    }

    /// Remaining seconds of a running timer, `None` when stopped or paused.
    pub fn running_remaining(&self, now_ms: i64) -> Result<Option<i64>, StoreError> {
        let state = self.state()?;
        Ok(state
            .timer
            .filter(|t| t.running)
            .map(|t| t.remaining_at(now_ms)))
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self, mode: FocusMode, remaining_secs: i64, now_ms: i64) -> Result<Event, CoreError> {
        if remaining_secs < 1 {
            return Err(ValidationError::NonPositiveDuration {
                field: "focus time remaining",
                value: remaining_secs,
            }
            .into());
        }

        self.host.store.set_many(
            WriteBatch::new()
                .put(keys::FOCUS_MODE, mode.to_string())
                .put(keys::FOCUS_RUNNING, true)
                .put(keys::FOCUS_STARTED_AT_MS, now_ms)
                .put(keys::FOCUS_DURATION_SECS, remaining_secs)
                .put(keys::FOCUS_TIME_REMAINING_SECS, remaining_secs),
        )?;
        self.scheduled = true;
        tracing::info!(%mode, remaining_secs, "focus timer started");

        Ok(Event::FocusStarted {
            mode,
            remaining_secs,
            at: at(now_ms),
        })
    }

    /// Pause when running, otherwise start the current mode where it left off.
    pub fn toggle(&mut self, now_ms: i64) -> Result<Event, CoreError> {
        let state = self.state()?;
        if state.is_running() {
            return Ok(self.pause(now_ms)?);
        }
        let mut remaining = state.remaining_at(now_ms, &self.config);
        if remaining <= 0 {
            remaining = state.mode.base_secs(&self.config);
        }
        self.start(state.mode, remaining, now_ms)
    }

    /// Freeze the countdown; a later `start` resumes from the returned remaining.
    pub fn pause(&mut self, now_ms: i64) -> Result<Event, StoreError> {
        let state = self.state()?;
        self.scheduled = false;

        let remaining = match state.timer.filter(|t| t.running) {
            Some(timer) => {
                let remaining = timer.remaining_at(now_ms).max(0);
                let paused = TimerSnapshot::paused(now_ms, remaining);
                self.host.store.set_many(
                    WriteBatch::new()
                        .put(keys::FOCUS_RUNNING, false)
                        .put(keys::FOCUS_STARTED_AT_MS, paused.started_at_ms)
                        .put(keys::FOCUS_DURATION_SECS, paused.duration_secs)
                        .put(keys::FOCUS_TIME_REMAINING_SECS, remaining),
                )?;
                remaining
            }
            None => {
                self.host
                    .store
                    .set_many(WriteBatch::new().put(keys::FOCUS_RUNNING, false))?;
                state.remaining_at(now_ms, &self.config).max(0)
            }
        };
        tracing::info!(mode = %state.mode, remaining, "focus timer paused");

        Ok(Event::FocusPaused {
            mode: state.mode,
            remaining_secs: remaining,
            at: at(now_ms),
        })
    }

    /// Change mode. Rejected (still acknowledged) while the timer runs.
    pub fn switch_mode(&mut self, mode: FocusMode, now_ms: i64) -> Result<Event, StoreError> {
        let state = self.state()?;
        if state.is_running() {
            tracing::info!(requested = %mode, current = %state.mode, "mode switch rejected while running");
            return Ok(Event::FocusModeSwitchRejected {
                requested: mode,
                current: state.mode,
                at: at(now_ms),
            });
        }

        let remaining = mode.base_secs(&self.config);
        self.host.store.set_many(
            WriteBatch::new()
                .put(keys::FOCUS_MODE, mode.to_string())
                .put(keys::FOCUS_RUNNING, false)
                .clear(keys::FOCUS_STARTED_AT_MS)
                .clear(keys::FOCUS_DURATION_SECS)
                .put(keys::FOCUS_TIME_REMAINING_SECS, remaining),
        )?;

        Ok(Event::FocusModeSwitched {
            mode,
            remaining_secs: remaining,
            at: at(now_ms),
        })
    }

    // ── Evaluation ───────────────────────────────────────────────────

    /// Call every second while scheduled.
    pub fn evaluate(&mut self, now_ms: i64) -> Option<Event> {
        let state = match self.state() {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!(error = %e, "focus state unreadable; retrying next tick");
                return None;
            }
        };

        let Some(timer) = state.timer.filter(|t| t.running) else {
            self.scheduled = false;
            return None;
        };

        let remaining = timer.remaining_at(now_ms);
        if remaining <= 0 {
            return Some(self.complete(state.mode, now_ms));
        }

        if let Err(e) = self
            .host
            .store
            .set_many(WriteBatch::new().put(keys::FOCUS_TIME_REMAINING_SECS, remaining))
        {
            tracing::debug!(error = %e, "could not publish focus remaining");
        }
        Some(Event::FocusTick {
            mode: state.mode,
            remaining_secs: remaining,
        })
    }

    fn complete(&mut self, mode: FocusMode, now_ms: i64) -> Event {
        self.scheduled = false;
        self.host
            .audio
            .play_once(AudioOwner::Focus, Sound::FocusComplete, now_ms);
        self.host
            .notifier
            .notify("Pomodoro Timer", mode.completion_message(), Priority::High);

        if let Err(e) = self.host.store.set_many(
            WriteBatch::new()
                .put(keys::FOCUS_RUNNING, false)
                .clear(keys::FOCUS_STARTED_AT_MS)
                .clear(keys::FOCUS_DURATION_SECS)
                .put(keys::FOCUS_TIME_REMAINING_SECS, mode.base_secs(&self.config)),
        ) {
            tracing::warn!(error = %e, "could not reset focus timer after completion");
        }
        tracing::info!(%mode, "focus interval completed");

        Event::FocusCompleted {
            mode,
            at: at(now_ms),
        }
    }

    /// Rebuild from persisted state after a restart.
    pub fn recover(&mut self, now_ms: i64) -> Option<Event> {
        let loaded = match load(self.host.store.as_ref()) {
            Ok(loaded) => loaded,
            Err(e) => {
                tracing::warn!(error = %e, "focus state unreadable at start-up");
                self.scheduled = true;
                return None;
            }
        };

        if loaded.partial {
            tracing::warn!("focus timer marked running without a snapshot; resetting");
            if let Err(e) = self
                .host
                .store
                .set_many(WriteBatch::new().put(keys::FOCUS_RUNNING, false))
            {
                tracing::warn!(error = %e, "could not reset partial focus state");
            }
            return None;
        }

        let timer = loaded.state.timer.filter(|t| t.running)?;
        let remaining = timer.remaining_at(now_ms);
        if remaining > 0 {
            tracing::info!(remaining, "resuming focus timer");
            self.scheduled = true;
            None
        } else {
            Some(self.complete(loaded.state.mode, now_ms))
        }
    }
}
