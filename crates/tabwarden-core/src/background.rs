//! The background service: one owner for every controller.
//!
//! All command handling, tab notifications and timer ticks funnel through
//! `&mut Background`, so store reads and writes never interleave. Every entry
//! point takes the current time explicitly and returns the events it caused.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::activity::ActivityTracker;
use crate::admission::AdmissionPolicy;
use crate::command::{Command, Response};
use crate::destruct::{DestructStatus, SelfDestructController};
use crate::error::{CoreError, StoreError};
use crate::events::Event;
use crate::focus::{FocusController, FocusStatus};
use crate::host::{Host, SilentNotifier, TabEvent};
use crate::lockdown::{LockdownController, LockdownStatus};
use crate::storage::Config;

/// The periodically evaluated controllers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerKind {
    SelfDestruct,
    Focus,
    Lockdown,
}

impl TimerKind {
    pub const ALL: [TimerKind; 3] = [TimerKind::SelfDestruct, TimerKind::Focus, TimerKind::Lockdown];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub focus: FocusStatus,
    pub destruct: DestructStatus,
    pub lockdown: LockdownStatus,
}

pub struct Background {
    config: Config,
    destruct: SelfDestructController,
    focus: FocusController,
    lockdown: LockdownController,
    admission: AdmissionPolicy,
    activity: ActivityTracker,
    host: Host,
}

impl Background {
    pub fn new(mut host: Host, config: Config) -> Self {
        if !config.notifications.enabled {
            host.notifier = Arc::new(SilentNotifier);
        }
        Self {
            destruct: SelfDestructController::new(host.clone(), config.destruct.clone()),
            focus: FocusController::new(host.clone(), config.focus.clone()),
            lockdown: LockdownController::new(host.clone(), config.lockdown.clone()),
            admission: AdmissionPolicy::new(host.clone(), &config.admission),
            activity: ActivityTracker::new(host.clone()),
            host,
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn activity(&self) -> &ActivityTracker {
        &self.activity
    }

    pub fn is_scheduled(&self, kind: TimerKind) -> bool {
        match kind {
            TimerKind::SelfDestruct => self.destruct.is_scheduled(),
            TimerKind::Focus => self.focus.is_scheduled(),
            TimerKind::Lockdown => self.lockdown.is_scheduled(),
        }
    }

    pub fn tick_interval(&self, kind: TimerKind) -> Duration {
        let ms = match kind {
            TimerKind::SelfDestruct => self.config.destruct.tick_ms,
            TimerKind::Focus => self.config.focus.tick_ms,
            TimerKind::Lockdown => self.lockdown.tick_ms(),
        };
        Duration::from_millis(ms.max(1))
    }

    pub fn audio_poll_interval(&self) -> Duration {
        Duration::from_millis(self.config.audio.poll_ms.max(1))
    }

    pub fn status(&self, now_ms: i64) -> Result<ServiceStatus, StoreError> {
        Ok(ServiceStatus {
            focus: self.focus.status(now_ms)?,
            destruct: self.destruct.status(now_ms)?,
            lockdown: self.lockdown.status(now_ms)?,
        })
    }

    /// Rebuild every controller from the store after a (re)start.
    pub fn recover(&mut self, now_ms: i64) -> Vec<Event> {
        tracing::info!("recovering persisted timers");
        let mut events = Vec::new();
        events.extend(self.destruct.recover(now_ms));
        events.extend(self.focus.recover(now_ms));
        self.lockdown.recover(now_ms);
        events
    }

    pub fn tick(&mut self, kind: TimerKind, now_ms: i64) -> Vec<Event> {
        let event = match kind {
            TimerKind::SelfDestruct => self.destruct.evaluate(now_ms),
            TimerKind::Focus => self.focus.evaluate(now_ms),
            TimerKind::Lockdown => self.lockdown.evaluate(now_ms),
        };
        event.into_iter().collect()
    }

    /// Close the audio sandbox if its cleanup deadline passed.
    pub fn poll_audio(&self, now_ms: i64) -> bool {
        self.host.audio.poll(now_ms)
    }

    pub fn on_tab_event(&mut self, event: TabEvent, now_ms: i64) -> Vec<Event> {
        let result = match event {
            TabEvent::Created { tab } => {
                let (admission, events) =
                    self.admission
                        .on_tab_created(tab.id, now_ms, &self.lockdown, &self.destruct);
                tracing::debug!(tab_id = tab.id, ?admission, "tab admission");
                return events;
            }
            TabEvent::Updated { tab_id, change, tab } => {
                self.activity
                    .on_updated(tab_id, &change, tab.url.as_deref(), now_ms)
            }
            TabEvent::Activated { tab_id } => self.activity.on_activated(tab_id, now_ms),
            TabEvent::Removed { tab_id } => self.activity.on_removed(tab_id, now_ms),
        };
        if let Err(e) = result {
            tracing::warn!(error = %e, "activity update dropped");
        }
        Vec::new()
    }

    pub fn handle(&mut self, command: Command, now_ms: i64) -> (Response, Vec<Event>) {
        let name = command.name();
        tracing::debug!(command = name, "handling command");

        match self.dispatch(command, now_ms) {
            Ok((Some(message), events)) => (Response::ok_with(message), events),
            Ok((None, events)) => (Response::ok(), events),
            Err(CoreError::Validation(e)) => {
                tracing::info!(command = name, reason = %e, "command rejected");
                (Response::rejected(e.to_string()), Vec::new())
            }
            Err(e) => {
                tracing::warn!(command = name, error = %e, "command failed");
                (Response::rejected(e.to_string()), Vec::new())
            }
        }
    }

    fn dispatch(&mut self, command: Command, now_ms: i64) -> Result<(Option<String>, Vec<Event>), CoreError> {
        let event = match command {
            Command::StartFocusTimer { mode, remaining_secs } => {
                self.focus.start(mode, remaining_secs, now_ms)?
            }
            Command::PauseFocusTimer => self.focus.pause(now_ms)?,
            Command::ToggleFocusTimer => self.focus.toggle(now_ms)?,
            Command::SwitchFocusMode { mode } => {
                let event = self.focus.switch_mode(mode, now_ms)?;
                if matches!(event, Event::FocusModeSwitchRejected { .. }) {
                    return Ok((
                        Some("Pause the timer before switching modes".to_string()),
                        vec![event],
                    ));
                }
                event
            }
            Command::EnableSelfDestruct { duration_secs } => {
                self.destruct.enable(duration_secs, now_ms)?
            }
            Command::CancelSelfDestruct => {
                let events = self.destruct.cancel(now_ms)?.into_iter().collect();
                return Ok((None, events));
            }
            Command::EnableLockdown { end_time_ms } => self.lockdown.start(end_time_ms, now_ms)?,
            Command::EnableLockdownFor { duration_secs } => {
                self.lockdown.start_for(duration_secs, now_ms)?
            }
            Command::EnableLockdownWithFocus => {
                let remaining = self.focus.running_remaining(now_ms)?;
                self.lockdown.start_with_focus(remaining, now_ms)?
            }
            Command::SetMaxTabs { max_tabs } => self.lockdown.set_max_tabs(max_tabs, now_ms)?,
            Command::SubmitIntent { tab_id, intent } => {
                self.activity.submit_intent(tab_id, &intent, now_ms)?;
                let destination = crate::activity::intent_destination(&intent).map(|u| u.to_string());
                return Ok((destination, Vec::new()));
            }
        };
        Ok((None, vec![event]))
    }
}
