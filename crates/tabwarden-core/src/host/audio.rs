//! Exclusive audio output channel.
//!
//! The host exposes a single playback sandbox. Starting a sound implicitly
//! stops whatever was playing, so the channel tracks which controller owns the
//! current sound: a looping sound belongs to the controller that started it
//! until that controller stops it or another controller's sound pre-empts it.
//!
//! Playback completion is never observed. The sandbox is closed once an
//! estimated completion deadline passes, checked by [`AudioChannel::poll`].

use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use crate::error::HostError;
use crate::storage::AudioConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sound {
    SelfDestructWarning,
    FocusComplete,
}

impl Sound {
    pub fn file(self) -> &'static str {
        match self {
            Sound::SelfDestructWarning => "self-destruct.wav",
            Sound::FocusComplete => "pomodoro-complete.wav",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioOwner {
    SelfDestruct,
    Focus,
}

/// Host-side playback sandbox.
pub trait AudioSandbox: Send + Sync {
    /// Start `sound`, replacing anything currently playing.
    fn play(&self, sound: Sound, looping: bool) -> Result<(), HostError>;

    fn stop(&self) -> Result<(), HostError>;

    /// Tear the sandbox down. Must tolerate being called when already closed.
    fn close(&self) -> Result<(), HostError>;
}

#[derive(Debug, Default)]
struct ChannelState {
    owner: Option<AudioOwner>,
    looping: bool,
    open: bool,
    close_at_ms: Option<i64>,
}

pub struct AudioChannel {
    sandbox: Arc<dyn AudioSandbox>,
    config: AudioConfig,
    state: Mutex<ChannelState>,
}

impl AudioChannel {
    pub fn new(sandbox: Arc<dyn AudioSandbox>, config: AudioConfig) -> Self {
        Self {
            sandbox,
            config,
            state: Mutex::new(ChannelState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, ChannelState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn play_once(&self, owner: AudioOwner, sound: Sound, now_ms: i64) {
        self.start(owner, sound, false, Some(now_ms + self.config.once_close_delay_ms));
    }

    /// Loop `sound` until the owner stops it. The sandbox is kept alive.
    pub fn play_looping(&self, owner: AudioOwner, sound: Sound) {
        self.start(owner, sound, true, None);
    }

    fn start(&self, owner: AudioOwner, sound: Sound, looping: bool, close_at_ms: Option<i64>) {
        let mut state = self.state();
        if let Some(previous) = state.owner.filter(|p| *p != owner) {
            tracing::debug!(?previous, ?owner, "audio pre-empted");
        }
        if let Err(e) = self.sandbox.play(sound, looping) {
            tracing::warn!(sound = sound.file(), error = %e, "failed to play sound");
        }
        *state = ChannelState {
            owner: Some(owner),
            looping,
            open: true,
            close_at_ms,
        };
    }

    /// Take ownership of a looping sound the sandbox may still be playing
    /// from before a restart.
    ///
    /// Only an unowned channel can be adopted, so a sound started since the
    /// restart is never claimed by someone else.
    pub fn adopt(&self, owner: AudioOwner) -> bool {
        let mut state = self.state();
        if state.owner.is_some() {
            return false;
        }
        *state = ChannelState {
            owner: Some(owner),
            looping: true,
            open: true,
            close_at_ms: None,
        };
        true
    }

    /// Stop the current sound if `owner` still owns it.
    ///
    /// Returns `false` when another controller pre-empted the sound or nothing
    /// is playing; the channel is left untouched in that case.
    pub fn stop(&self, owner: AudioOwner, now_ms: i64) -> bool {
        let mut state = self.state();
        if state.owner != Some(owner) {
            return false;
        }
        if let Err(e) = self.sandbox.stop() {
            tracing::warn!(error = %e, "failed to stop audio");
        }
        state.owner = None;
        state.looping = false;
        state.close_at_ms = Some(now_ms + self.config.stop_close_delay_ms);
        true
    }

    /// Close the sandbox once its cleanup deadline has passed.
    pub fn poll(&self, now_ms: i64) -> bool {
        let mut state = self.state();
        match state.close_at_ms {
            Some(deadline) if state.open && now_ms >= deadline => {
                if let Err(e) = self.sandbox.close() {
                    tracing::debug!(error = %e, "ignoring audio sandbox close failure");
                }
                *state = ChannelState::default();
                true
            }
            _ => false,
        }
    }

    pub fn owner(&self) -> Option<AudioOwner> {
        self.state().owner
    }

    pub fn is_looping(&self) -> bool {
        self.state().looping
    }

    pub fn is_open(&self) -> bool {
        self.state().open
    }
}
