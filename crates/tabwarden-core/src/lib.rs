//! # Tabwarden Core Library
//!
//! Resumable tab timers for a browser extension background service: a
//! self-destruct countdown that closes the tabs opened while it ran, a
//! Pomodoro focus timer, and a tab lockdown that refuses new tabs over a cap.
//!
//! ## Architecture
//!
//! - **Timer model**: remaining time is derived from a persisted
//!   `(started_at, duration)` pair and the wall clock, so every timer survives
//!   a process restart without drift
//! - **Controllers**: synchronous state machines that take `now` explicitly
//!   and return the [`Event`]s they produced
//! - **Host seams**: tabs, notifications, audio and the durable store are
//!   traits; the CLI bridges them to a real host
//! - **Runtime**: a single tokio task owns the [`Background`] service and
//!   drives each armed controller at its own cadence
//!
//! ## Key Components
//!
//! - [`SelfDestructController`], [`FocusController`], [`LockdownController`]
//! - [`AdmissionPolicy`]: what happens to a newly created tab
//! - [`ActivityTracker`]: per-tab intent and browsing-time log
//! - [`SqliteStore`] / [`MemoryStore`]: durable key/value state
//! - [`Config`]: TOML configuration

pub mod activity;
pub mod admission;
pub mod background;
pub mod clock;
pub mod command;
pub mod destruct;
pub mod error;
pub mod events;
pub mod focus;
pub mod host;
pub mod lockdown;
pub mod runtime;
pub mod storage;
pub mod timer;

#[cfg(test)]
mod test_support;

pub use activity::{ActivityFilter, ActivityTracker, TabIntentRecord, UrlVisit};
pub use admission::{Admission, AdmissionPolicy};
pub use background::{Background, ServiceStatus, TimerKind};
pub use clock::{Clock, ManualClock, SystemClock};
pub use command::{Command, Response};
pub use destruct::{DestructPhase, DestructStatus, SelfDestructController, SelfDestructState};
pub use error::{ConfigError, CoreError, HostError, Result, StoreError, ValidationError};
pub use events::Event;
pub use focus::{FocusController, FocusMode, FocusState, FocusStatus};
pub use host::{
    AudioChannel, AudioOwner, AudioSandbox, Host, LoadStatus, Notifier, Priority, SilentNotifier, Sound, Tab,
    TabChange, TabEvent, TabHost, TabId,
};
pub use lockdown::{LockdownController, LockdownState, LockdownStatus};
pub use runtime::{Inbound, ServiceHandle};
pub use storage::{CapEviction, Config, MemoryStore, SqliteStore, StateStore, WriteBatch};
pub use timer::TimerSnapshot;
