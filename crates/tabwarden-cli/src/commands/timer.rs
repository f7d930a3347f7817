use clap::Subcommand;
use tabwarden_core::{Command, FocusMode};

use super::apply;

#[derive(Subcommand)]
pub enum FocusAction {
    /// Start a focus or break interval
    Start {
        /// focus, shortBreak or longBreak
        #[arg(long, default_value = "focus")]
        mode: FocusMode,
        /// Seconds to run (defaults to the mode's full length)
        #[arg(long)]
        secs: Option<i64>,
    },
    /// Pause the running interval
    Pause,
    /// Pause when running, otherwise resume
    Toggle,
    /// Switch mode (only while stopped)
    Mode {
        mode: FocusMode,
    },
}

#[derive(Subcommand)]
pub enum DestructAction {
    /// Arm a countdown; tabs opened before it ends are closed when it does
    Enable {
        /// Countdown length in minutes
        #[arg(long, conflicts_with = "secs")]
        minutes: Option<i64>,
        /// Countdown length in seconds
        #[arg(long)]
        secs: Option<i64>,
    },
    /// Drop the countdown without closing anything
    Cancel,
}

#[derive(Subcommand)]
pub enum LockdownAction {
    /// Lock down for a number of minutes
    For {
        minutes: i64,
    },
    /// Lock down until an epoch-millisecond end time
    Until {
        end_time_ms: i64,
    },
    /// Lock down until the running focus interval ends
    WithFocus,
}

pub fn run_focus(action: FocusAction) -> Result<(), Box<dyn std::error::Error>> {
    let command = match action {
        FocusAction::Start { mode, secs } => {
            let remaining_secs = match secs {
                Some(secs) => secs,
                None => {
                    let (bg, _) = super::offline_service()?;
                    mode.base_secs(&bg.config().focus)
                }
            };
            Command::StartFocusTimer { mode, remaining_secs }
        }
        FocusAction::Pause => Command::PauseFocusTimer,
        FocusAction::Toggle => Command::ToggleFocusTimer,
        FocusAction::Mode { mode } => Command::SwitchFocusMode { mode },
    };
    apply(command)
}

pub fn run_destruct(action: DestructAction) -> Result<(), Box<dyn std::error::Error>> {
    let command = match action {
        DestructAction::Enable { minutes, secs } => {
            let duration_secs = match (minutes, secs) {
                (Some(m), _) => m.saturating_mul(60),
                (None, Some(s)) => s,
                (None, None) => return Err("pass --minutes or --secs".into()),
            };
            Command::EnableSelfDestruct { duration_secs }
        }
        DestructAction::Cancel => Command::CancelSelfDestruct,
    };
    apply(command)
}

pub fn run_lockdown(action: LockdownAction) -> Result<(), Box<dyn std::error::Error>> {
    let command = match action {
        LockdownAction::For { minutes } => Command::EnableLockdownFor {
            duration_secs: minutes.saturating_mul(60),
        },
        LockdownAction::Until { end_time_ms } => Command::EnableLockdown { end_time_ms },
        LockdownAction::WithFocus => Command::EnableLockdownWithFocus,
    };
    apply(command)
}
