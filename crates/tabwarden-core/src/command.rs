//! Requests from UI surfaces to the background service.

use serde::{Deserialize, Serialize};

use crate::focus::FocusMode;
use crate::host::TabId;

/// Every request a UI surface can make. Each one is answered with a [`Response`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Command {
    StartFocusTimer {
        mode: FocusMode,
        #[serde(alias = "timeRemaining")]
        remaining_secs: i64,
    },
    PauseFocusTimer,
    ToggleFocusTimer,
    SwitchFocusMode {
        mode: FocusMode,
    },
    #[serde(alias = "startDestructTimer")]
    EnableSelfDestruct {
        #[serde(alias = "duration")]
        duration_secs: i64,
    },
    CancelSelfDestruct,
    #[serde(alias = "startLockdown")]
    EnableLockdown {
        #[serde(alias = "endTime")]
        end_time_ms: i64,
    },
    EnableLockdownFor {
        duration_secs: i64,
    },
    EnableLockdownWithFocus,
    SetMaxTabs {
        max_tabs: Option<u32>,
    },
    SubmitIntent {
        tab_id: TabId,
        intent: String,
    },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::StartFocusTimer { .. } => "startFocusTimer",
            Command::PauseFocusTimer => "pauseFocusTimer",
            Command::ToggleFocusTimer => "toggleFocusTimer",
            Command::SwitchFocusMode { .. } => "switchFocusMode",
            Command::EnableSelfDestruct { .. } => "enableSelfDestruct",
            Command::CancelSelfDestruct => "cancelSelfDestruct",
            Command::EnableLockdown { .. } => "enableLockdown",
            Command::EnableLockdownFor { .. } => "enableLockdownFor",
            Command::EnableLockdownWithFocus => "enableLockdownWithFocus",
            Command::SetMaxTabs { .. } => "setMaxTabs",
            Command::SubmitIntent { .. } => "submitIntent",
        }
    }
}

/// Acknowledgment for a [`Command`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Response {
    pub fn ok() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    pub fn ok_with(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }
}
