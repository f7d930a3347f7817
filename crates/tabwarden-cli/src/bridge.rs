//! JSON-lines host bridge.
//!
//! The browser side (an extension's native-messaging shim, or a test) writes
//! one JSON object per line to stdin and reads one per line from stdout.
//!
//! ```text
//! in:  {"type":"command","id":7,"command":{"action":"enableSelfDestruct","duration_secs":120}}
//! in:  {"type":"tab","event":{"type":"created","tab":{"id":42}}}
//! in:  {"type":"tabs","tabs":[{"id":1},{"id":42}]}
//! out: {"type":"response","id":7,"response":{"success":true}}
//! out: {"type":"close_tab","tab_id":42}
//! out: {"type":"event","event":{"type":"destruct_expired",...}}
//! ```

use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use tabwarden_core::{
    AudioSandbox, Command, Event, HostError, Notifier, Priority, Response, Sound, Tab, TabEvent, TabHost,
    TabId,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BridgeIn {
    Command {
        #[serde(default)]
        id: Option<u64>,
        command: Command,
    },
    Tab {
        event: TabEvent,
    },
    /// Full list of open tabs, in enumeration order.
    Tabs {
        tabs: Vec<Tab>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BridgeOut {
    Response {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<u64>,
        response: Response,
    },
    Event {
        event: Event,
    },
    CloseTab {
        tab_id: TabId,
    },
    Notify {
        title: String,
        message: String,
        priority: Priority,
    },
    PlaySound {
        file: String,
        looping: bool,
    },
    StopSound,
    CloseAudio,
    /// A line that could not be parsed.
    Error {
        message: String,
    },
}

/// Host-side view of the browser as seen through the bridge.
///
/// Keeps a mirror of open tabs (fed by tab events and snapshots) so the
/// admission policy can count them, and turns every host request into an
/// outbound line.
pub struct TabMirror {
    tabs: Mutex<Vec<Tab>>,
    out: mpsc::UnboundedSender<BridgeOut>,
}

impl TabMirror {
    pub fn new(out: mpsc::UnboundedSender<BridgeOut>) -> Arc<Self> {
        Arc::new(Self {
            tabs: Mutex::new(Vec::new()),
            out,
        })
    }

    fn tabs(&self) -> MutexGuard<'_, Vec<Tab>> {
        self.tabs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn send(&self, line: BridgeOut) -> Result<(), HostError> {
        self.out
            .send(line)
            .map_err(|_| HostError::Unavailable("bridge output closed".to_string()))
    }

    pub fn replace(&self, tabs: Vec<Tab>) {
        *self.tabs() = tabs;
    }

    /// Track a lifecycle event. Must run before the service sees it.
    pub fn apply(&self, event: &TabEvent) {
        let mut tabs = self.tabs();
        match event {
            TabEvent::Created { tab } => {
                if !tabs.iter().any(|t| t.id == tab.id) {
                    tabs.push(tab.clone());
                }
            }
            TabEvent::Updated { tab_id, tab, .. } => {
                if let Some(existing) = tabs.iter_mut().find(|t| t.id == *tab_id) {
                    existing.url = tab.url.clone();
                }
            }
            TabEvent::Removed { tab_id } => tabs.retain(|t| t.id != *tab_id),
            TabEvent::Activated { .. } => {}
        }
    }

    pub fn open_ids(&self) -> Vec<TabId> {
        self.tabs().iter().map(|t| t.id).collect()
    }
}

impl TabHost for TabMirror {
    fn query(&self) -> Result<Vec<Tab>, HostError> {
        Ok(self.tabs().clone())
    }

    fn close(&self, tab_id: TabId) -> Result<(), HostError> {
        let known = {
            let mut tabs = self.tabs();
            let before = tabs.len();
            tabs.retain(|t| t.id != tab_id);
            tabs.len() != before
        };
        self.send(BridgeOut::CloseTab { tab_id })?;
        if known {
            Ok(())
        } else {
            Err(HostError::NoSuchTab(tab_id))
        }
    }
}

impl Notifier for TabMirror {
    fn notify(&self, title: &str, message: &str, priority: Priority) {
        let line = BridgeOut::Notify {
            title: title.to_string(),
            message: message.to_string(),
            priority,
        };
        if let Err(e) = self.send(line) {
            tracing::debug!(error = %e, "notification dropped");
        }
    }
}

impl AudioSandbox for TabMirror {
    fn play(&self, sound: Sound, looping: bool) -> Result<(), HostError> {
        self.send(BridgeOut::PlaySound {
            file: sound.file().to_string(),
            looping,
        })
    }

    fn stop(&self) -> Result<(), HostError> {
        self.send(BridgeOut::StopSound)
    }

    fn close(&self) -> Result<(), HostError> {
        self.send(BridgeOut::CloseAudio)
    }
}
