//! Shared fakes for the integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use tabwarden_core::storage::AudioConfig;
use tabwarden_core::{
    AudioChannel, AudioSandbox, Background, Config, Host, HostError, Notifier, Priority, Sound, StateStore, Tab,
    TabEvent, TabHost, TabId,
};

pub const T0: i64 = 1_700_000_000_000;

// ============================================================================
// Host fakes
// ============================================================================

#[derive(Default)]
pub struct Browser {
    open: Mutex<Vec<TabId>>,
    closed: Mutex<Vec<TabId>>,
}

impl Browser {
    pub fn with_tabs(ids: &[TabId]) -> Arc<Self> {
        let browser = Self::default();
        browser.open.lock().unwrap().extend_from_slice(ids);
        Arc::new(browser)
    }

    pub fn open(&self, id: TabId) -> TabEvent {
        self.open.lock().unwrap().push(id);
        TabEvent::Created { tab: Tab::new(id) }
    }

    pub fn open_ids(&self) -> Vec<TabId> {
        self.open.lock().unwrap().clone()
    }

    pub fn closed(&self) -> Vec<TabId> {
        self.closed.lock().unwrap().clone()
    }
}

impl TabHost for Browser {
    fn query(&self) -> Result<Vec<Tab>, HostError> {
        Ok(self.open_ids().into_iter().map(Tab::new).collect())
    }

    fn close(&self, tab_id: TabId) -> Result<(), HostError> {
        let mut open = self.open.lock().unwrap();
        let Some(pos) = open.iter().position(|id| *id == tab_id) else {
            return Err(HostError::NoSuchTab(tab_id));
        };
        open.remove(pos);
        self.closed.lock().unwrap().push(tab_id);
        Ok(())
    }
}

#[derive(Default)]
pub struct Inbox {
    pub messages: Mutex<Vec<(String, Priority)>>,
}

impl Inbox {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().iter().map(|(m, _)| m.clone()).collect()
    }
}

impl Notifier for Inbox {
    fn notify(&self, _title: &str, message: &str, priority: Priority) {
        self.messages.lock().unwrap().push((message.to_string(), priority));
    }
}

#[derive(Default)]
pub struct Speaker {
    pub played: Mutex<Vec<(Sound, bool)>>,
}

impl AudioSandbox for Speaker {
    fn play(&self, sound: Sound, looping: bool) -> Result<(), HostError> {
        self.played.lock().unwrap().push((sound, looping));
        Ok(())
    }

    fn stop(&self) -> Result<(), HostError> {
        Ok(())
    }

    fn close(&self) -> Result<(), HostError> {
        Ok(())
    }
}

// ============================================================================
// Assembly
// ============================================================================

pub struct Harness {
    pub browser: Arc<Browser>,
    pub inbox: Arc<Inbox>,
    pub speaker: Arc<Speaker>,
    pub host: Host,
}

impl Harness {
    pub fn new(store: Arc<dyn StateStore>, tabs: &[TabId]) -> Self {
        let browser = Browser::with_tabs(tabs);
        let inbox = Arc::new(Inbox::default());
        let speaker = Arc::new(Speaker::default());
        let audio = Arc::new(AudioChannel::new(speaker.clone(), AudioConfig::default()));
        let host = Host::new(store, browser.clone(), inbox.clone(), audio);
        Self {
            browser,
            inbox,
            speaker,
            host,
        }
    }

    pub fn service(&self) -> Background {
        Background::new(self.host.clone(), Config::default())
    }
}
