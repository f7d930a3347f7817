//! In-crate fakes for the host seams.

use std::sync::{Arc, Mutex};

use crate::error::HostError;
use crate::host::{AudioChannel, AudioSandbox, Host, Notifier, Priority, Sound, Tab, TabHost, TabId};
use crate::storage::{AudioConfig, MemoryStore};

#[derive(Debug, Default)]
pub struct RecordingAudio {
    calls: Mutex<Vec<String>>,
}

impl RecordingAudio {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl AudioSandbox for RecordingAudio {
    fn play(&self, sound: Sound, looping: bool) -> Result<(), HostError> {
        let mode = if looping { "loop" } else { "once" };
        self.calls
            .lock()
            .unwrap()
            .push(format!("play {} {mode}", sound.file()));
        Ok(())
    }

    fn stop(&self) -> Result<(), HostError> {
        self.calls.lock().unwrap().push("stop".into());
        Ok(())
    }

    fn close(&self) -> Result<(), HostError> {
        self.calls.lock().unwrap().push("close".into());
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(String, String, Priority)>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<(String, String, Priority)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.sent().into_iter().map(|(_, m, _)| m).collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, title: &str, message: &str, priority: Priority) {
        self.sent
            .lock()
            .unwrap()
            .push((title.to_string(), message.to_string(), priority));
    }
}

/// Open tabs in enumeration order plus a log of close requests.
#[derive(Debug, Default)]
pub struct FakeTabs {
    open: Mutex<Vec<TabId>>,
    close_requests: Mutex<Vec<TabId>>,
}

impl FakeTabs {
    pub fn with_open(ids: &[TabId]) -> Self {
        Self {
            open: Mutex::new(ids.to_vec()),
            close_requests: Mutex::new(Vec::new()),
        }
    }

    pub fn open_tab(&self, id: TabId) {
        self.open.lock().unwrap().push(id);
    }

    pub fn open_ids(&self) -> Vec<TabId> {
        self.open.lock().unwrap().clone()
    }

    pub fn close_requests(&self) -> Vec<TabId> {
        self.close_requests.lock().unwrap().clone()
    }
}

impl TabHost for FakeTabs {
    fn query(&self) -> Result<Vec<Tab>, HostError> {
        Ok(self.open_ids().into_iter().map(Tab::new).collect())
    }

    fn close(&self, tab_id: TabId) -> Result<(), HostError> {
        self.close_requests.lock().unwrap().push(tab_id);
        let mut open = self.open.lock().unwrap();
        match open.iter().position(|id| *id == tab_id) {
            Some(pos) => {
                open.remove(pos);
                Ok(())
            }
            None => Err(HostError::NoSuchTab(tab_id)),
        }
    }
}

pub struct Fixture {
    pub store: Arc<MemoryStore>,
    pub tabs: Arc<FakeTabs>,
    pub notifier: Arc<RecordingNotifier>,
    pub audio: Arc<RecordingAudio>,
    pub host: Host,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_tabs(&[])
    }

    pub fn with_tabs(open: &[TabId]) -> Self {
        let store = Arc::new(MemoryStore::new());
        let tabs = Arc::new(FakeTabs::with_open(open));
        let notifier = Arc::new(RecordingNotifier::default());
        let audio = Arc::new(RecordingAudio::default());
        let channel = Arc::new(AudioChannel::new(audio.clone(), AudioConfig::default()));
        let host = Host::new(store.clone(), tabs.clone(), notifier.clone(), channel);
        Self {
            store,
            tabs,
            notifier,
            audio,
            host,
        }
    }
}
