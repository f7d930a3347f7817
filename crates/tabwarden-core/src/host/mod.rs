//! Seams to the browser host: tabs, notifications, audio and the durable store.

mod audio;
mod notify;
mod tabs;

pub use audio::{AudioChannel, AudioOwner, AudioSandbox, Sound};
pub use notify::{Notifier, Priority, SilentNotifier};
pub use tabs::{LoadStatus, Tab, TabChange, TabEvent, TabHost, TabId};

use std::sync::Arc;

use crate::storage::StateStore;

/// Collaborators shared by every controller.
#[derive(Clone)]
pub struct Host {
    pub store: Arc<dyn StateStore>,
    pub tabs: Arc<dyn TabHost>,
    pub notifier: Arc<dyn Notifier>,
    pub audio: Arc<AudioChannel>,
}

impl Host {
    pub fn new(
        store: Arc<dyn StateStore>,
        tabs: Arc<dyn TabHost>,
        notifier: Arc<dyn Notifier>,
        audio: Arc<AudioChannel>,
    ) -> Self {
        Self {
            store,
            tabs,
            notifier,
            audio,
        }
    }
}
