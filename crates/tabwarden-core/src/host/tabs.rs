use serde::{Deserialize, Serialize};

use crate::error::HostError;

pub type TabId = u32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tab {
    pub id: TabId,
    #[serde(default)]
    pub url: Option<String>,
}

impl Tab {
    pub fn new(id: TabId) -> Self {
        Self { id, url: None }
    }

    pub fn with_url(id: TabId, url: impl Into<String>) -> Self {
        Self {
            id,
            url: Some(url.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadStatus {
    Loading,
    Complete,
}

/// What changed in a `tab updated` notification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabChange {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub status: Option<LoadStatus>,
}

/// Tab lifecycle notifications from the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TabEvent {
    Created { tab: Tab },
    Updated { tab_id: TabId, change: TabChange, tab: Tab },
    Activated { tab_id: TabId },
    Removed { tab_id: TabId },
}

/// The browser's tab surface, as far as the core needs it.
pub trait TabHost: Send + Sync {
    /// Every open tab, in the host's enumeration order.
    fn query(&self) -> Result<Vec<Tab>, HostError>;

    fn close(&self, tab_id: TabId) -> Result<(), HostError>;
}
