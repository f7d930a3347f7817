//! Decides what happens to a newly created tab.
//!
//! Rules run in a fixed order:
//!
//! 1. A lockdown is in force and the open-tab count exceeds the cap: close the
//!    new tab, notify, stop.
//! 2. A self-destruct countdown exists: track the new tab.
//! 3. No lockdown and the count exceeds the cap: close one tab. Which one is
//!    governed by [`CapEviction`]; the default closes the last tab of the
//!    host's enumeration, which need not be the new tab.

use serde::{Deserialize, Serialize};

use crate::destruct::SelfDestructController;
use crate::events::{at, Event};
use crate::host::{Host, Priority, Tab, TabId};
use crate::lockdown::LockdownController;
use crate::storage::{AdmissionConfig, CapEviction};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Admission {
    /// Closed on arrival by the lockdown rule.
    Blocked { max_tabs: u32 },
    Admitted {
        /// Tracked by a running self-destruct countdown.
        registered: bool,
        /// Tab closed by the soft cap, if any.
        evicted: Option<TabId>,
    },
}

pub struct AdmissionPolicy {
    host: Host,
    eviction: CapEviction,
}

impl AdmissionPolicy {
    pub fn new(host: Host, config: &AdmissionConfig) -> Self {
        Self {
            host,
            eviction: config.eviction,
        }
    }

    fn open_tabs(&self) -> Option<Vec<Tab>> {
        match self.host.tabs.query() {
            Ok(tabs) => Some(tabs),
            Err(e) => {
                tracing::warn!(error = %e, "could not enumerate tabs; skipping cap check");
                None
            }
        }
    }

    fn close(&self, tab_id: TabId) {
        if let Err(e) = self.host.tabs.close(tab_id) {
            tracing::debug!(tab_id, error = %e, "close request failed");
        }
    }

    pub fn on_tab_created(
        &self,
        tab_id: TabId,
        now_ms: i64,
        lockdown: &LockdownController,
        destruct: &SelfDestructController,
    ) -> (Admission, Vec<Event>) {
        let mut events = Vec::new();

        let lockdown_active = lockdown.is_active(now_ms).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "lockdown state unreadable; treating as inactive");
            false
        });
        let max_tabs = lockdown.max_tabs().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "tab cap unreadable; treating as unset");
            None
        });

        // Rule 1: lockdown refuses the new tab.
        if lockdown_active {
            if let (Some(max), Some(tabs)) = (max_tabs, max_tabs.and_then(|_| self.open_tabs())) {
                if tabs.len() > max as usize {
                    self.close(tab_id);
                    self.host.notifier.notify(
                        "Tab Lockdown",
                        &format!("Maximum {max} tabs allowed during lockdown"),
                        Priority::High,
                    );
                    tracing::info!(tab_id, max_tabs = max, "tab blocked by lockdown");
                    events.push(Event::TabBlocked {
                        tab_id,
                        max_tabs: max,
                        at: at(now_ms),
                    });
                    return (Admission::Blocked { max_tabs: max }, events);
                }
            }
        }

        // Rule 2: self-destruct tracking.
        let registered = match destruct.register_tab(tab_id) {
            Ok(registered) => registered,
            Err(e) => {
                tracing::warn!(tab_id, error = %e, "could not register tab for self-destruct");
                false
            }
        };
        if registered {
            events.push(Event::TabRegistered { tab_id });
        }

        // Rule 3: soft cap outside of lockdown.
        let mut evicted = None;
        if !lockdown_active {
            if let (Some(max), Some(tabs)) = (max_tabs, max_tabs.and_then(|_| self.open_tabs())) {
                if tabs.len() > max as usize {
                    let victim = match self.eviction {
                        CapEviction::LastEnumerated => tabs.last().map(|t| t.id),
                        CapEviction::NewestTab => Some(tab_id),
                    };
                    if let Some(victim) = victim {
                        self.close(victim);
                        tracing::info!(tab_id = victim, max_tabs = max, "tab evicted by cap");
                        events.push(Event::TabEvicted {
                            tab_id: victim,
                            max_tabs: max,
                            at: at(now_ms),
                        });
                        evicted = Some(victim);
                    }
                }
            }
        }

        (Admission::Admitted { registered, evicted }, events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{DestructConfig, LockdownConfig};
    use crate::test_support::Fixture;

    const T0: i64 = 1_700_000_000_000;

    struct Parts {
        lockdown: LockdownController,
        destruct: SelfDestructController,
        policy: AdmissionPolicy,
    }

    fn parts(fx: &Fixture, eviction: CapEviction) -> Parts {
        Parts {
            lockdown: LockdownController::new(fx.host.clone(), LockdownConfig::default()),
            destruct: SelfDestructController::new(fx.host.clone(), DestructConfig::default()),
            policy: AdmissionPolicy::new(fx.host.clone(), &AdmissionConfig { eviction }),
        }
    }

    fn create(fx: &Fixture, p: &Parts, tab_id: TabId, now_ms: i64) -> (Admission, Vec<Event>) {
        fx.tabs.open_tab(tab_id);
        p.policy.on_tab_created(tab_id, now_ms, &p.lockdown, &p.destruct)
    }

    #[test]
    fn lockdown_blocks_tab_over_cap() {
        let fx = Fixture::with_tabs(&[1, 2, 3]);
        let mut p = parts(&fx, CapEviction::LastEnumerated);
        p.lockdown.set_max_tabs(Some(3), T0).unwrap();
        p.lockdown.start_for(600, T0).unwrap();

        let (admission, events) = create(&fx, &p, 4, T0 + 1_000);
        assert_eq!(admission, Admission::Blocked { max_tabs: 3 });
        assert!(matches!(events[..], [Event::TabBlocked { tab_id: 4, .. }]));
        assert_eq!(fx.tabs.open_ids(), vec![1, 2, 3]);
        assert_eq!(
            fx.notifier.sent(),
            vec![(
                "Tab Lockdown".to_string(),
                "Maximum 3 tabs allowed during lockdown".to_string(),
                Priority::High
            )]
        );
    }

    #[test]
    fn blocked_tab_is_not_tracked_for_self_destruct() {
        let fx = Fixture::with_tabs(&[1]);
        let mut p = parts(&fx, CapEviction::LastEnumerated);
        p.lockdown.set_max_tabs(Some(1), T0).unwrap();
        p.lockdown.start_for(600, T0).unwrap();
        p.destruct.enable(600, T0).unwrap();

        let (admission, _) = create(&fx, &p, 2, T0 + 1_000);
        assert!(matches!(admission, Admission::Blocked { .. }));
        assert!(p.destruct.state().unwrap().tracked_tab_ids.is_empty());
    }

    #[test]
    fn lockdown_within_cap_admits() {
        let fx = Fixture::with_tabs(&[1]);
        let mut p = parts(&fx, CapEviction::LastEnumerated);
        p.lockdown.set_max_tabs(Some(3), T0).unwrap();
        p.lockdown.start_for(600, T0).unwrap();

        let (admission, events) = create(&fx, &p, 2, T0 + 1_000);
        assert_eq!(admission, Admission::Admitted { registered: false, evicted: None });
        assert!(events.is_empty());
        assert_eq!(fx.tabs.open_ids(), vec![1, 2]);
    }

    #[test]
    fn expired_lockdown_no_longer_blocks() {
        let fx = Fixture::with_tabs(&[1, 2]);
        let mut p = parts(&fx, CapEviction::LastEnumerated);
        p.lockdown.set_max_tabs(Some(2), T0).unwrap();
        p.lockdown.start(T0 + 5_000, T0).unwrap();

        let (admission, _) = create(&fx, &p, 3, T0 + 5_000);
        assert!(!matches!(admission, Admission::Blocked { .. }));
        assert!(!p.lockdown.state().unwrap().active);
        assert!(fx.notifier.sent().is_empty());
    }

    #[test]
    fn cap_closes_last_enumerated_tab() {
        // Tab 7 was dragged to the end of the strip; the new tab 9 sits in the middle.
        let fx = Fixture::with_tabs(&[1]);
        let p = parts(&fx, CapEviction::LastEnumerated);
        p.lockdown.set_max_tabs(Some(2), T0).unwrap();
        fx.tabs.open_tab(9);
        fx.tabs.open_tab(7);

        let (admission, events) = p.policy.on_tab_created(9, T0, &p.lockdown, &p.destruct);
        assert_eq!(admission, Admission::Admitted { registered: false, evicted: Some(7) });
        assert!(matches!(events[..], [Event::TabEvicted { tab_id: 7, max_tabs: 2, .. }]));
        assert_eq!(fx.tabs.close_requests(), vec![7]);
        assert_eq!(fx.tabs.open_ids(), vec![1, 9]);
    }

    #[test]
    fn newest_tab_eviction_closes_new_tab() {
        let fx = Fixture::with_tabs(&[1]);
        let p = parts(&fx, CapEviction::NewestTab);
        p.lockdown.set_max_tabs(Some(2), T0).unwrap();
        fx.tabs.open_tab(9);
        fx.tabs.open_tab(7);

        let (admission, _) = p.policy.on_tab_created(9, T0, &p.lockdown, &p.destruct);
        assert_eq!(admission, Admission::Admitted { registered: false, evicted: Some(9) });
        assert_eq!(fx.tabs.open_ids(), vec![1, 7]);
    }

    #[test]
    fn self_destruct_tracks_new_tabs() {
        let fx = Fixture::new();
        let mut p = parts(&fx, CapEviction::LastEnumerated);
        p.destruct.enable(60, T0).unwrap();

        let (admission, events) = create(&fx, &p, 11, T0 + 1_000);
        assert_eq!(admission, Admission::Admitted { registered: true, evicted: None });
        assert!(matches!(events[..], [Event::TabRegistered { tab_id: 11 }]));
        assert_eq!(p.destruct.state().unwrap().tracked_tab_ids, vec![11]);
    }

    #[test]
    fn no_cap_admits_everything() {
        let fx = Fixture::with_tabs(&[1, 2, 3, 4]);
        let p = parts(&fx, CapEviction::LastEnumerated);
        let (admission, events) = create(&fx, &p, 5, T0);
        assert_eq!(admission, Admission::Admitted { registered: false, evicted: None });
        assert!(events.is_empty());
        assert!(fx.tabs.close_requests().is_empty());
    }
}
