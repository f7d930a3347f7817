//! Per-tab intent and browsing-time log.
//!
//! A record is created when the user states why a tab was opened. After that
//! the tracker follows the tab: URL changes close the previous visit into
//! `url_history`, and time spent as the active tab accumulates in
//! `time_spent_secs`. Records outlive their tabs; nothing is ever pruned.
//!
//! Which tab is active is transient, in-memory state. After a restart the
//! first activation starts a fresh measurement.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{CoreError, StoreError, ValidationError};
use crate::events::at;
use crate::host::{Host, LoadStatus, TabChange, TabId};
use crate::storage::{keys, read, WriteBatch};
use crate::timer::elapsed_secs;

/// Schemes of browser-internal pages, which are never tracked.
const INTERNAL_SCHEMES: &[&str] = &[
    "about",
    "brave",
    "chrome-extension",
    "devtools",
    "edge",
    "moz-extension",
    "view-source",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlVisit {
    pub url: String,
    pub visited_at: DateTime<Utc>,
    pub time_spent_secs: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabIntentRecord {
    pub tab_id: TabId,
    pub intent: String,
    /// First trackable URL the tab showed.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub current_url: Option<String>,
    #[serde(default)]
    pub current_url_started_ms: Option<i64>,
    #[serde(default)]
    pub time_spent_secs: i64,
    #[serde(default)]
    pub url_history: Vec<UrlVisit>,
    pub created_at: DateTime<Utc>,
}

impl TabIntentRecord {
    pub fn new(tab_id: TabId, intent: impl Into<String>, now_ms: i64) -> Self {
        Self {
            tab_id,
            intent: intent.into(),
            url: None,
            current_url: None,
            current_url_started_ms: None,
            time_spent_secs: 0,
            url_history: Vec::new(),
            created_at: at(now_ms),
        }
    }

    pub fn is_open(&self, open_tab_ids: &[TabId]) -> bool {
        open_tab_ids.contains(&self.tab_id)
    }

    /// Best URL to show for the record.
    pub fn display_url(&self) -> Option<&str> {
        self.current_url.as_deref().or(self.url.as_deref())
    }

    fn close_visit(&mut self, now_ms: i64, keep_empty: bool) {
        if let (Some(url), Some(started)) = (self.current_url.take(), self.current_url_started_ms.take()) {
            let spent = elapsed_secs(now_ms, started);
            if keep_empty || spent > 0 {
                self.url_history.push(UrlVisit {
                    url,
                    visited_at: at(started),
                    time_spent_secs: spent,
                });
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityFilter {
    #[default]
    All,
    Open,
    Closed,
}

impl FromStr for ActivityFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Self::All),
            "open" => Ok(Self::Open),
            "closed" => Ok(Self::Closed),
            other => Err(format!("unknown filter: {other} (expected all, open or closed)")),
        }
    }
}

/// Whether a page URL is an ordinary web page worth tracking.
pub fn is_trackable(url: &str) -> bool {
    if url.is_empty() || url.starts_with("chrome") {
        return false;
    }
    match Url::parse(url) {
        Ok(parsed) => !INTERNAL_SCHEMES.contains(&parsed.scheme()),
        Err(_) => false,
    }
}

/// Where a new tab should navigate after its intent is stated.
///
/// Text that already looks like an address is opened directly (https is
/// assumed); anything else becomes a web search.
pub fn intent_destination(intent: &str) -> Option<Url> {
    let intent = intent.trim();
    if intent.is_empty() {
        return None;
    }
    if intent.starts_with("http://") || intent.starts_with("https://") {
        return Url::parse(intent).ok();
    }
    if looks_like_host(intent) {
        if let Ok(url) = Url::parse(&format!("https://{intent}")) {
            return Some(url);
        }
    }
    Url::parse_with_params("https://www.google.com/search", &[("q", intent)]).ok()
}

fn looks_like_host(text: &str) -> bool {
    if text.contains(char::is_whitespace) {
        return false;
    }
    let host = text.split('/').next().unwrap_or_default();
    match host.rsplit_once('.') {
        Some((name, tld)) => {
            !name.is_empty() && tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic())
        }
        None => false,
    }
}

pub struct ActivityTracker {
    host: Host,
    /// Active tab and when it became active.
    active: Option<(TabId, i64)>,
}

impl ActivityTracker {
    pub fn new(host: Host) -> Self {
        Self { host, active: None }
    }

    pub fn active_tab(&self) -> Option<TabId> {
        self.active.map(|(id, _)| id)
    }

    pub fn records(&self) -> Result<Vec<TabIntentRecord>, StoreError> {
        Ok(read(self.host.store.as_ref(), keys::TAB_INTENTS)?.unwrap_or_default())
    }

    pub fn filtered(
        &self,
        filter: ActivityFilter,
        open_tab_ids: &[TabId],
    ) -> Result<Vec<TabIntentRecord>, StoreError> {
        let mut records = self.records()?;
        records.retain(|r| match filter {
            ActivityFilter::All => true,
            ActivityFilter::Open => r.is_open(open_tab_ids),
            ActivityFilter::Closed => !r.is_open(open_tab_ids),
        });
        Ok(records)
    }

    fn save(&self, records: &[TabIntentRecord]) -> Result<(), StoreError> {
        let value = serde_json::to_value(records).map_err(|e| StoreError::InvalidValue {
            key: keys::TAB_INTENTS.to_string(),
            message: e.to_string(),
        })?;
        self.host
            .store
            .set_many(WriteBatch::new().put(keys::TAB_INTENTS, value))
    }

    /// Apply `f` to the record of `tab_id` and persist when it reports a change.
    fn update(
        &self,
        tab_id: TabId,
        f: impl FnOnce(&mut TabIntentRecord) -> bool,
    ) -> Result<bool, StoreError> {
        let mut records = self.records()?;
        let Some(record) = records.iter_mut().find(|r| r.tab_id == tab_id) else {
            return Ok(false);
        };
        if !f(record) {
            return Ok(false);
        }
        self.save(&records)?;
        Ok(true)
    }

    pub fn submit_intent(&self, tab_id: TabId, intent: &str, now_ms: i64) -> Result<TabIntentRecord, CoreError> {
        let intent = intent.trim();
        if intent.is_empty() {
            return Err(ValidationError::EmptyIntent.into());
        }

        let mut records = self.records()?;
        let record = match records.iter_mut().find(|r| r.tab_id == tab_id) {
            Some(existing) => {
                existing.intent = intent.to_string();
                existing.clone()
            }
            None => {
                let record = TabIntentRecord::new(tab_id, intent, now_ms);
                records.push(record.clone());
                record
            }
        };
        self.save(&records)?;
        tracing::info!(tab_id, "intent recorded");
        Ok(record)
    }

    /// A tab navigated or finished loading.
    pub fn on_updated(
        &self,
        tab_id: TabId,
        change: &TabChange,
        tab_url: Option<&str>,
        now_ms: i64,
    ) -> Result<bool, StoreError> {
        let Some(url) = tab_url.filter(|u| is_trackable(u)) else {
            return Ok(false);
        };
        if change.url.is_none() && change.status != Some(LoadStatus::Complete) {
            return Ok(false);
        }

        self.update(tab_id, |record| {
            if record.current_url.as_deref() == Some(url) {
                return false;
            }
            record.close_visit(now_ms, false);
            if record.url.is_none() {
                record.url = Some(url.to_string());
            }
            record.current_url = Some(url.to_string());
            record.current_url_started_ms = Some(now_ms);
            tracing::debug!(tab_id, url, "tracking new url");
            true
        })
    }

    /// Credit the previously active tab and start measuring `tab_id`.
    pub fn on_activated(&mut self, tab_id: TabId, now_ms: i64) -> Result<bool, StoreError> {
        let previous = self.active.replace((tab_id, now_ms));
        let Some((prev_id, since)) = previous else {
            return Ok(false);
        };

        self.update(prev_id, |record| {
            record.time_spent_secs += elapsed_secs(now_ms, since);
            if record.current_url.is_some() && record.current_url_started_ms.is_some() {
                record.current_url_started_ms = Some(now_ms);
            }
            true
        })
    }

    /// Close out a removed tab: final visit and any running active time.
    pub fn on_removed(&mut self, tab_id: TabId, now_ms: i64) -> Result<bool, StoreError> {
        let active_since = match self.active {
            Some((id, since)) if id == tab_id => {
                self.active = None;
                Some(since)
            }
            _ => None,
        };

        self.update(tab_id, |record| {
            record.close_visit(now_ms, true);
            if let Some(since) = active_since {
                record.time_spent_secs += elapsed_secs(now_ms, since);
            }
            true
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::Fixture;

    const T0: i64 = 1_700_000_000_000;

    fn navigated(url: &str) -> TabChange {
        TabChange {
            url: Some(url.to_string()),
            status: None,
        }
    }

    fn record(tracker: &ActivityTracker, tab_id: TabId) -> TabIntentRecord {
        tracker
            .records()
            .unwrap()
            .into_iter()
            .find(|r| r.tab_id == tab_id)
            .unwrap()
    }

    #[test]
    fn trackable_urls() {
        assert!(is_trackable("https://example.com/a"));
        assert!(is_trackable("http://localhost:8080/"));
        assert!(!is_trackable("chrome://newtab/"));
        assert!(!is_trackable("chrome-extension://abc/activity.html"));
        assert!(!is_trackable("about:blank"));
        assert!(!is_trackable("edge://settings"));
        assert!(!is_trackable("not a url"));
        assert!(!is_trackable(""));
    }

    #[test]
    fn destinations() {
        assert_eq!(
            intent_destination("https://docs.rs").unwrap().as_str(),
            "https://docs.rs/"
        );
        assert_eq!(
            intent_destination("github.com/rust-lang").unwrap().as_str(),
            "https://github.com/rust-lang"
        );
        let search = intent_destination("read the tokio docs").unwrap();
        assert_eq!(search.host_str(), Some("www.google.com"));
        assert_eq!(search.query(), Some("q=read+the+tokio+docs"));
        assert!(intent_destination("   ").is_none());
    }

    #[test]
    fn submit_rejects_blank_intent() {
        let fx = Fixture::new();
        let tracker = ActivityTracker::new(fx.host.clone());
        assert!(matches!(
            tracker.submit_intent(1, "  ", T0),
            Err(CoreError::Validation(ValidationError::EmptyIntent))
        ));
        assert!(tracker.records().unwrap().is_empty());
    }

    #[test]
    fn submit_creates_then_updates() {
        let fx = Fixture::new();
        let tracker = ActivityTracker::new(fx.host.clone());
        tracker.submit_intent(1, " write report ", T0).unwrap();
        tracker.submit_intent(1, "write summary", T0 + 1_000).unwrap();
        let records = tracker.records().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].intent, "write summary");
        assert_eq!(records[0].created_at, at(T0));
    }

    #[test]
    fn url_changes_build_history() {
        let fx = Fixture::new();
        let tracker = ActivityTracker::new(fx.host.clone());
        tracker.submit_intent(1, "research", T0).unwrap();

        let a = "https://a.example/";
        let b = "https://b.example/";
        assert!(tracker.on_updated(1, &navigated(a), Some(a), T0).unwrap());
        // Same URL again on load completion: no change.
        let complete = TabChange {
            url: None,
            status: Some(LoadStatus::Complete),
        };
        assert!(!tracker.on_updated(1, &complete, Some(a), T0 + 500).unwrap());
        assert!(tracker.on_updated(1, &navigated(b), Some(b), T0 + 30_400).unwrap());

        let r = record(&tracker, 1);
        assert_eq!(r.url.as_deref(), Some(a));
        assert_eq!(r.current_url.as_deref(), Some(b));
        assert_eq!(
            r.url_history,
            vec![UrlVisit {
                url: a.to_string(),
                visited_at: at(T0),
                time_spent_secs: 30,
            }]
        );
    }

    #[test]
    fn sub_second_visits_are_dropped() {
        let fx = Fixture::new();
        let tracker = ActivityTracker::new(fx.host.clone());
        tracker.submit_intent(1, "quick", T0).unwrap();
        let (a, b) = ("https://a.example/", "https://b.example/");
        tracker.on_updated(1, &navigated(a), Some(a), T0).unwrap();
        tracker.on_updated(1, &navigated(b), Some(b), T0 + 900).unwrap();
        assert!(record(&tracker, 1).url_history.is_empty());
    }

    #[test]
    fn internal_pages_and_loading_updates_ignored() {
        let fx = Fixture::new();
        let tracker = ActivityTracker::new(fx.host.clone());
        tracker.submit_intent(1, "x", T0).unwrap();
        let internal = "chrome://settings";
        assert!(!tracker.on_updated(1, &navigated(internal), Some(internal), T0).unwrap());
        let loading = TabChange {
            url: None,
            status: Some(LoadStatus::Loading),
        };
        assert!(!tracker
            .on_updated(1, &loading, Some("https://a.example/"), T0)
            .unwrap());
        assert_eq!(record(&tracker, 1).current_url, None);
    }

    #[test]
    fn untracked_tabs_are_ignored() {
        let fx = Fixture::new();
        let mut tracker = ActivityTracker::new(fx.host.clone());
        let url = "https://a.example/";
        assert!(!tracker.on_updated(9, &navigated(url), Some(url), T0).unwrap());
        assert!(!tracker.on_removed(9, T0).unwrap());
        assert!(fx.store.is_empty());
    }

    #[test]
    fn activation_credits_previous_tab() {
        let fx = Fixture::new();
        let mut tracker = ActivityTracker::new(fx.host.clone());
        tracker.submit_intent(1, "one", T0).unwrap();
        tracker.submit_intent(2, "two", T0).unwrap();
        let url = "https://a.example/";
        tracker.on_updated(1, &navigated(url), Some(url), T0).unwrap();

        assert!(!tracker.on_activated(1, T0).unwrap());
        assert!(tracker.on_activated(2, T0 + 42_700).unwrap());
        assert_eq!(tracker.active_tab(), Some(2));

        let one = record(&tracker, 1);
        assert_eq!(one.time_spent_secs, 42);
        assert_eq!(one.current_url_started_ms, Some(T0 + 42_700));
        assert_eq!(record(&tracker, 2).time_spent_secs, 0);
    }

    #[test]
    fn removal_closes_final_visit_and_active_time() {
        let fx = Fixture::new();
        let mut tracker = ActivityTracker::new(fx.host.clone());
        tracker.submit_intent(1, "one", T0).unwrap();
        let url = "https://a.example/";
        tracker.on_updated(1, &navigated(url), Some(url), T0).unwrap();
        tracker.on_activated(1, T0).unwrap();

        assert!(tracker.on_removed(1, T0 + 10_000).unwrap());
        assert_eq!(tracker.active_tab(), None);

        let r = record(&tracker, 1);
        assert_eq!(r.time_spent_secs, 10);
        assert_eq!(r.current_url, None);
        assert_eq!(r.url_history.len(), 1);
        assert_eq!(r.url_history[0].time_spent_secs, 10);
        assert_eq!(r.display_url(), Some(url));
    }

    #[test]
    fn filter_by_open_state() {
        let fx = Fixture::new();
        let tracker = ActivityTracker::new(fx.host.clone());
        tracker.submit_intent(1, "one", T0).unwrap();
        tracker.submit_intent(2, "two", T0).unwrap();
        tracker.submit_intent(3, "three", T0).unwrap();

        let ids = |f| {
            tracker
                .filtered(f, &[2])
                .unwrap()
                .into_iter()
                .map(|r| r.tab_id)
                .collect::<Vec<_>>()
        };
        assert_eq!(ids(ActivityFilter::All), vec![1, 2, 3]);
        assert_eq!(ids(ActivityFilter::Open), vec![2]);
        assert_eq!(ids(ActivityFilter::Closed), vec![1, 3]);
        assert_eq!("closed".parse::<ActivityFilter>().unwrap(), ActivityFilter::Closed);
    }
}
