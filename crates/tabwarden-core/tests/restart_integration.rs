//! Restart behavior against the SQLite store.
//!
//! Each test drives one service instance, drops it, reopens the database
//! file and checks that a fresh instance picks up exactly where the first
//! stopped (or finalizes what expired in between).

mod common;

use std::sync::Arc;

use common::{Harness, T0};
use tabwarden_core::{Command, Event, FocusMode, SqliteStore, TimerKind};

fn open(dir: &tempfile::TempDir) -> Arc<SqliteStore> {
    Arc::new(SqliteStore::open_at(&dir.path().join("tabwarden.db")).unwrap())
}

#[test]
fn test_self_destruct_resumes_mid_countdown() {
    let dir = tempfile::tempdir().unwrap();
    {
        let h = Harness::new(open(&dir), &[1]);
        let mut bg = h.service();
        bg.handle(Command::EnableSelfDestruct { duration_secs: 120 }, T0);
        bg.on_tab_event(h.browser.open(2), T0 + 1_000);
    }

    let h = Harness::new(open(&dir), &[1, 2]);
    let mut bg = h.service();
    assert!(bg.recover(T0 + 60_000).is_empty());
    assert!(bg.is_scheduled(TimerKind::SelfDestruct));

    let status = bg.status(T0 + 60_000).unwrap();
    assert_eq!(status.destruct.remaining_secs, Some(60));
    assert_eq!(status.destruct.tracked_tabs, 1);

    let events = bg.tick(TimerKind::SelfDestruct, T0 + 120_000);
    assert!(matches!(events[..], [Event::DestructExpired { .. }]));
    assert_eq!(h.browser.closed(), vec![2]);
}

#[test]
fn test_self_destruct_expired_while_down_closes_on_start() {
    let dir = tempfile::tempdir().unwrap();
    {
        let h = Harness::new(open(&dir), &[]);
        let mut bg = h.service();
        bg.handle(Command::EnableSelfDestruct { duration_secs: 30 }, T0);
        bg.on_tab_event(h.browser.open(5), T0 + 1_000);
        bg.on_tab_event(h.browser.open(6), T0 + 2_000);
    }

    let h = Harness::new(open(&dir), &[5, 6, 7]);
    let mut bg = h.service();
    let events = bg.recover(T0 + 3_600_000);
    assert!(matches!(
        events[..],
        [Event::DestructExpired { ref closed_tabs, .. }] if closed_tabs == &vec![5, 6]
    ));
    assert_eq!(h.browser.open_ids(), vec![7]);
    assert!(!bg.is_scheduled(TimerKind::SelfDestruct));
    // The warning window was slept through; nothing is played after the fact.
    assert!(h.inbox.messages().is_empty());
}

#[test]
fn test_focus_timer_resumes_without_drift() {
    let dir = tempfile::tempdir().unwrap();
    {
        let h = Harness::new(open(&dir), &[]);
        let mut bg = h.service();
        bg.handle(
            Command::StartFocusTimer {
                mode: FocusMode::Focus,
                remaining_secs: 1_500,
            },
            T0,
        );
    }

    let h = Harness::new(open(&dir), &[]);
    let mut bg = h.service();
    bg.recover(T0 + 600_000);
    let status = bg.status(T0 + 600_000).unwrap();
    assert!(status.focus.running);
    assert_eq!(status.focus.remaining_secs, 900);
    assert_eq!(status.focus.display, "15:00");
}

#[test]
fn test_paused_focus_timer_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    {
        let h = Harness::new(open(&dir), &[]);
        let mut bg = h.service();
        bg.handle(
            Command::StartFocusTimer {
                mode: FocusMode::LongBreak,
                remaining_secs: 900,
            },
            T0,
        );
        bg.handle(Command::PauseFocusTimer, T0 + 100_000);
    }

    let h = Harness::new(open(&dir), &[]);
    let mut bg = h.service();
    bg.recover(T0 + 86_400_000);
    assert!(!bg.is_scheduled(TimerKind::Focus));
    let status = bg.status(T0 + 86_400_000).unwrap();
    assert_eq!(status.focus.mode, FocusMode::LongBreak);
    assert_eq!(status.focus.remaining_secs, 800);
}

#[test]
fn test_lockdown_expired_while_down_clears_silently() {
    let dir = tempfile::tempdir().unwrap();
    {
        let h = Harness::new(open(&dir), &[]);
        let mut bg = h.service();
        bg.handle(Command::SetMaxTabs { max_tabs: Some(2) }, T0);
        let (response, _) = bg.handle(Command::EnableLockdownFor { duration_secs: 60 }, T0);
        assert!(response.success);
    }

    let h = Harness::new(open(&dir), &[1, 2]);
    let mut bg = h.service();
    bg.recover(T0 + 120_000);
    assert!(!bg.is_scheduled(TimerKind::Lockdown));
    assert!(!bg.status(T0 + 120_000).unwrap().lockdown.active);
    assert_eq!(bg.status(T0 + 120_000).unwrap().lockdown.max_tabs, Some(2));
    assert!(h.inbox.messages().is_empty());
}
