//! Drives a [`Background`] on a single tokio task.
//!
//! One interval per timer kind, each polled only while its controller is
//! armed, plus an audio cleanup interval and an inbox for commands and tab
//! notifications. Because the task owns the service outright, every store
//! access is serialized.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{interval, Interval, MissedTickBehavior};

use crate::background::{Background, TimerKind};
use crate::clock::Clock;
use crate::command::{Command, Response};
use crate::error::HostError;
use crate::events::Event;
use crate::host::TabEvent;

const INBOX_CAPACITY: usize = 64;

/// Messages accepted by the service task.
#[derive(Debug)]
pub enum Inbound {
    Command {
        command: Command,
        reply: oneshot::Sender<Response>,
    },
    Tab(TabEvent),
    Shutdown,
}

/// Cloneable sender side of a running service.
#[derive(Debug, Clone)]
pub struct ServiceHandle {
    tx: mpsc::Sender<Inbound>,
}

fn stopped() -> HostError {
    HostError::Unavailable("background service stopped".to_string())
}

impl ServiceHandle {
    pub async fn command(&self, command: Command) -> Result<Response, HostError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Inbound::Command { command, reply })
            .await
            .map_err(|_| stopped())?;
        rx.await.map_err(|_| stopped())
    }

    pub async fn tab_event(&self, event: TabEvent) -> Result<(), HostError> {
        self.tx.send(Inbound::Tab(event)).await.map_err(|_| stopped())
    }

    pub async fn shutdown(&self) {
        let _ = self.tx.send(Inbound::Shutdown).await;
    }
}

/// Start the service task. Events it produces arrive on the returned receiver.
pub fn spawn(
    background: Background,
    clock: Arc<dyn Clock>,
) -> (ServiceHandle, mpsc::UnboundedReceiver<Event>, JoinHandle<()>) {
    let (tx, inbox) = mpsc::channel(INBOX_CAPACITY);
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let task = tokio::spawn(run(background, clock, inbox, events_tx));
    (ServiceHandle { tx }, events_rx, task)
}

fn ticker(period: Duration) -> Interval {
    let mut iv = interval(period);
    iv.set_missed_tick_behavior(MissedTickBehavior::Delay);
    iv
}

struct Timers {
    destruct: Interval,
    focus: Interval,
    lockdown: Interval,
    armed: [bool; 3],
}

impl Timers {
    fn new(bg: &Background) -> Self {
        Self {
            destruct: ticker(bg.tick_interval(TimerKind::SelfDestruct)),
            focus: ticker(bg.tick_interval(TimerKind::Focus)),
            lockdown: ticker(bg.tick_interval(TimerKind::Lockdown)),
            armed: [false; 3],
        }
    }

    /// Restart the period of every controller that just became armed so its
    /// first evaluation lands one full period later.
    fn sync(&mut self, bg: &Background) {
        for (slot, kind) in TimerKind::ALL.iter().enumerate() {
            let armed = bg.is_scheduled(*kind);
            if armed && !self.armed[slot] {
                tracing::debug!(?kind, "evaluation armed");
                match kind {
                    TimerKind::SelfDestruct => self.destruct.reset(),
                    TimerKind::Focus => self.focus.reset(),
                    TimerKind::Lockdown => self.lockdown.reset(),
                }
            }
            self.armed[slot] = armed;
        }
    }
}

fn emit(tx: &mpsc::UnboundedSender<Event>, events: Vec<Event>) {
    for event in events {
        if tx.send(event).is_err() {
            tracing::debug!("event receiver dropped");
            return;
        }
    }
}

pub async fn run(
    mut bg: Background,
    clock: Arc<dyn Clock>,
    mut inbox: mpsc::Receiver<Inbound>,
    events: mpsc::UnboundedSender<Event>,
) {
    tracing::info!("background service started");
    emit(&events, bg.recover(clock.now_ms()));

    let mut timers = Timers::new(&bg);
    timers.sync(&bg);
    let mut audio = ticker(bg.audio_poll_interval());

    loop {
        tokio::select! {
            msg = inbox.recv() => {
                let now = clock.now_ms();
                match msg {
                    None | Some(Inbound::Shutdown) => break,
                    Some(Inbound::Command { command, reply }) => {
                        let (response, produced) = bg.handle(command, now);
                        emit(&events, produced);
                        if reply.send(response).is_err() {
                            tracing::debug!("command caller went away before the reply");
                        }
                    }
                    Some(Inbound::Tab(event)) => emit(&events, bg.on_tab_event(event, now)),
                }
            }
            _ = timers.destruct.tick(), if timers.armed[0] => {
                emit(&events, bg.tick(TimerKind::SelfDestruct, clock.now_ms()));
            }
            _ = timers.focus.tick(), if timers.armed[1] => {
                emit(&events, bg.tick(TimerKind::Focus, clock.now_ms()));
            }
            _ = timers.lockdown.tick(), if timers.armed[2] => {
                emit(&events, bg.tick(TimerKind::Lockdown, clock.now_ms()));
            }
            _ = audio.tick() => {
                if bg.poll_audio(clock.now_ms()) {
                    tracing::debug!("audio sandbox closed");
                }
            }
        }
        timers.sync(&bg);
    }

    tracing::info!("background service stopped");
}
