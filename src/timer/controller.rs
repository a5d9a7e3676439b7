use std::{sync::Arc, time::Duration};

use log::{info, warn};
use serde::Serialize;
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::state::{format_clock, PhaseSlot, TickOutcome, TimerPhase, TimerSession};

// Per-second tick logging
const ENABLE_LOGS: bool = false;

use crate::log_debug;

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PhaseView {
    pub id: String,
    pub label: String,
    pub duration_seconds: u32,
    pub remaining_seconds: u32,
    pub display: String,
    pub active: bool,
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    pub session_id: String,
    pub current_index: usize,
    pub remaining_seconds: u32,
    pub running: bool,
    pub repeat: bool,
    pub phases: Vec<PhaseView>,
}

impl TimerSnapshot {
    fn capture(session_id: &str, session: &TimerSession) -> Self {
        let current = session.current_slot();
        let phases = [PhaseSlot::First, PhaseSlot::Second]
            .into_iter()
            .map(|slot| {
                let phase = session.phase(slot);
                let remaining = session.display_seconds(slot);
                PhaseView {
                    id: phase.id.clone(),
                    label: phase.label.clone(),
                    duration_seconds: phase.duration_seconds,
                    remaining_seconds: remaining,
                    display: format_clock(remaining),
                    active: slot == current,
                }
            })
            .collect();

        Self {
            session_id: session_id.to_string(),
            current_index: current.index(),
            remaining_seconds: session.remaining_seconds(),
            running: session.is_running(),
            repeat: session.repeat,
            phases,
        }
    }
}

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum TimerEvent {
    StateChanged(TimerSnapshot),
    PhaseChanged {
        from: PhaseSlot,
        to: PhaseSlot,
        snapshot: TimerSnapshot,
    },
    CycleCompleted(TimerSnapshot),
}

impl TimerEvent {
    pub fn snapshot(&self) -> &TimerSnapshot {
        match self {
            TimerEvent::StateChanged(snapshot)
            | TimerEvent::PhaseChanged { snapshot, .. }
            | TimerEvent::CycleCompleted(snapshot) => snapshot,
        }
    }
}

struct Ticker {
    handle: JoinHandle<()>,
    cancel_token: CancellationToken,
}

impl Ticker {
    fn stop(self) -> JoinHandle<()> {
        self.cancel_token.cancel();
        self.handle
    }
}

/// Owns the session and the one-second tick schedule that drives it.
#[derive(Clone)]
pub struct TimerController {
    session_id: String,
    state: Arc<Mutex<TimerSession>>,
    ticker: Arc<Mutex<Option<Ticker>>>,
    tick_interval: Duration,
    events: broadcast::Sender<TimerEvent>,
}

impl TimerController {
    pub fn new(phases: [TimerPhase; 2], tick_interval: Duration) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Self {
            session_id: Uuid::new_v4().to_string(),
            state: Arc::new(Mutex::new(TimerSession::new(phases))),
            ticker: Arc::new(Mutex::new(None)),
            tick_interval,
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TimerEvent> {
        self.events.subscribe()
    }

    pub async fn get_snapshot(&self) -> TimerSnapshot {
        let guard = self.state.lock().await;
        TimerSnapshot::capture(&self.session_id, &guard)
    }

    pub async fn phases(&self) -> [TimerPhase; 2] {
        self.state.lock().await.phases.clone()
    }

    pub async fn start_pause(&self) -> TimerSnapshot {
        let mut ticker = self.ticker.lock().await;

        let (running, snapshot) = {
            let mut session = self.state.lock().await;
            session.start_pause();
            // Cancel under the session lock so a worker waiting on it sees the token.
            if let Some(previous) = ticker.take() {
                previous.stop().abort();
            }
            (
                session.is_running(),
                TimerSnapshot::capture(&self.session_id, &session),
            )
        };

        if running {
            *ticker = Some(self.spawn_ticker());
            info!(
                "timer {} started on phase {} with {}s left",
                self.session_id, snapshot.current_index, snapshot.remaining_seconds
            );
        } else {
            info!("timer {} paused", self.session_id);
        }
        drop(ticker);

        self.emit(TimerEvent::StateChanged(snapshot.clone()));
        snapshot
    }

    pub async fn reset(&self) -> TimerSnapshot {
        let mut ticker = self.ticker.lock().await;

        let snapshot = {
            let mut session = self.state.lock().await;
            session.reset();
            if let Some(previous) = ticker.take() {
                previous.stop().abort();
            }
            TimerSnapshot::capture(&self.session_id, &session)
        };
        drop(ticker);

        info!("timer {} reset", self.session_id);
        self.emit(TimerEvent::StateChanged(snapshot.clone()));
        snapshot
    }

    pub async fn toggle_repeat(&self) -> bool {
        let (repeat, snapshot) = {
            let mut session = self.state.lock().await;
            let repeat = session.toggle_repeat();
            (repeat, TimerSnapshot::capture(&self.session_id, &session))
        };

        info!("timer {} repeat {}", self.session_id, if repeat { "on" } else { "off" });
        self.emit(TimerEvent::StateChanged(snapshot));
        repeat
    }

    pub async fn update_phase(&self, config: TimerPhase) {
        let id = config.id.clone();
        let snapshot = {
            let mut session = self.state.lock().await;
            if !session.update_phase(config) {
                warn!("ignoring update for unknown phase '{}'", id);
                return;
            }
            TimerSnapshot::capture(&self.session_id, &session)
        };

        self.emit(TimerEvent::StateChanged(snapshot));
    }

    /// Edit the phase with `id` in place and return it as stored (duration
    /// clamped). Unknown ids are logged and yield `None`.
    pub async fn edit_phase(
        &self,
        id: &str,
        edit: impl FnOnce(&mut TimerPhase),
    ) -> Option<TimerPhase> {
        let (stored, snapshot) = {
            let mut session = self.state.lock().await;
            let Some(mut phase) = session.phases.iter().find(|p| p.id == id).cloned() else {
                warn!("ignoring edit for unknown phase '{}'", id);
                return None;
            };
            edit(&mut phase);
            phase.id = id.to_string();
            session.update_phase(phase);
            let stored = session.phases.iter().find(|p| p.id == id).cloned()?;
            (stored, TimerSnapshot::capture(&self.session_id, &session))
        };

        self.emit(TimerEvent::StateChanged(snapshot));
        Some(stored)
    }

    /// Cancel the tick schedule and wait for the worker to exit.
    pub async fn shutdown(&self) {
        let previous = self.ticker.lock().await.take();
        if let Some(ticker) = previous {
            if let Err(err) = ticker.stop().await {
                if !err.is_cancelled() {
                    warn!("tick worker for {} failed: {err}", self.session_id);
                }
            }
        }
    }

    fn spawn_ticker(&self) -> Ticker {
        // Anchor the first tick at the start request, not at the worker's first poll.
        let first_tick = Instant::now() + self.tick_interval;
        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(tick_loop(
            self.session_id.clone(),
            self.state.clone(),
            self.events.clone(),
            first_tick,
            self.tick_interval,
            cancel_token.clone(),
        ));

        Ticker {
            handle,
            cancel_token,
        }
    }

    fn emit(&self, event: TimerEvent) {
        // No subscribers is fine; the host may not be listening yet.
        let _ = self.events.send(event);
    }
}

async fn tick_loop(
    session_id: String,
    state: Arc<Mutex<TimerSession>>,
    events: broadcast::Sender<TimerEvent>,
    first_tick: Instant,
    tick_interval: Duration,
    cancel_token: CancellationToken,
) {
    let mut interval = time::interval_at(first_tick, tick_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel_token.cancelled() => break,
            _ = interval.tick() => {
                let (outcome, snapshot) = {
                    let mut session = state.lock().await;
                    if cancel_token.is_cancelled() || !session.is_running() {
                        break;
                    }
                    let outcome = session.tick();
                    (outcome, TimerSnapshot::capture(&session_id, &session))
                };

                let event = match outcome {
                    TickOutcome::Ignored => break,
                    TickOutcome::Counted => {
                        log_debug!("timer {} {}", session_id, format_clock(snapshot.remaining_seconds));
                        TimerEvent::StateChanged(snapshot)
                    }
                    TickOutcome::PhaseChanged { from, to } => {
                        info!("timer {} moved from phase {} to {}", session_id, from.index(), to.index());
                        TimerEvent::PhaseChanged { from, to, snapshot }
                    }
                    TickOutcome::CycleCompleted => {
                        info!("timer {} finished its cycle", session_id);
                        let _ = events.send(TimerEvent::CycleCompleted(snapshot));
                        break;
                    }
                };
                let _ = events.send(event);
            }
        }
    }
}
