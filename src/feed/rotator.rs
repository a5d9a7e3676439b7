use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use log::{info, warn};
use serde::Serialize;
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use super::state::{FeedItem, FeedSnapshot, FeedState};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info};

const EVENT_CAPACITY: usize = 16;

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum FeedEvent {
    Loaded { len: usize },
    Hidden(FeedSnapshot),
    Shown(FeedSnapshot),
}

struct RotationWorker {
    handle: JoinHandle<()>,
    cancel_token: CancellationToken,
}

/// Cycles loaded feed items on a fixed interval with a short hidden window
/// between items. Inactive until items arrive; stays inactive if none do.
#[derive(Clone)]
pub struct FeedRotator {
    state: Arc<Mutex<FeedState>>,
    worker: Arc<Mutex<Option<RotationWorker>>>,
    loaded: Arc<AtomicBool>,
    rotation_interval: Duration,
    fade_window: Duration,
    events: broadcast::Sender<FeedEvent>,
}

impl FeedRotator {
    pub fn new(rotation_interval: Duration, fade_window: Duration) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Self {
            state: Arc::new(Mutex::new(FeedState::default())),
            worker: Arc::new(Mutex::new(None)),
            loaded: Arc::new(AtomicBool::new(false)),
            rotation_interval,
            fade_window,
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FeedEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> Option<FeedSnapshot> {
        self.state.lock().await.snapshot()
    }

    pub async fn is_rotating(&self) -> bool {
        self.worker
            .lock()
            .await
            .as_ref()
            .is_some_and(|worker| !worker.handle.is_finished())
    }

    /// Install the fetched items. Only the first call has any effect; an empty
    /// list leaves the rotator permanently idle.
    pub async fn load(&self, items: Vec<FeedItem>) {
        if self.loaded.swap(true, Ordering::SeqCst) {
            warn!("feed already loaded; ignoring {} new items", items.len());
            return;
        }

        let state = FeedState::with_items(items);
        let len = state.len();
        *self.state.lock().await = state;

        if len == 0 {
            info!("feed is empty; rotation disabled");
            return;
        }

        let _ = self.events.send(FeedEvent::Loaded { len });
        self.spawn_worker().await;
    }

    /// Cancel the rotation schedule and wait for the worker to exit.
    pub async fn stop(&self) {
        let worker = self.worker.lock().await.take();
        if let Some(worker) = worker {
            worker.cancel_token.cancel();
            if let Err(err) = worker.handle.await {
                warn!("feed rotation worker failed to join: {err}");
            }
        }
    }

    async fn spawn_worker(&self) {
        let mut guard = self.worker.lock().await;
        if let Some(previous) = guard.take() {
            previous.cancel_token.cancel();
            previous.handle.abort();
        }

        let first_hide = Instant::now() + self.rotation_interval;
        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(rotation_loop(
            self.state.clone(),
            self.events.clone(),
            first_hide,
            self.rotation_interval,
            self.fade_window,
            cancel_token.clone(),
        ));

        *guard = Some(RotationWorker {
            handle,
            cancel_token,
        });
    }
}

async fn rotation_loop(
    state: Arc<Mutex<FeedState>>,
    events: broadcast::Sender<FeedEvent>,
    first_hide: Instant,
    rotation_interval: Duration,
    fade_window: Duration,
    cancel_token: CancellationToken,
) {
    let mut ticker = time::interval_at(first_hide, rotation_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel_token.cancelled() => break,
            _ = ticker.tick() => {
                let hidden = {
                    let mut guard = state.lock().await;
                    guard.hide();
                    guard.snapshot()
                };
                let Some(hidden) = hidden else { break };
                let _ = events.send(FeedEvent::Hidden(hidden));

                tokio::select! {
                    _ = cancel_token.cancelled() => break,
                    _ = time::sleep(fade_window) => {}
                }

                let shown = {
                    let mut guard = state.lock().await;
                    guard.advance();
                    guard.snapshot()
                };
                if let Some(shown) = shown {
                    log_debug!("feed item {}/{}: {}", shown.index + 1, shown.len, shown.item.title);
                    let _ = events.send(FeedEvent::Shown(shown));
                }
            }
        }
    }

    log_info!("feed rotation stopped");
}
