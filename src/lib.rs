pub mod config;
pub mod feed;
pub mod settings;
pub mod timer;
mod utils;

use anyhow::{Context, Result};
use log::{error, info};
use tokio::{sync::broadcast, task::JoinHandle};

pub use config::{SessionConfig, FEED_URL};
pub use feed::{FeedEvent, FeedItem, FeedRotator, FeedSnapshot};
pub use settings::{PhaseEditor, SettingsStore};
pub use timer::{
    default_phases, PhaseSlot, PhaseView, TimerController, TimerEvent, TimerPhase, TimerSnapshot,
};

/// The one session owned by the host: timer, phase settings and feed display.
/// The two pipelines share nothing.
pub struct AppState {
    pub timer: TimerController,
    pub settings: SettingsStore,
    pub feed: FeedRotator,
    config: SessionConfig,
}

impl AppState {
    pub fn new(config: SessionConfig) -> Self {
        let timer = TimerController::new(default_phases(), config.tick_interval);
        let settings = SettingsStore::new(timer.clone());
        let feed = FeedRotator::new(config.rotation_interval, config.fade_window);

        Self {
            timer,
            settings,
            feed,
            config,
        }
    }

    /// Fetch the feed in the background and hand the result to the rotator.
    pub fn spawn_feed(&self) -> Result<JoinHandle<()>> {
        let client = feed::build_client(self.config.fetch_timeout)?;
        let url = self.config.feed_url.clone();
        let rotator = self.feed.clone();

        Ok(tokio::spawn(async move {
            let items = feed::fetch_once(&client, &url).await;
            rotator.load(items).await;
        }))
    }

    pub async fn shutdown(&self) {
        self.timer.shutdown().await;
        self.feed.stop().await;
    }
}

fn log_timer_events(mut rx: broadcast::Receiver<TimerEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    let snapshot = event.snapshot();
                    let clocks: Vec<String> = snapshot
                        .phases
                        .iter()
                        .map(|p| format!("{} {}{}", p.label, p.display, if p.active { "*" } else { "" }))
                        .collect();
                    info!("[timer] {}", clocks.join(" | "));
                    if let Ok(payload) = serde_json::to_string(&event) {
                        log::debug!("timer event {payload}");
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    log::warn!("timer event log lagged by {skipped} events");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

fn log_feed_events(mut rx: broadcast::Receiver<FeedEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(FeedEvent::Shown(snapshot)) => {
                    info!("[feed] {} <{}>", snapshot.item.title, snapshot.item.link);
                }
                Ok(event) => {
                    if let Ok(payload) = serde_json::to_string(&event) {
                        log::debug!("feed event {payload}");
                    }
                }
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

async fn serve(config: SessionConfig) -> Result<()> {
    let state = AppState::new(config);

    let timer_log = log_timer_events(state.timer.subscribe());
    let feed_log = log_feed_events(state.feed.subscribe());
    let fetch = state.spawn_feed()?;

    state.timer.start_pause().await;

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;

    info!("shutting down");
    fetch.abort();
    state.shutdown().await;
    timer_log.abort();
    feed_log.abort();
    Ok(())
}

pub fn run() {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    log::info!("Pulse starting up...");

    let result = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build async runtime")
        .and_then(|runtime| runtime.block_on(serve(SessionConfig::default())));

    if let Err(err) = result {
        error!("pulse exited with error: {err:#}");
        std::process::exit(1);
    }
}
