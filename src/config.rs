use std::time::Duration;

pub const FEED_URL: &str = "https://assets.nst.com.my/rss/news";

const TICK_INTERVAL_MS: u64 = 1_000;
const ROTATION_INTERVAL_MS: u64 = 7_000;
const FADE_WINDOW_MS: u64 = 500;
const FETCH_TIMEOUT_SECS: u64 = 10;

/// Timing and endpoint settings for one session. Defaults match production;
/// tests shorten the periods or point the feed at a local listener.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub feed_url: String,
    pub tick_interval: Duration,
    pub rotation_interval: Duration,
    pub fade_window: Duration,
    pub fetch_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            feed_url: FEED_URL.to_string(),
            tick_interval: Duration::from_millis(TICK_INTERVAL_MS),
            rotation_interval: Duration::from_millis(ROTATION_INTERVAL_MS),
            fade_window: Duration::from_millis(FADE_WINDOW_MS),
            fetch_timeout: Duration::from_secs(FETCH_TIMEOUT_SECS),
        }
    }
}
