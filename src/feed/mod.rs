pub mod fetcher;
pub mod rotator;
pub mod state;

pub use fetcher::{build_client, extract_image_url, fetch_once, parse_feed};
pub use rotator::{FeedEvent, FeedRotator};
pub use state::{FeedItem, FeedSnapshot, FeedState};
