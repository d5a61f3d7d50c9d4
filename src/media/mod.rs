/// Remote image handling
///
/// This module handles:
/// - Downloading and decoding panel/thumbnail images (loader.rs)
/// - The session-wide load cache and per-screen trackers (cache.rs)

pub mod cache;
pub mod loader;

pub use cache::{ImageCache, ImageTracker, LoadOutcome, PendingLoad};
pub use loader::{HttpImageFetcher, ImageError, ImageFetcher};
