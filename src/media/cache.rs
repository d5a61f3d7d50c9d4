/// Session-wide image load cache
///
/// `ImageCache` is the shared layer: one map from URL to load state for
/// the whole session, cloned into every screen. `ImageTracker` is the
/// per-screen layer: it remembers which URLs this screen has seen load,
/// which loads it has in flight, and hands out the load futures.
///
/// URLs are the only key. Published images never change, so entries are
/// never invalidated and the map only grows.
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, PoisonError, RwLock};

use iced::widget::image::Handle;
use tracing::debug;

use super::loader::{ImageError, ImageFetcher};

/// A load started by the tracker. Resolves to its outcome; never panics on failure.
pub type PendingLoad = Pin<Box<dyn Future<Output = LoadOutcome> + Send>>;

/// Result of one image load, delivered back to the UI loop
#[derive(Debug, Clone)]
pub struct LoadOutcome {
    pub url: String,
    pub result: Result<Handle, ImageError>,
}

/// Load state of one URL
#[derive(Debug, Clone, Default)]
pub struct LoadState {
    pub loaded: bool,
    pub handle: Option<Handle>,
}

#[derive(Debug, Clone, Default)]
pub struct ImageCache {
    entries: Arc<RwLock<HashMap<String, LoadState>>>,
}

impl ImageCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an unloaded entry the first time a URL is referenced
    pub fn touch(&self, url: &str) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.entry(url.to_string()).or_default();
    }

    pub fn is_loaded(&self, url: &str) -> bool {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.get(url).is_some_and(|state| state.loaded)
    }

    /// Record a finished load. Idempotent; the first handle stored wins.
    pub fn mark_loaded(&self, url: &str, handle: Handle) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let state = entries.entry(url.to_string()).or_default();
        state.loaded = true;
        state.handle.get_or_insert(handle);
    }

    /// Drawable handle for a loaded URL
    pub fn handle(&self, url: &str) -> Option<Handle> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.get(url).and_then(|state| state.handle.clone())
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Store the outcome of a load whose screen is gone
    pub fn complete(&self, outcome: LoadOutcome) {
        match outcome.result {
            Ok(handle) => self.mark_loaded(&outcome.url, handle),
            Err(err) => debug!(url = %outcome.url, error = %err, "Image load failed"),
        }
    }
}

pub struct ImageTracker {
    cache: ImageCache,
    fetcher: Arc<dyn ImageFetcher>,
    /// URLs this screen has seen finish loading
    local: HashSet<String>,
    in_flight: HashSet<String>,
}

impl ImageTracker {
    pub fn new(cache: ImageCache, fetcher: Arc<dyn ImageFetcher>) -> Self {
        Self {
            cache,
            fetcher,
            local: HashSet::new(),
            in_flight: HashSet::new(),
        }
    }

    pub fn is_loaded(&self, url: &str) -> bool {
        self.local.contains(url) || self.cache.is_loaded(url)
    }

    pub fn is_loading(&self, url: &str) -> bool {
        self.in_flight.contains(url)
    }

    pub fn mark_loaded(&mut self, url: &str, handle: Handle) {
        self.cache.mark_loaded(url, handle);
        self.local.insert(url.to_string());
    }

    /// Start loading a URL unless it is already loaded or loading.
    ///
    /// The returned future performs the fetch; the caller runs it and feeds
    /// the outcome back through `finish`.
    pub fn preload(&mut self, url: &str) -> Option<PendingLoad> {
        if self.is_loaded(url) || self.in_flight.contains(url) {
            return None;
        }

        self.cache.touch(url);
        self.in_flight.insert(url.to_string());

        let fetcher = Arc::clone(&self.fetcher);
        let url = url.to_string();
        Some(Box::pin(async move {
            let result = fetcher.fetch(&url).await;
            LoadOutcome { url, result }
        }))
    }

    /// Preload every URL; completions arrive in any order
    pub fn preload_many<I, S>(&mut self, urls: I) -> Vec<PendingLoad>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        urls.into_iter()
            .filter_map(|url| self.preload(url.as_ref()))
            .collect()
    }

    /// Apply a finished load. Failures leave the URL unmarked so a later
    /// request retries it. Returns whether the image is now loaded.
    pub fn finish(&mut self, outcome: LoadOutcome) -> bool {
        self.in_flight.remove(&outcome.url);
        match outcome.result {
            Ok(handle) => {
                self.mark_loaded(&outcome.url, handle);
                true
            }
            Err(err) => {
                debug!(url = %outcome.url, error = %err, "Image load failed");
                false
            }
        }
    }

    /// Drawable handle, if the image has loaded
    pub fn handle(&self, url: &str) -> Option<Handle> {
        if self.is_loaded(url) {
            self.cache.handle(url)
        } else {
            None
        }
    }
}

impl std::fmt::Debug for ImageTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageTracker")
            .field("loaded", &self.local.len())
            .field("in_flight", &self.in_flight.len())
            .finish()
    }
}
