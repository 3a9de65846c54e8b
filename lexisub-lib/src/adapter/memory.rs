//! Headless in-memory page
//!
//! A [`Page`] backed by plain data: elements are registered under the
//! selectors they answer to, and the video keeps a playback clock that
//! advances with (tokio) time at the current rate while playing.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::time::Instant;

use super::page::{Element, MediaElement, Page, HAVE_METADATA};

#[derive(Debug)]
struct Clock {
    /// Position at `anchor`
    position: f64,
    /// Set while playing
    anchor: Option<Instant>,
    rate: f64,
    duration: f64,
    ready_state: u8,
}

impl Clock {
    fn now(&self) -> f64 {
        let position = match self.anchor {
            Some(anchor) => self.position + anchor.elapsed().as_secs_f64() * self.rate,
            None => self.position,
        };
        if self.duration.is_finite() {
            position.min(self.duration)
        } else {
            position
        }
    }

    /// Fold elapsed playback into `position` and restart the anchor.
    fn rebase(&mut self) {
        self.position = self.now();
        if self.anchor.is_some() {
            self.anchor = Some(Instant::now());
        }
    }
}

/// A video element with a simulated playback clock.
#[derive(Debug)]
pub struct MemoryVideo {
    clock: Mutex<Clock>,
    connected: AtomicBool,
}

impl MemoryVideo {
    /// A paused video of `duration` seconds with metadata loaded.
    pub fn new(duration: f64) -> Self {
        Self {
            clock: Mutex::new(Clock {
                position: 0.0,
                anchor: None,
                rate: 1.0,
                duration,
                ready_state: HAVE_METADATA,
            }),
            connected: AtomicBool::new(true),
        }
    }

    /// A video whose metadata has not loaded yet.
    pub fn loading() -> Self {
        let video = Self::new(f64::NAN);
        video.clock.lock().ready_state = 0;
        video
    }

    /// Finish loading metadata.
    pub fn load_metadata(&self, duration: f64) {
        let mut clock = self.clock.lock();
        clock.duration = duration;
        clock.ready_state = HAVE_METADATA;
    }

    fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }
}

impl MediaElement for MemoryVideo {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn ready_state(&self) -> u8 {
        self.clock.lock().ready_state
    }

    fn current_time(&self) -> f64 {
        self.clock.lock().now()
    }

    fn set_current_time(&self, seconds: f64) {
        let mut clock = self.clock.lock();
        clock.position = seconds.max(0.0);
        if clock.anchor.is_some() {
            clock.anchor = Some(Instant::now());
        }
    }

    fn duration(&self) -> f64 {
        self.clock.lock().duration
    }

    fn paused(&self) -> bool {
        self.clock.lock().anchor.is_none()
    }

    fn play(&self) {
        let mut clock = self.clock.lock();
        if clock.anchor.is_none() {
            clock.anchor = Some(Instant::now());
        }
    }

    fn pause(&self) {
        let mut clock = self.clock.lock();
        clock.rebase();
        clock.anchor = None;
    }

    fn playback_rate(&self) -> f64 {
        self.clock.lock().rate
    }

    fn set_playback_rate(&self, rate: f64) {
        let mut clock = self.clock.lock();
        clock.rebase();
        clock.rate = rate;
    }
}

/// A plain element with an inline display style.
#[derive(Debug)]
pub struct MemoryElement {
    display: Mutex<Option<String>>,
    connected: AtomicBool,
}

impl MemoryElement {
    pub fn new() -> Self {
        Self {
            display: Mutex::new(None),
            connected: AtomicBool::new(true),
        }
    }

    pub fn with_display(value: &str) -> Self {
        let element = Self::new();
        *element.display.lock() = Some(value.to_string());
        element
    }
}

impl Default for MemoryElement {
    fn default() -> Self {
        Self::new()
    }
}

impl Element for MemoryElement {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn display(&self) -> Option<String> {
        self.display.lock().clone()
    }

    fn set_display(&self, value: Option<String>) {
        *self.display.lock() = value;
    }
}

/// A document holding registered videos and elements.
pub struct MemoryPage {
    url: String,
    videos: Mutex<HashMap<String, Arc<MemoryVideo>>>,
    elements: Mutex<HashMap<String, Arc<MemoryElement>>>,
    mutations: broadcast::Sender<()>,
}

impl MemoryPage {
    pub fn new(url: &str) -> Self {
        let (mutations, _) = broadcast::channel(16);
        Self {
            url: url.to_string(),
            videos: Mutex::new(HashMap::new()),
            elements: Mutex::new(HashMap::new()),
            mutations,
        }
    }

    /// Attach a video answering to `selector`.
    pub fn insert_video(&self, selector: &str, video: Arc<MemoryVideo>) {
        video.set_connected(true);
        if let Some(old) = self.videos.lock().insert(selector.to_string(), video) {
            old.set_connected(false);
        }
        self.notify();
    }

    /// Detach the video answering to `selector`.
    pub fn remove_video(&self, selector: &str) -> Option<Arc<MemoryVideo>> {
        let removed = self.videos.lock().remove(selector);
        if let Some(video) = &removed {
            video.set_connected(false);
            self.notify();
        }
        removed
    }

    /// Attach an element answering to `selector`.
    pub fn insert_element(&self, selector: &str, element: Arc<MemoryElement>) {
        element.connected.store(true, Ordering::SeqCst);
        if let Some(old) = self.elements.lock().insert(selector.to_string(), element) {
            old.connected.store(false, Ordering::SeqCst);
        }
        self.notify();
    }

    /// Detach the element answering to `selector`.
    pub fn remove_element(&self, selector: &str) -> Option<Arc<MemoryElement>> {
        let removed = self.elements.lock().remove(selector);
        if let Some(element) = &removed {
            element.connected.store(false, Ordering::SeqCst);
            self.notify();
        }
        removed
    }

    fn notify(&self) {
        // no subscribers is fine
        let _ = self.mutations.send(());
    }
}

impl Page for MemoryPage {
    fn url(&self) -> String {
        self.url.clone()
    }

    fn query_video(&self, selector: &str) -> Option<Arc<dyn MediaElement>> {
        self.videos
            .lock()
            .get(selector)
            .map(|v| Arc::clone(v) as Arc<dyn MediaElement>)
    }

    fn query_element(&self, selector: &str) -> Option<Arc<dyn Element>> {
        self.elements
            .lock()
            .get(selector)
            .map(|e| Arc::clone(e) as Arc<dyn Element>)
    }

    fn mutations(&self) -> broadcast::Receiver<()> {
        self.mutations.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_clock_advances_while_playing() {
        let video = MemoryVideo::new(100.0);
        assert!(video.paused());

        video.play();
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(video.current_time(), 2.0);

        video.pause();
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(video.current_time(), 2.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clock_rate_and_seek() {
        let video = MemoryVideo::new(100.0);
        video.set_current_time(10.0);
        video.set_playback_rate(2.0);
        video.play();
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(video.current_time(), 16.0);

        video.set_current_time(99.0);
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(video.current_time(), 100.0);
    }

    #[test]
    fn test_loading_video() {
        let video = MemoryVideo::loading();
        assert_eq!(video.ready_state(), 0);
        assert!(video.duration().is_nan());
        video.load_metadata(42.0);
        assert_eq!(video.ready_state(), HAVE_METADATA);
        assert_eq!(video.duration(), 42.0);
    }

    #[test]
    fn test_page_queries_and_detach() {
        let page = MemoryPage::new("https://example.com/watch");
        let video = Arc::new(MemoryVideo::new(10.0));
        page.insert_video("video", Arc::clone(&video));

        let found = page.query_video("video").unwrap();
        assert!(found.is_connected());
        assert!(page.query_video(".missing").is_none());

        page.remove_video("video");
        assert!(!found.is_connected());
        assert!(page.query_video("video").is_none());
    }

    #[tokio::test]
    async fn test_mutations_are_broadcast() {
        let page = MemoryPage::new("https://example.com");
        let mut rx = page.mutations();
        page.insert_element(".captions", Arc::new(MemoryElement::new()));
        assert!(rx.recv().await.is_ok());
    }
}
