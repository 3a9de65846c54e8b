//! Platform adapters
//!
//! Every streaming source gets one [`PlatformAdapter`] implementation. The
//! shared behaviour (video resolution and re-validation, native subtitle
//! toggling, payload decoding, playback controls) lives in provided trait
//! methods on top of [`AdapterCore`]; an implementation only supplies its
//! selector lists and subtitle format.
//!
//! The adapter is chosen once per session by [`detect_platform`].

pub mod generic;
pub mod memory;
pub mod netflix;
pub mod page;
pub mod watcher;
pub mod youtube;

pub use generic::GenericAdapter;
pub use memory::{MemoryElement, MemoryPage, MemoryVideo};
pub use netflix::NetflixAdapter;
pub use page::{Element, MediaElement, Page, HAVE_METADATA};
pub use watcher::watch_for_element;
pub use youtube::YouTubeAdapter;

use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::{LexisubError, Result};
use crate::subtitle::{parse_detected, parse_with_format};
use crate::types::{CapturedSubtitle, Platform, Segment, SubtitleFormat};

/// Receives each decoded subtitle set; every call replaces the previous set.
pub type SegmentCallback = Box<dyn FnMut(Vec<Segment>) + Send>;

/// Saved state of a native subtitle layer we hid.
struct NativeOverride {
    element: Arc<dyn Element>,
    previous: Option<String>,
}

/// Per-session state shared by every adapter implementation.
pub struct AdapterCore {
    page: Arc<dyn Page>,
    /// Last resolved video; re-validated on every access
    video: Mutex<Option<Weak<dyn MediaElement>>>,
    /// Native layer style we overrode, restored by `show`
    native: Mutex<Option<NativeOverride>>,
}

impl AdapterCore {
    pub fn new(page: Arc<dyn Page>) -> Self {
        Self {
            page,
            video: Mutex::new(None),
            native: Mutex::new(None),
        }
    }

    pub fn page(&self) -> &Arc<dyn Page> {
        &self.page
    }

    /// Return the cached video if still attached, else search `selectors`
    /// in order and cache the first match.
    pub fn resolve_video(&self, selectors: &[&str]) -> Option<Arc<dyn MediaElement>> {
        let mut cached = self.video.lock();
        if let Some(video) = cached.as_ref().and_then(Weak::upgrade) {
            if video.is_connected() {
                return Some(video);
            }
            tracing::debug!("Cached video element detached, searching again");
        }

        let found = selectors.iter().find_map(|s| self.page.query_video(s));
        *cached = found.as_ref().map(Arc::downgrade);
        found
    }

    /// First attached element matching `selectors`, in order.
    pub fn resolve_element(&self, selectors: &[&str]) -> Option<Arc<dyn Element>> {
        selectors
            .iter()
            .filter_map(|s| self.page.query_element(s))
            .find(|e| e.is_connected())
    }

    /// Hide the first native subtitle layer found, remembering its style.
    ///
    /// Hiding an already hidden layer keeps the originally saved style.
    pub fn hide_native(&self, selectors: &[&str]) -> bool {
        let mut native = self.native.lock();
        if native.is_some() {
            return true;
        }
        let element = match self.resolve_element(selectors) {
            Some(element) => element,
            None => return false,
        };
        let previous = element.display();
        element.set_display(Some("none".to_string()));
        *native = Some(NativeOverride { element, previous });
        true
    }

    /// Restore exactly the style `hide_native` replaced.
    pub fn show_native(&self) {
        if let Some(saved) = self.native.lock().take() {
            saved.element.set_display(saved.previous);
        }
    }

    pub fn native_hidden(&self) -> bool {
        self.native.lock().is_some()
    }
}

/// Capability contract every streaming source implements.
pub trait PlatformAdapter: Send + Sync + 'static {
    fn platform(&self) -> Platform;

    fn core(&self) -> &AdapterCore;

    /// Video element selectors, most specific first
    fn video_selectors(&self) -> &'static [&'static str];

    /// Player container selectors, most specific first
    fn container_selectors(&self) -> &'static [&'static str];

    /// Selectors of the platform's own caption layer
    fn native_subtitle_selectors(&self) -> &'static [&'static str];

    /// Format of captured payloads; `None` sniffs each payload.
    fn subtitle_format(&self) -> Option<SubtitleFormat>;

    fn get_video_element(&self) -> Option<Arc<dyn MediaElement>> {
        self.core().resolve_video(self.video_selectors())
    }

    fn get_video_container(&self) -> Option<Arc<dyn Element>> {
        self.core().resolve_element(self.container_selectors())
    }

    fn is_video_ready(&self) -> bool {
        self.get_video_element()
            .map(|v| v.ready_state() >= HAVE_METADATA)
            .unwrap_or(false)
    }

    /// Decode one captured payload with this platform's parser.
    fn decode_subtitles(&self, captured: &CapturedSubtitle) -> Vec<Segment> {
        match captured.format.or_else(|| self.subtitle_format()) {
            Some(format) => parse_with_format(format, &captured.body),
            None => parse_detected(&captured.body),
        }
    }

    /// Consume captured payloads from `feed`, calling `on_segments` with the
    /// full decoded set each time a payload for this platform yields cues.
    ///
    /// The returned task is the single registration for the session; abort
    /// it to unregister.
    fn intercept_subtitles(
        self: Arc<Self>,
        mut feed: mpsc::Receiver<CapturedSubtitle>,
        mut on_segments: SegmentCallback,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(captured) = feed.recv().await {
                if captured.platform != self.platform() {
                    tracing::debug!(
                        "Ignoring {} subtitle payload on {} adapter",
                        captured.platform,
                        self.platform()
                    );
                    continue;
                }
                let segments = self.decode_subtitles(&captured);
                if segments.is_empty() {
                    tracing::warn!(
                        "{} subtitle payload ({} bytes) yielded no segments",
                        self.platform(),
                        captured.body.len()
                    );
                    continue;
                }
                tracing::info!("Received {} segment(s) from {}", segments.len(), self.platform());
                on_segments(segments);
            }
            tracing::debug!("{} subtitle feed closed", self.platform());
        })
    }

    fn hide_native_subtitles(&self) -> bool {
        self.core().hide_native(self.native_subtitle_selectors())
    }

    fn show_native_subtitles(&self) {
        self.core().show_native()
    }

    fn current_time(&self) -> f64 {
        self.get_video_element()
            .map(|v| v.current_time())
            .filter(|t| t.is_finite())
            .unwrap_or(0.0)
    }

    fn duration(&self) -> f64 {
        self.get_video_element()
            .map(|v| v.duration())
            .filter(|d| d.is_finite())
            .unwrap_or(0.0)
    }

    fn is_paused(&self) -> bool {
        self.get_video_element().map(|v| v.paused()).unwrap_or(true)
    }

    fn play(&self) {
        if let Some(video) = self.get_video_element() {
            video.play();
        }
    }

    fn pause(&self) {
        if let Some(video) = self.get_video_element() {
            video.pause();
        }
    }

    /// Seek to `seconds`, clamped to the media bounds.
    fn seek(&self, seconds: f64) {
        if !seconds.is_finite() {
            return;
        }
        if let Some(video) = self.get_video_element() {
            let duration = video.duration();
            let target = if duration.is_finite() && duration > 0.0 {
                seconds.clamp(0.0, duration)
            } else {
                seconds.max(0.0)
            };
            video.set_current_time(target);
        }
    }

    /// Seek relative to the current position.
    fn skip(&self, delta: f64) {
        if self.get_video_element().is_some() {
            self.seek(self.current_time() + delta);
        }
    }

    fn set_playback_rate(&self, rate: f64) {
        if !(rate.is_finite() && rate > 0.0) {
            tracing::debug!("Ignoring playback rate {}", rate);
            return;
        }
        if let Some(video) = self.get_video_element() {
            video.set_playback_rate(rate);
        }
    }

    fn playback_rate(&self) -> f64 {
        self.get_video_element()
            .map(|v| v.playback_rate())
            .unwrap_or(1.0)
    }
}

/// Pick the platform for a page URL by host.
pub fn detect_platform(page_url: &str) -> Platform {
    let host = match url::Url::parse(page_url) {
        Ok(parsed) => parsed.host_str().unwrap_or("").to_ascii_lowercase(),
        Err(_) => return Platform::Generic,
    };
    let matches = |domain: &str| host == domain || host.ends_with(&format!(".{}", domain));

    if matches("youtube.com") || matches("youtu.be") || matches("youtube-nocookie.com") {
        Platform::YouTube
    } else if matches("netflix.com") {
        Platform::Netflix
    } else {
        Platform::Generic
    }
}

/// Build the adapter for `platform` over `page`.
pub fn adapter_for(platform: Platform, page: Arc<dyn Page>) -> Arc<dyn PlatformAdapter> {
    match platform {
        Platform::YouTube => Arc::new(YouTubeAdapter::new(page)),
        Platform::Netflix => Arc::new(NetflixAdapter::new(page)),
        Platform::Generic => Arc::new(GenericAdapter::new(page)),
    }
}

/// Poll until the adapter resolves a video with metadata, or give up after
/// `timeout`.
pub async fn wait_for_video(
    adapter: &dyn PlatformAdapter,
    timeout: Duration,
    poll: Duration,
) -> Result<Arc<dyn MediaElement>> {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if adapter.is_video_ready() {
            if let Some(video) = adapter.get_video_element() {
                return Ok(video);
            }
        }
        if tokio::time::Instant::now() >= deadline {
            tracing::warn!(
                "No ready video on {} after {}ms",
                adapter.platform(),
                timeout.as_millis()
            );
            return Err(LexisubError::VideoNotFound(timeout.as_millis() as u64));
        }
        tokio::time::sleep(poll).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn youtube_page() -> (Arc<MemoryPage>, Arc<MemoryVideo>) {
        let page = Arc::new(MemoryPage::new("https://www.youtube.com/watch?v=abc"));
        let video = Arc::new(MemoryVideo::new(120.0));
        page.insert_video(".html5-main-video", Arc::clone(&video));
        (page, video)
    }

    #[test]
    fn test_detect_platform() {
        assert_eq!(detect_platform("https://www.youtube.com/watch?v=x"), Platform::YouTube);
        assert_eq!(detect_platform("https://youtu.be/x"), Platform::YouTube);
        assert_eq!(detect_platform("https://m.youtube.com/watch?v=x"), Platform::YouTube);
        assert_eq!(detect_platform("https://www.netflix.com/watch/123"), Platform::Netflix);
        assert_eq!(detect_platform("https://notyoutube.com/"), Platform::Generic);
        assert_eq!(detect_platform("https://example.org/video.html"), Platform::Generic);
        assert_eq!(detect_platform("not a url"), Platform::Generic);
    }

    #[test]
    fn test_adapter_for_platform() {
        let page: Arc<dyn Page> = Arc::new(MemoryPage::new("https://example.org"));
        for platform in [Platform::YouTube, Platform::Netflix, Platform::Generic] {
            assert_eq!(adapter_for(platform, Arc::clone(&page)).platform(), platform);
        }
    }

    #[test]
    fn test_video_revalidated_after_detach() {
        let (page, _video) = youtube_page();
        let adapter = YouTubeAdapter::new(page.clone());
        assert!(adapter.get_video_element().is_some());

        page.remove_video(".html5-main-video");
        assert!(adapter.get_video_element().is_none());

        let replacement = Arc::new(MemoryVideo::new(60.0));
        page.insert_video("#movie_player video", Arc::clone(&replacement));
        let found = adapter.get_video_element().unwrap();
        assert_eq!(found.duration(), 60.0);
    }

    #[test]
    fn test_controls_noop_without_video() {
        let page = Arc::new(MemoryPage::new("https://www.youtube.com/watch?v=abc"));
        let adapter = YouTubeAdapter::new(page);

        adapter.play();
        adapter.pause();
        adapter.seek(10.0);
        adapter.skip(5.0);
        adapter.set_playback_rate(2.0);

        assert!(!adapter.is_video_ready());
        assert_eq!(adapter.current_time(), 0.0);
        assert_eq!(adapter.duration(), 0.0);
        assert_eq!(adapter.playback_rate(), 1.0);
        assert!(adapter.is_paused());
    }

    #[test]
    fn test_seek_and_skip_clamp() {
        let (page, video) = youtube_page();
        let adapter = YouTubeAdapter::new(page);

        adapter.seek(30.0);
        assert_eq!(video.current_time(), 30.0);
        adapter.skip(-10.0);
        assert_eq!(video.current_time(), 20.0);
        adapter.skip(-100.0);
        assert_eq!(video.current_time(), 0.0);
        adapter.seek(500.0);
        assert_eq!(video.current_time(), 120.0);
        adapter.seek(f64::NAN);
        assert_eq!(video.current_time(), 120.0);
    }

    #[test]
    fn test_playback_rate() {
        let (page, video) = youtube_page();
        let adapter = YouTubeAdapter::new(page);
        adapter.set_playback_rate(1.5);
        assert_eq!(video.playback_rate(), 1.5);
        adapter.set_playback_rate(0.0);
        adapter.set_playback_rate(-1.0);
        assert_eq!(adapter.playback_rate(), 1.5);
    }

    #[test]
    fn test_hide_show_native_symmetric() {
        let (page, _video) = youtube_page();
        let layer = Arc::new(MemoryElement::with_display("block"));
        page.insert_element(".ytp-caption-window-container", Arc::clone(&layer));
        let adapter = YouTubeAdapter::new(page);

        assert!(adapter.hide_native_subtitles());
        assert_eq!(layer.display().as_deref(), Some("none"));
        // a second hide must not record "none" as the original
        assert!(adapter.hide_native_subtitles());

        adapter.show_native_subtitles();
        assert_eq!(layer.display().as_deref(), Some("block"));
        assert!(!adapter.core().native_hidden());
    }

    #[test]
    fn test_show_restores_unset_style() {
        let (page, _video) = youtube_page();
        let layer = Arc::new(MemoryElement::new());
        page.insert_element(".ytp-caption-window-container", Arc::clone(&layer));
        let adapter = YouTubeAdapter::new(page);

        adapter.hide_native_subtitles();
        adapter.show_native_subtitles();
        assert_eq!(layer.display(), None);
    }

    #[test]
    fn test_hide_without_layer() {
        let (page, _video) = youtube_page();
        let adapter = YouTubeAdapter::new(page);
        assert!(!adapter.hide_native_subtitles());
        adapter.show_native_subtitles();
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_video_times_out() {
        let page = Arc::new(MemoryPage::new("https://www.netflix.com/watch/1"));
        let adapter = NetflixAdapter::new(page);
        let result = wait_for_video(
            &adapter,
            Duration::from_millis(500),
            Duration::from_millis(100),
        )
        .await;
        assert!(matches!(result, Err(LexisubError::VideoNotFound(500))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_video_sees_late_metadata() {
        let page = Arc::new(MemoryPage::new("https://www.netflix.com/watch/1"));
        let video = Arc::new(MemoryVideo::loading());
        page.insert_video(".watch-video video", Arc::clone(&video));
        let adapter = NetflixAdapter::new(page);

        let loader = {
            let video = Arc::clone(&video);
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(300)).await;
                video.load_metadata(90.0);
            })
        };

        let found = wait_for_video(&adapter, Duration::from_secs(2), Duration::from_millis(100))
            .await
            .unwrap();
        assert_eq!(found.duration(), 90.0);
        loader.await.unwrap();
    }

    #[tokio::test]
    async fn test_intercept_filters_platform_and_replaces() {
        let page = Arc::new(MemoryPage::new("https://www.youtube.com/watch?v=abc"));
        let adapter: Arc<dyn PlatformAdapter> = Arc::new(YouTubeAdapter::new(page));
        let (tx, rx) = mpsc::channel(8);
        let (seg_tx, mut seg_rx) = mpsc::unbounded_channel();

        let task = Arc::clone(&adapter).intercept_subtitles(
            rx,
            Box::new(move |segments| {
                let _ = seg_tx.send(segments);
            }),
        );

        let vtt = "WEBVTT\n\n00:00:01.000 --> 00:00:02.000\nfirst\n";
        tx.send(CapturedSubtitle::new(Platform::Netflix, vtt)).await.unwrap();
        tx.send(CapturedSubtitle::new(Platform::YouTube, "garbage")).await.unwrap();
        tx.send(CapturedSubtitle::new(Platform::YouTube, vtt)).await.unwrap();
        drop(tx);

        task.await.unwrap();
        let delivered = seg_rx.recv().await.unwrap();
        assert_eq!(delivered, vec![Segment::new(1.0, 2.0, "first")]);
        assert!(seg_rx.try_recv().is_err());
    }
}
