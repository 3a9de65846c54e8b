//! Playback session
//!
//! A [`Session`] ties one page to the engine: it picks the adapter once,
//! discovers the video within a bounded window, owns the single subtitle
//! feed registration, drives the sync loop and the vocabulary flush worker,
//! and undoes all of it exactly once in [`Session::teardown`].

use parking_lot::Mutex;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::adapter::{
    adapter_for, detect_platform, wait_for_video, watch_for_element, Page, PlatformAdapter,
};
use crate::config::{DisplayMode, EngineConfig, SessionConfig};
use crate::error::Result;
use crate::render::{OverlayFrame, OverlayRenderer, TranscriptRenderer, TranscriptView};
use crate::sync::{spawn_sync_loop, SyncListener, SyncLoop};
use crate::tokenizer::unique_words;
use crate::types::{CapturedSubtitle, Platform, Segment};
use crate::vocab::{VocabCache, VocabEntry, VocabStatus, VocabSyncWorker};

/// Lifecycle of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// Discovery still running
    Starting,
    Active,
    /// No video was found in time; nothing runs
    Inactive,
    Closed,
}

/// Snapshot of the playback surface.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaybackState {
    pub ready: bool,
    pub current_time: f64,
    pub duration: f64,
    pub paused: bool,
    pub playback_rate: f64,
}

#[derive(Default)]
struct SessionTasks {
    feed: Option<JoinHandle<()>>,
    sync: Option<JoinHandle<()>>,
    native_watch: Option<JoinHandle<bool>>,
    vocab_worker: Option<VocabSyncWorker>,
}

impl SessionTasks {
    fn stop_all(&mut self) {
        if let Some(task) = self.feed.take() {
            task.abort();
        }
        if let Some(task) = self.sync.take() {
            task.abort();
        }
        if let Some(task) = self.native_watch.take() {
            task.abort();
        }
        if let Some(worker) = self.vocab_worker.take() {
            worker.stop();
        }
    }
}

pub struct Session {
    config: SessionConfig,
    adapter: Arc<dyn PlatformAdapter>,
    vocab: Arc<VocabCache>,
    sync: Arc<Mutex<SyncLoop>>,
    overlay: Option<Arc<OverlayRenderer>>,
    transcript: Option<Arc<TranscriptRenderer>>,
    state: Mutex<SessionState>,
    tasks: Mutex<SessionTasks>,
    torn_down: AtomicBool,
}

impl Session {
    /// Start a session on `page`.
    ///
    /// Captured subtitle payloads are read from `feed` for the whole session.
    /// If no ready video appears within the discovery window the session is
    /// returned in [`SessionState::Inactive`] and `feed` is dropped.
    pub async fn start(
        page: Arc<dyn Page>,
        config: SessionConfig,
        engine: EngineConfig,
        vocab: Arc<VocabCache>,
        feed: mpsc::Receiver<CapturedSubtitle>,
    ) -> Self {
        let platform = detect_platform(&page.url());
        tracing::info!(
            "Starting {} session for {} ({} mode)",
            platform,
            page.url(),
            config.display_mode
        );
        let adapter = adapter_for(platform, page);

        let (overlay, transcript) = match config.display_mode {
            DisplayMode::Off => (None, None),
            DisplayMode::Overlay => (
                Some(Arc::new(OverlayRenderer::new(
                    Arc::clone(&vocab),
                    config.show_word_status,
                ))),
                None,
            ),
            DisplayMode::Transcript => (None, Some(Arc::new(TranscriptRenderer::new()))),
        };

        let session = Self {
            config,
            adapter,
            vocab,
            sync: Arc::new(Mutex::new(SyncLoop::new())),
            overlay,
            transcript,
            state: Mutex::new(SessionState::Starting),
            tasks: Mutex::new(SessionTasks::default()),
            torn_down: AtomicBool::new(false),
        };

        session.tasks.lock().vocab_worker = Some(VocabSyncWorker::spawn(
            Arc::clone(&session.vocab),
            engine.flush_interval(),
        ));

        if let Err(e) = wait_for_video(
            session.adapter.as_ref(),
            engine.discovery_timeout(),
            engine.discovery_poll(),
        )
        .await
        {
            tracing::warn!("Session inactive: {}", e);
            session.set_state(SessionState::Inactive);
            return session;
        }

        session.register_feed(feed);

        if session.config.hide_native_subtitles && session.config.display_mode != DisplayMode::Off
        {
            session.hide_native(&engine);
        }

        if let Some(listener) = session.listener() {
            let task = spawn_sync_loop(
                Arc::clone(&session.adapter),
                Arc::clone(&session.sync),
                listener,
                engine.sync_interval(),
            );
            session.tasks.lock().sync = Some(task);
        }

        session.set_state(SessionState::Active);
        session
    }

    fn listener(&self) -> Option<Arc<dyn SyncListener>> {
        if let Some(overlay) = &self.overlay {
            return Some(Arc::clone(overlay) as Arc<dyn SyncListener>);
        }
        self.transcript
            .as_ref()
            .map(|t| Arc::clone(t) as Arc<dyn SyncListener>)
    }

    fn register_feed(&self, feed: mpsc::Receiver<CapturedSubtitle>) {
        let sync = Arc::clone(&self.sync);
        let listener = self.listener();
        let vocab = Arc::clone(&self.vocab);

        let on_segments = Box::new(move |segments: Vec<Segment>| {
            let words: Vec<String> = segments.iter().flat_map(|s| unique_words(&s.text)).collect();
            {
                let mut sync = sync.lock();
                sync.replace_segments(segments);
                if let Some(listener) = &listener {
                    listener.segments_replaced(sync.timeline().segments(), sync.active_index());
                }
            }
            if vocab.has_remote() {
                let vocab = Arc::clone(&vocab);
                tokio::spawn(async move {
                    if let Some(added) = vocab.hydrate_missing(&words).await {
                        tracing::debug!("Hydrated {} vocabulary entries", added);
                    }
                });
            }
        });

        let task = Arc::clone(&self.adapter).intercept_subtitles(feed, on_segments);
        self.tasks.lock().feed = Some(task);
    }

    fn hide_native(&self, engine: &EngineConfig) {
        if self.adapter.hide_native_subtitles() {
            return;
        }
        tracing::debug!("Native caption layer not present yet, watching for it");
        let resolver = Arc::clone(&self.adapter);
        let hider = Arc::clone(&self.adapter);
        let task = watch_for_element(
            Arc::clone(self.adapter.core().page()),
            engine.container_timeout(),
            move || {
                resolver
                    .core()
                    .resolve_element(resolver.native_subtitle_selectors())
            },
            move |_| async move {
                hider.hide_native_subtitles();
            },
        );
        self.tasks.lock().native_watch = Some(task);
    }

    fn set_state(&self, state: SessionState) {
        *self.state.lock() = state;
    }

    /// Stop every task, restore native captions and close the session.
    ///
    /// Only the first call does anything; it returns whether it did. An
    /// in-flight vocabulary flush is left to finish in the background.
    pub fn teardown(&self) -> bool {
        if self.torn_down.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.tasks.lock().stop_all();
        self.adapter.show_native_subtitles();
        self.set_state(SessionState::Closed);
        tracing::info!("{} session closed", self.adapter.platform());
        true
    }

    pub fn state(&self) -> SessionState {
        *self.state.lock()
    }

    pub fn platform(&self) -> Platform {
        self.adapter.platform()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Playback controls; all calls are safe without a video.
    pub fn adapter(&self) -> &Arc<dyn PlatformAdapter> {
        &self.adapter
    }

    pub fn vocab(&self) -> &Arc<VocabCache> {
        &self.vocab
    }

    pub fn playback(&self) -> PlaybackState {
        PlaybackState {
            ready: self.adapter.is_video_ready(),
            current_time: self.adapter.current_time(),
            duration: self.adapter.duration(),
            paused: self.adapter.is_paused(),
            playback_rate: self.adapter.playback_rate(),
        }
    }

    pub fn segment_count(&self) -> usize {
        self.sync.lock().timeline().len()
    }

    pub fn active_segment(&self) -> Option<Segment> {
        self.sync.lock().active().cloned()
    }

    /// Current overlay frame; `None` outside overlay mode or between cues.
    pub fn overlay_frame(&self) -> Option<OverlayFrame> {
        self.overlay.as_ref().and_then(|o| o.frame())
    }

    /// Transcript view; `None` outside transcript mode.
    pub fn transcript_view(&self) -> Option<TranscriptView> {
        self.transcript.as_ref().map(|t| t.view())
    }

    /// Set a word's status and recolour the overlay.
    pub fn update_word_status(&self, word: &str, status: VocabStatus) -> Result<VocabEntry> {
        let result = self.vocab.update_status(word, status);
        if let Some(overlay) = &self.overlay {
            overlay.refresh();
        }
        result
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{Element, MediaElement, MemoryElement, MemoryPage, MemoryVideo};
    use crate::vocab::MemoryVocabStore;
    use std::time::Duration;

    const VTT: &str = "WEBVTT\n\n00:00:00.000 --> 00:00:02.000\nLe <b>chat</b>\n\n\
                       00:00:02.500 --> 00:00:04.000\nLe chien\n";

    fn engine() -> EngineConfig {
        EngineConfig {
            discovery_timeout_ms: 1_000,
            discovery_poll_ms: 100,
            container_timeout_ms: 1_000,
            ..Default::default()
        }
    }

    fn vocab() -> Arc<VocabCache> {
        Arc::new(VocabCache::open("fr", Arc::new(MemoryVocabStore::new()), None))
    }

    fn youtube() -> (Arc<MemoryPage>, Arc<MemoryVideo>) {
        let page = Arc::new(MemoryPage::new("https://www.youtube.com/watch?v=x"));
        let video = Arc::new(MemoryVideo::new(60.0));
        page.insert_video(".html5-main-video", Arc::clone(&video));
        (page, video)
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlay_session_follows_playback() {
        let (page, video) = youtube();
        let layer = Arc::new(MemoryElement::with_display("block"));
        page.insert_element(".ytp-caption-window-container", Arc::clone(&layer));
        let (tx, rx) = mpsc::channel(4);

        let session = Session::start(page, SessionConfig::default(), engine(), vocab(), rx).await;
        assert_eq!(session.state(), SessionState::Active);
        assert_eq!(session.platform(), Platform::YouTube);
        assert_eq!(layer.display().as_deref(), Some("none"));

        tx.send(CapturedSubtitle::new(Platform::YouTube, VTT)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(session.segment_count(), 2);
        assert_eq!(session.overlay_frame().unwrap().text, "Le chat");

        video.set_current_time(3.0);
        tokio::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(session.active_segment().unwrap().text, "Le chien");

        session
            .update_word_status("chien", VocabStatus::Known)
            .unwrap();
        let frame = session.overlay_frame().unwrap();
        let chien = frame.tokens.iter().find(|t| t.text == "chien").unwrap();
        assert_eq!(chien.status, Some(VocabStatus::Known));

        assert!(session.teardown());
        assert!(!session.teardown());
        assert_eq!(session.state(), SessionState::Closed);
        assert_eq!(layer.display().as_deref(), Some("block"));
        // the feed registration is gone
        tokio::time::timeout(Duration::from_secs(1), tx.closed())
            .await
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_sync_stops_after_teardown() {
        let (page, video) = youtube();
        let (tx, rx) = mpsc::channel(4);
        let session = Session::start(page, SessionConfig::default(), engine(), vocab(), rx).await;
        tx.send(CapturedSubtitle::new(Platform::YouTube, VTT)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(250)).await;
        assert!(session.active_segment().is_some());

        session.teardown();
        video.set_current_time(10.0);
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(session.active_segment().unwrap().text, "Le chat");
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_video_leaves_session_inactive() {
        let page = Arc::new(MemoryPage::new("https://www.netflix.com/watch/1"));
        let (tx, rx) = mpsc::channel(4);
        let session = Session::start(page, SessionConfig::default(), engine(), vocab(), rx).await;

        assert_eq!(session.state(), SessionState::Inactive);
        assert!(tx.is_closed());
        assert!(!session.playback().ready);
        session.adapter().play();
        assert!(session.teardown());
    }

    #[tokio::test(start_paused = true)]
    async fn test_off_mode_renders_nothing() {
        let (page, _video) = youtube();
        let layer = Arc::new(MemoryElement::with_display("block"));
        page.insert_element(".ytp-caption-window-container", Arc::clone(&layer));
        let config = SessionConfig {
            display_mode: DisplayMode::Off,
            ..Default::default()
        };
        let (tx, rx) = mpsc::channel(4);
        let session = Session::start(page, config, engine(), vocab(), rx).await;

        tx.send(CapturedSubtitle::new(Platform::YouTube, VTT)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(session.segment_count(), 2);
        assert!(session.active_segment().is_none());
        assert!(session.overlay_frame().is_none());
        assert_eq!(layer.display().as_deref(), Some("block"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transcript_mode_and_late_caption_layer() {
        let (page, _video) = youtube();
        let config = SessionConfig {
            display_mode: DisplayMode::Transcript,
            ..Default::default()
        };
        let (tx, rx) = mpsc::channel(4);
        let session = Session::start(page.clone(), config, engine(), vocab(), rx).await;

        let layer = Arc::new(MemoryElement::new());
        page.insert_element(".ytp-caption-window-container", Arc::clone(&layer));
        tx.send(CapturedSubtitle::new(Platform::YouTube, VTT)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(250)).await;

        assert_eq!(layer.display().as_deref(), Some("none"));
        let view = session.transcript_view().unwrap();
        assert_eq!(view.segments.len(), 2);
        assert_eq!(view.active_index, Some(0));

        session.teardown();
        assert_eq!(layer.display(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_bad_payload_keeps_working_set() {
        let (page, _video) = youtube();
        let (tx, rx) = mpsc::channel(4);
        let session = Session::start(page, SessionConfig::default(), engine(), vocab(), rx).await;

        tx.send(CapturedSubtitle::new(Platform::YouTube, VTT)).await.unwrap();
        tx.send(CapturedSubtitle::new(Platform::YouTube, "<<broken>>")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(session.segment_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_playback_surface() {
        let (page, video) = youtube();
        let (_tx, rx) = mpsc::channel(4);
        let session = Session::start(page, SessionConfig::default(), engine(), vocab(), rx).await;

        session.adapter().seek(12.0);
        session.adapter().set_playback_rate(1.25);
        session.adapter().play();
        let state = session.playback();
        assert!(state.ready);
        assert!(!state.paused);
        assert_eq!(state.current_time, 12.0);
        assert_eq!(state.duration, 60.0);
        assert_eq!(state.playback_rate, 1.25);
        assert!(!video.paused());
    }
}
