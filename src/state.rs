//! Application state management
//!
//! This module defines the AppState structure that holds:
//! - The headless page and its simulated video
//! - The playback session and its subtitle feed
//! - Server configuration

use chrono::{DateTime, Utc};
use lexisub_lib::{
    adapter_for, detect_platform, CapturedSubtitle, MemoryElement, MemoryPage, MemoryVideo,
    PlatformAdapter, Session, VocabCache,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::error::{Result, ServerError};

/// Shared application state
pub struct AppState {
    pub config: ServerConfig,
    pub session_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub session: Session,
    feed: mpsc::Sender<CapturedSubtitle>,
    payloads_received: AtomicU64,
}

impl AppState {
    /// Build the headless page and start a session on it.
    pub async fn start(config: ServerConfig) -> Result<Self> {
        let page = Arc::new(MemoryPage::new(&config.page.url));

        // attach elements where this platform's adapter looks first
        let profile = adapter_for(detect_platform(&config.page.url), page.clone());
        let video_selector = first_selector(profile.video_selectors(), "video");
        page.insert_video(
            video_selector,
            Arc::new(MemoryVideo::new(config.page.video_duration_secs)),
        );
        if config.page.native_captions {
            let native = first_selector(profile.native_subtitle_selectors(), ".captions");
            page.insert_element(native, Arc::new(MemoryElement::with_display("block")));
        }
        drop(profile);

        let vocab = Arc::new(VocabCache::from_config(
            &config.session.target_language,
            &config.vocab,
        )?);

        let (feed, rx) = mpsc::channel(config.feed_capacity.max(1));
        let session = Session::start(
            page,
            config.session.clone(),
            config.engine.clone(),
            vocab,
            rx,
        )
        .await;

        let session_id = Uuid::new_v4();
        tracing::info!(
            "Session {} on {} is {:?}",
            session_id,
            session.platform(),
            session.state()
        );

        Ok(Self {
            config,
            session_id,
            started_at: Utc::now(),
            session,
            feed,
            payloads_received: AtomicU64::new(0),
        })
    }

    /// Hand a captured payload to the session's adapter.
    pub fn submit_subtitles(&self, captured: CapturedSubtitle) -> Result<()> {
        match self.feed.try_send(captured) {
            Ok(()) => {
                self.payloads_received.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Err(TrySendError::Full(_)) => Err(ServerError::FeedFull),
            Err(TrySendError::Closed(_)) => Err(ServerError::SessionInactive(format!(
                "{:?}",
                self.session.state()
            ))),
        }
    }

    pub fn payloads_received(&self) -> u64 {
        self.payloads_received.load(Ordering::Relaxed)
    }

    /// Stop the session; used on shutdown.
    pub fn shutdown(&self) {
        if self.session.teardown() {
            tracing::info!("Session {} torn down", self.session_id);
        }
    }
}

fn first_selector(selectors: &'static [&'static str], fallback: &'static str) -> &'static str {
    selectors.first().copied().unwrap_or(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lexisub_lib::{Platform, SessionState};

    fn test_config(storage: &std::path::Path) -> ServerConfig {
        let mut config = ServerConfig::default();
        config.vocab.storage_dir = storage.to_path_buf();
        config
    }

    #[tokio::test]
    async fn test_start_attaches_page() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::start(test_config(dir.path())).await.unwrap();

        assert_eq!(state.session.state(), SessionState::Active);
        assert_eq!(state.session.platform(), Platform::YouTube);
        assert!(state.session.adapter().core().native_hidden());
        state.shutdown();
        assert_eq!(state.session.state(), SessionState::Closed);
    }

    #[tokio::test]
    async fn test_submit_after_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::start(test_config(dir.path())).await.unwrap();
        state.shutdown();
        // the aborted feed task drops its receiver once the runtime reaps it
        for _ in 0..100 {
            if state.feed.is_closed() {
                break;
            }
            tokio::task::yield_now().await;
        }
        let err = state
            .submit_subtitles(CapturedSubtitle::new(Platform::YouTube, "WEBVTT"))
            .unwrap_err();
        assert!(matches!(err, ServerError::SessionInactive(_)));
    }

    #[tokio::test]
    async fn test_bad_remote_url() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config(dir.path());
        config.vocab.remote_url = Some("localhost:9000".to_string());
        assert!(AppState::start(config).await.is_err());
    }
}
