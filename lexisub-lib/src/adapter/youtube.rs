use std::sync::Arc;

use super::page::Page;
use super::{AdapterCore, PlatformAdapter};
use crate::types::{Platform, SubtitleFormat};

/// YouTube watch pages. Timed text is requested as `fmt=vtt`.
pub struct YouTubeAdapter {
    core: AdapterCore,
}

impl YouTubeAdapter {
    pub fn new(page: Arc<dyn Page>) -> Self {
        Self {
            core: AdapterCore::new(page),
        }
    }
}

impl PlatformAdapter for YouTubeAdapter {
    fn platform(&self) -> Platform {
        Platform::YouTube
    }

    fn core(&self) -> &AdapterCore {
        &self.core
    }

    fn video_selectors(&self) -> &'static [&'static str] {
        &[".html5-main-video", "video.video-stream", "#movie_player video"]
    }

    fn container_selectors(&self) -> &'static [&'static str] {
        &["#movie_player", ".html5-video-player"]
    }

    fn native_subtitle_selectors(&self) -> &'static [&'static str] {
        &[".ytp-caption-window-container", ".caption-window"]
    }

    fn subtitle_format(&self) -> Option<SubtitleFormat> {
        Some(SubtitleFormat::WebVtt)
    }
}
