use std::sync::Arc;

use super::page::Page;
use super::{AdapterCore, PlatformAdapter};
use crate::types::{Platform, SubtitleFormat};

/// Any page with a plain HTML5 video. Payload formats are sniffed.
pub struct GenericAdapter {
    core: AdapterCore,
}

impl GenericAdapter {
    pub fn new(page: Arc<dyn Page>) -> Self {
        Self {
            core: AdapterCore::new(page),
        }
    }
}

impl PlatformAdapter for GenericAdapter {
    fn platform(&self) -> Platform {
        Platform::Generic
    }

    fn core(&self) -> &AdapterCore {
        &self.core
    }

    fn video_selectors(&self) -> &'static [&'static str] {
        &["video"]
    }

    fn container_selectors(&self) -> &'static [&'static str] {
        &[".video-js", ".plyr", "video"]
    }

    fn native_subtitle_selectors(&self) -> &'static [&'static str] {
        &[".vjs-text-track-display", ".plyr__captions"]
    }

    fn subtitle_format(&self) -> Option<SubtitleFormat> {
        None
    }
}
