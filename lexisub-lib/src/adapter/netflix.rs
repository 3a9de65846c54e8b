use std::sync::Arc;

use super::page::Page;
use super::{AdapterCore, PlatformAdapter};
use crate::types::{Platform, SubtitleFormat};

/// Netflix player pages. Timed text arrives as DFXP/TTML.
pub struct NetflixAdapter {
    core: AdapterCore,
}

impl NetflixAdapter {
    pub fn new(page: Arc<dyn Page>) -> Self {
        Self {
            core: AdapterCore::new(page),
        }
    }
}

impl PlatformAdapter for NetflixAdapter {
    fn platform(&self) -> Platform {
        Platform::Netflix
    }

    fn core(&self) -> &AdapterCore {
        &self.core
    }

    fn video_selectors(&self) -> &'static [&'static str] {
        &[".watch-video video", "video"]
    }

    fn container_selectors(&self) -> &'static [&'static str] {
        &[".watch-video--player-view", ".watch-video"]
    }

    fn native_subtitle_selectors(&self) -> &'static [&'static str] {
        &[".player-timedtext"]
    }

    fn subtitle_format(&self) -> Option<SubtitleFormat> {
        Some(SubtitleFormat::Ttml)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{MemoryPage, MemoryVideo};
    use crate::types::{CapturedSubtitle, Segment};

    #[test]
    fn test_decodes_ttml() {
        let page = Arc::new(MemoryPage::new("https://www.netflix.com/watch/1"));
        let adapter = NetflixAdapter::new(page);
        let body = r#"<tt xmlns="http://www.w3.org/ns/ttml"><body><div>
            <p begin="1.5s" end="3s">Hallo <br/>Welt</p>
        </div></body></tt>"#;
        let segments = adapter.decode_subtitles(&CapturedSubtitle::new(Platform::Netflix, body));
        assert_eq!(segments, vec![Segment::new(1.5, 3.0, "Hallo Welt")]);
    }

    #[test]
    fn test_falls_back_to_bare_video() {
        let page = Arc::new(MemoryPage::new("https://www.netflix.com/watch/1"));
        page.insert_video("video", Arc::new(MemoryVideo::new(10.0)));
        let adapter = NetflixAdapter::new(page);
        assert!(adapter.is_video_ready());
    }
}
