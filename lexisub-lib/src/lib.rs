//! Subtitle ingestion, playback synchronization and vocabulary tracking.

// Compile a regex literal once and reuse it.
macro_rules! regex {
    ($re:literal $(,)?) => {{
        static RE: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();
        RE.get_or_init(|| regex::Regex::new($re).unwrap())
    }};
}

pub mod adapter;
pub(crate) mod config;
pub(crate) mod error;
pub mod render;
pub(crate) mod session;
pub mod subtitle;
pub mod sync;
pub(crate) mod timestamp;
pub mod tokenizer;
pub(crate) mod types;
pub mod vocab;

pub use adapter::{
    adapter_for, detect_platform, MemoryElement, MemoryPage, MemoryVideo, Page, PlatformAdapter,
};
pub use config::{DisplayMode, EngineConfig, SessionConfig, VocabConfig};
pub use error::{LexisubError, Result};
pub use render::{OverlayFrame, RenderedToken, TranscriptView};
pub use session::{PlaybackState, Session, SessionState};
pub use subtitle::{parse_detected, parse_subtitles, parse_with_format};
pub use sync::{SegmentTimeline, SyncLoop};
pub use timestamp::parse_timestamp;
pub use tokenizer::{color_for, tokenize, Token, TokenKind};
pub use types::{CapturedSubtitle, Platform, Segment, SubtitleFormat};
pub use vocab::{VocabCache, VocabEntry, VocabStats, VocabStatus};
