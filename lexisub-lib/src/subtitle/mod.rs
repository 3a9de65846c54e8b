//! Subtitle format parsing
//!
//! This module turns raw subtitle payloads into the canonical segment list:
//! - WebVTT cue parsing
//! - TTML/DFXP document parsing
//! - SubRip block parsing
//! - Shared markup/whitespace cleaning
//!
//! Parsing never fails. Malformed cues are dropped, malformed timestamps
//! degrade to zero and unparsable documents yield an empty list.

pub mod clean;
pub mod srt;
pub mod ttml;
pub mod webvtt;

pub use clean::clean_text;
pub use srt::SrtParser;
pub use ttml::TtmlParser;
pub use webvtt::WebVttParser;

use crate::types::{Segment, SubtitleFormat};

/// Separator between start and end times in WebVTT and SRT timing lines.
pub const CUE_TIME_SEPARATOR: &str = "-->";

/// A parser for one subtitle wire format.
pub trait FormatParser: Send + Sync {
    /// Parse a raw payload into segments, in document order.
    fn parse(&self, raw: &str) -> Vec<Segment>;
}

/// Get the parser for a format.
pub fn parser_for(format: SubtitleFormat) -> &'static dyn FormatParser {
    match format {
        SubtitleFormat::WebVtt => &WebVttParser,
        SubtitleFormat::Ttml => &TtmlParser,
        SubtitleFormat::SubRip => &SrtParser,
    }
}

/// Parse a payload whose format is already known.
pub fn parse_with_format(format: SubtitleFormat, raw: &str) -> Vec<Segment> {
    let segments = parser_for(format).parse(raw);
    tracing::debug!("Parsed {} {} segment(s)", segments.len(), format);
    segments
}

/// Parse a payload by format name (`vtt`, `ttml`, `srt`, ...).
///
/// An unknown name logs a warning and yields no segments; ingestion must
/// never interrupt playback.
pub fn parse_subtitles(format_name: &str, raw: &str) -> Vec<Segment> {
    match format_name.parse::<SubtitleFormat>() {
        Ok(format) => parse_with_format(format, raw),
        Err(e) => {
            tracing::warn!("{}; ignoring {} byte payload", e, raw.len());
            Vec::new()
        }
    }
}

/// Parse a payload after sniffing its format.
pub fn parse_detected(raw: &str) -> Vec<Segment> {
    match SubtitleFormat::detect(raw) {
        Some(format) => parse_with_format(format, raw),
        None => {
            tracing::warn!("Could not detect subtitle format of {} byte payload", raw.len());
            Vec::new()
        }
    }
}

/// Append a parsed cue unless its text is empty or its end precedes its start.
pub(crate) fn push_segment(segments: &mut Vec<Segment>, start: f64, end: f64, text: String) {
    if text.is_empty() {
        return;
    }
    if end < start {
        tracing::debug!("Dropping cue {:?}: end {} before start {}", text, end, start);
        return;
    }
    segments.push(Segment::new(start, end, text));
}
