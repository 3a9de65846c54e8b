use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::LexisubError;

/// A timed unit of subtitle text.
///
/// Produced only by the format parsers; text is already cleaned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Start offset in seconds
    pub start_time: f64,
    /// End offset in seconds
    pub end_time: f64,
    /// Cleaned display text
    pub text: String,
}

impl Segment {
    pub fn new(start_time: f64, end_time: f64, text: impl Into<String>) -> Self {
        Self {
            start_time,
            end_time,
            text: text.into(),
        }
    }

    /// Duration in seconds
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }

    /// Whether playback position `t` falls inside this segment (both ends inclusive).
    pub fn contains(&self, t: f64) -> bool {
        self.start_time <= t && t <= self.end_time
    }

    /// Value identity used to detect active-segment changes.
    pub fn same_cue(&self, other: &Segment) -> bool {
        self.start_time == other.start_time && self.text == other.text
    }
}

/// Supported subtitle wire formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubtitleFormat {
    WebVtt,
    Ttml,
    SubRip,
}

impl SubtitleFormat {
    /// Guess the format of a raw payload from its leading content.
    pub fn detect(raw: &str) -> Option<SubtitleFormat> {
        let head = raw.trim_start_matches('\u{feff}').trim_start();
        if head.starts_with("WEBVTT") {
            return Some(SubtitleFormat::WebVtt);
        }
        if head.starts_with("<?xml") || head.starts_with("<tt") {
            return Some(SubtitleFormat::Ttml);
        }
        if regex!(r"\d{1,2}:\d{2}:\d{2},\d{1,3}\s*-->").is_match(head) {
            return Some(SubtitleFormat::SubRip);
        }
        if head.contains("-->") {
            return Some(SubtitleFormat::WebVtt);
        }
        None
    }

    pub fn name(&self) -> &'static str {
        match self {
            SubtitleFormat::WebVtt => "webvtt",
            SubtitleFormat::Ttml => "ttml",
            SubtitleFormat::SubRip => "srt",
        }
    }
}

impl fmt::Display for SubtitleFormat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SubtitleFormat {
    type Err = LexisubError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "vtt" | "webvtt" => Ok(SubtitleFormat::WebVtt),
            "ttml" | "dfxp" | "xml" => Ok(SubtitleFormat::Ttml),
            "srt" | "subrip" => Ok(SubtitleFormat::SubRip),
            _ => Err(LexisubError::UnknownFormat(s.to_string())),
        }
    }
}

/// Streaming sources with a dedicated adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    YouTube,
    Netflix,
    Generic,
}

impl Platform {
    pub fn name(&self) -> &'static str {
        match self {
            Platform::YouTube => "youtube",
            Platform::Netflix => "netflix",
            Platform::Generic => "generic",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Platform {
    type Err = LexisubError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "youtube" => Ok(Platform::YouTube),
            "netflix" => Ok(Platform::Netflix),
            "generic" | "html5" => Ok(Platform::Generic),
            _ => Err(LexisubError::Config(format!("Unknown platform: {}", s))),
        }
    }
}

/// A raw subtitle payload captured from the page, tagged with its source.
#[derive(Debug, Clone)]
pub struct CapturedSubtitle {
    pub platform: Platform,
    /// Explicit format, when the capture path knows it
    pub format: Option<SubtitleFormat>,
    pub body: String,
}

impl CapturedSubtitle {
    pub fn new(platform: Platform, body: impl Into<String>) -> Self {
        Self {
            platform,
            format: None,
            body: body.into(),
        }
    }

    pub fn with_format(mut self, format: SubtitleFormat) -> Self {
        self.format = Some(format);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_contains_inclusive() {
        let seg = Segment::new(1.0, 2.0, "hi");
        assert!(seg.contains(1.0));
        assert!(seg.contains(2.0));
        assert!(!seg.contains(2.001));
        assert_eq!(seg.duration(), 1.0);
    }

    #[test]
    fn test_same_cue_ignores_end() {
        let a = Segment::new(1.0, 2.0, "hi");
        let b = Segment::new(1.0, 3.0, "hi");
        let c = Segment::new(1.0, 2.0, "ho");
        assert!(a.same_cue(&b));
        assert!(!a.same_cue(&c));
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("VTT".parse::<SubtitleFormat>().unwrap(), SubtitleFormat::WebVtt);
        assert_eq!("dfxp".parse::<SubtitleFormat>().unwrap(), SubtitleFormat::Ttml);
        assert_eq!("subrip".parse::<SubtitleFormat>().unwrap(), SubtitleFormat::SubRip);
        assert!("ass".parse::<SubtitleFormat>().is_err());
    }

    #[test]
    fn test_format_detect() {
        assert_eq!(
            SubtitleFormat::detect("WEBVTT\n\n00:00.000 --> 00:01.000\nhi"),
            Some(SubtitleFormat::WebVtt)
        );
        assert_eq!(
            SubtitleFormat::detect("<?xml version=\"1.0\"?><tt></tt>"),
            Some(SubtitleFormat::Ttml)
        );
        assert_eq!(
            SubtitleFormat::detect("1\n00:00:01,000 --> 00:00:02,000\nhi"),
            Some(SubtitleFormat::SubRip)
        );
        assert_eq!(SubtitleFormat::detect("just text"), None);
    }

    #[test]
    fn test_platform_from_str() {
        assert_eq!("YouTube".parse::<Platform>().unwrap(), Platform::YouTube);
        assert_eq!("html5".parse::<Platform>().unwrap(), Platform::Generic);
        assert!("hulu".parse::<Platform>().is_err());
    }
}
