//! Session and engine configuration

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::LexisubError;

/// How subtitles are presented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    /// No rendering and no sync loop
    Off,
    /// Active segment over the video
    #[default]
    Overlay,
    /// Full transcript with the active segment marked
    Transcript,
}

impl DisplayMode {
    pub fn name(&self) -> &'static str {
        match self {
            DisplayMode::Off => "off",
            DisplayMode::Overlay => "overlay",
            DisplayMode::Transcript => "transcript",
        }
    }
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DisplayMode {
    type Err = LexisubError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" => Ok(DisplayMode::Off),
            "overlay" => Ok(DisplayMode::Overlay),
            "transcript" => Ok(DisplayMode::Transcript),
            other => Err(LexisubError::Config(format!("unknown display mode {:?}", other))),
        }
    }
}

/// Learner-facing options, fixed for the lifetime of a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub display_mode: DisplayMode,

    /// Colour words by vocabulary status
    pub show_word_status: bool,

    /// Language being learnt (subtitle language)
    pub target_language: String,

    /// Learner's own language
    pub native_language: String,

    /// Hide the platform's own captions while ours are shown
    pub hide_native_subtitles: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            display_mode: DisplayMode::Overlay,
            show_word_status: true,
            target_language: "en".to_string(),
            native_language: "en".to_string(),
            hide_native_subtitles: true,
        }
    }
}

/// Timing of the engine's background work
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Playback position polling cadence
    pub sync_interval_ms: u64,

    /// Periodic vocabulary flush
    pub flush_interval_secs: u64,

    /// Give up discovering a ready video after this long
    pub discovery_timeout_ms: u64,

    /// Discovery polling cadence
    pub discovery_poll_ms: u64,

    /// Give up waiting for the native caption layer after this long
    pub container_timeout_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sync_interval_ms: 100,
            flush_interval_secs: 30,
            discovery_timeout_ms: 10_000,
            discovery_poll_ms: 250,
            container_timeout_ms: 10_000,
        }
    }
}

impl EngineConfig {
    pub fn sync_interval(&self) -> Duration {
        Duration::from_millis(self.sync_interval_ms.max(1))
    }

    pub fn flush_interval(&self) -> Duration {
        Duration::from_secs(self.flush_interval_secs.max(1))
    }

    pub fn discovery_timeout(&self) -> Duration {
        Duration::from_millis(self.discovery_timeout_ms)
    }

    pub fn discovery_poll(&self) -> Duration {
        Duration::from_millis(self.discovery_poll_ms.max(1))
    }

    pub fn container_timeout(&self) -> Duration {
        Duration::from_millis(self.container_timeout_ms)
    }
}

/// Where vocabulary state lives
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VocabConfig {
    /// Directory of the local store
    pub storage_dir: PathBuf,

    /// Base URL of the remote store; local-only when unset
    pub remote_url: Option<String>,

    /// Bearer token for the remote store
    pub auth_token: Option<String>,

    /// Remote request timeout in seconds
    pub request_timeout_secs: u64,
}

impl Default for VocabConfig {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from("./vocab"),
            remote_url: None,
            auth_token: None,
            request_timeout_secs: 10,
        }
    }
}

impl VocabConfig {
    /// A remote store plus an identity to push as.
    pub fn has_identity(&self) -> bool {
        self.remote_url.is_some() && self.auth_token.is_some()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let session = SessionConfig::default();
        assert_eq!(session.display_mode, DisplayMode::Overlay);
        assert!(session.show_word_status);

        let engine = EngineConfig::default();
        assert_eq!(engine.sync_interval(), Duration::from_millis(100));
        assert_eq!(engine.flush_interval(), Duration::from_secs(30));
        assert_eq!(engine.discovery_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_display_mode_parse() {
        assert_eq!("Transcript".parse::<DisplayMode>().unwrap(), DisplayMode::Transcript);
        assert_eq!(" off ".parse::<DisplayMode>().unwrap(), DisplayMode::Off);
        assert!("karaoke".parse::<DisplayMode>().is_err());
    }

    #[test]
    fn test_partial_toml() {
        let session: SessionConfig =
            toml::from_str("display_mode = \"transcript\"\ntarget_language = \"de\"").unwrap();
        assert_eq!(session.display_mode, DisplayMode::Transcript);
        assert_eq!(session.target_language, "de");
        assert!(session.hide_native_subtitles);
    }

    #[test]
    fn test_identity() {
        let mut vocab = VocabConfig::default();
        assert!(!vocab.has_identity());
        vocab.remote_url = Some("https://api.example.com".to_string());
        assert!(!vocab.has_identity());
        vocab.auth_token = Some("t".to_string());
        assert!(vocab.has_identity());
    }
}
