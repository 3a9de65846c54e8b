//! Configuration file support
//!
//! Loads daemon configuration from TOML files.

use lexisub_lib::{DisplayMode, EngineConfig, SessionConfig, VocabConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::config::{PageConfig, ServerConfig};

/// Configuration file format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Server settings
    pub server: ServerSettings,
    /// Headless page settings
    pub page: PageSettings,
    /// Learner settings
    pub session: SessionSettings,
    /// Engine timing
    pub engine: Option<EngineSettings>,
    /// Vocabulary store settings
    pub vocab: VocabSettings,
    /// Logging settings
    pub logging: Option<LoggingSettings>,
    /// Limits settings
    pub limits: Option<LimitsSettings>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Host address to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Enable CORS
    pub cors_enabled: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageSettings {
    /// Page URL
    pub url: String,
    /// Simulated video duration in seconds
    pub video_duration_secs: Option<f64>,
    /// Attach a native caption layer
    pub native_captions: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSettings {
    /// Display mode (off, overlay, transcript)
    pub display_mode: DisplayMode,
    /// Colour words by status
    pub show_word_status: Option<bool>,
    /// Language being learnt
    pub target_language: String,
    /// Learner's language
    pub native_language: Option<String>,
    /// Hide the platform's captions
    pub hide_native_subtitles: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Playback polling cadence in milliseconds
    pub sync_interval_ms: Option<u64>,
    /// Periodic flush interval in seconds
    pub flush_interval_secs: Option<u64>,
    /// Video discovery timeout in milliseconds
    pub discovery_timeout_ms: Option<u64>,
    /// Video discovery polling cadence in milliseconds
    pub discovery_poll_ms: Option<u64>,
    /// Caption layer wait in milliseconds
    pub container_timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VocabSettings {
    /// Local store directory
    pub storage_dir: PathBuf,
    /// Remote store base URL
    pub remote_url: Option<String>,
    /// Remote bearer token
    pub auth_token: Option<String>,
    /// Remote request timeout in seconds
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Output format (json, pretty)
    pub format: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsSettings {
    /// Captured payloads buffered ahead of the adapter
    pub feed_capacity: Option<usize>,
    /// Maximum subtitle payload size in MB
    pub max_payload_mb: Option<usize>,
}

impl ConfigFile {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: ConfigFile = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), content)?;
        Ok(())
    }

    /// Generate default configuration file
    pub fn default_config() -> Self {
        Self {
            server: ServerSettings {
                host: "0.0.0.0".to_string(),
                port: 3000,
                cors_enabled: Some(true),
            },
            page: PageSettings {
                url: "https://www.youtube.com/watch?v=lexisub".to_string(),
                video_duration_secs: Some(600.0),
                native_captions: Some(true),
            },
            session: SessionSettings {
                display_mode: DisplayMode::Overlay,
                show_word_status: Some(true),
                target_language: "en".to_string(),
                native_language: Some("en".to_string()),
                hide_native_subtitles: Some(true),
            },
            engine: Some(EngineSettings {
                sync_interval_ms: Some(100),
                flush_interval_secs: Some(30),
                discovery_timeout_ms: Some(10_000),
                discovery_poll_ms: Some(250),
                container_timeout_ms: Some(10_000),
            }),
            vocab: VocabSettings {
                storage_dir: PathBuf::from("./vocab"),
                remote_url: None,
                auth_token: None,
                request_timeout_secs: Some(10),
            },
            logging: Some(LoggingSettings {
                level: "info".to_string(),
                format: Some("pretty".to_string()),
            }),
            limits: Some(LimitsSettings {
                feed_capacity: Some(16),
                max_payload_mb: Some(10),
            }),
        }
    }

    /// Convert to ServerConfig
    pub fn into_server_config(self) -> ServerConfig {
        let page_defaults = PageConfig::default();
        let session_defaults = SessionConfig::default();
        let engine_defaults = EngineConfig::default();
        let vocab_defaults = VocabConfig::default();
        let server_defaults = ServerConfig::default();
        let engine = self.engine.as_ref();

        ServerConfig {
            host: self.server.host,
            port: self.server.port,
            cors_enabled: self.server.cors_enabled.unwrap_or(true),
            log_level: self
                .logging
                .as_ref()
                .map(|l| l.level.clone())
                .unwrap_or_else(|| "info".to_string()),
            log_format: self
                .logging
                .as_ref()
                .and_then(|l| l.format.clone())
                .unwrap_or_else(|| "pretty".to_string()),
            feed_capacity: self
                .limits
                .as_ref()
                .and_then(|l| l.feed_capacity)
                .unwrap_or(server_defaults.feed_capacity),
            max_payload_mb: self
                .limits
                .as_ref()
                .and_then(|l| l.max_payload_mb)
                .unwrap_or(server_defaults.max_payload_mb),
            page: PageConfig {
                url: self.page.url,
                video_duration_secs: self
                    .page
                    .video_duration_secs
                    .unwrap_or(page_defaults.video_duration_secs),
                native_captions: self
                    .page
                    .native_captions
                    .unwrap_or(page_defaults.native_captions),
            },
            session: SessionConfig {
                display_mode: self.session.display_mode,
                show_word_status: self
                    .session
                    .show_word_status
                    .unwrap_or(session_defaults.show_word_status),
                native_language: self
                    .session
                    .native_language
                    .unwrap_or_else(|| self.session.target_language.clone()),
                target_language: self.session.target_language,
                hide_native_subtitles: self
                    .session
                    .hide_native_subtitles
                    .unwrap_or(session_defaults.hide_native_subtitles),
            },
            engine: EngineConfig {
                sync_interval_ms: engine
                    .and_then(|e| e.sync_interval_ms)
                    .unwrap_or(engine_defaults.sync_interval_ms),
                flush_interval_secs: engine
                    .and_then(|e| e.flush_interval_secs)
                    .unwrap_or(engine_defaults.flush_interval_secs),
                discovery_timeout_ms: engine
                    .and_then(|e| e.discovery_timeout_ms)
                    .unwrap_or(engine_defaults.discovery_timeout_ms),
                discovery_poll_ms: engine
                    .and_then(|e| e.discovery_poll_ms)
                    .unwrap_or(engine_defaults.discovery_poll_ms),
                container_timeout_ms: engine
                    .and_then(|e| e.container_timeout_ms)
                    .unwrap_or(engine_defaults.container_timeout_ms),
            },
            vocab: VocabConfig {
                storage_dir: self.vocab.storage_dir,
                remote_url: self.vocab.remote_url,
                auth_token: self.vocab.auth_token,
                request_timeout_secs: self
                    .vocab
                    .request_timeout_secs
                    .unwrap_or(vocab_defaults.request_timeout_secs),
            },
        }
    }
}

/// Generate default configuration file at the specified path
pub fn generate_default_config<P: AsRef<Path>>(path: P) -> Result<(), Box<dyn std::error::Error>> {
    let config = ConfigFile::default_config();
    config.to_file(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = ConfigFile::default_config();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.session.display_mode, DisplayMode::Overlay);
        assert!(config.vocab.remote_url.is_none());
    }

    #[test]
    fn test_config_file_roundtrip() {
        let config = ConfigFile::default_config();

        let mut temp_file = NamedTempFile::new().unwrap();
        let content = toml::to_string_pretty(&config).unwrap();
        temp_file.write_all(content.as_bytes()).unwrap();

        let loaded = ConfigFile::from_file(temp_file.path()).unwrap();
        assert_eq!(loaded.server.port, config.server.port);
        assert_eq!(loaded.page.url, config.page.url);
        assert_eq!(loaded.session.display_mode, config.session.display_mode);
    }

    #[test]
    fn test_minimal_file() {
        let content = r#"
[server]
host = "127.0.0.1"
port = 8080

[page]
url = "https://www.netflix.com/watch/80100172"

[session]
display_mode = "transcript"
target_language = "es"

[vocab]
storage_dir = "/tmp/lexisub"
remote_url = "https://api.example.com"
"#;
        let config: ConfigFile = toml::from_str(content).unwrap();
        let server = config.into_server_config();

        assert_eq!(server.port, 8080);
        assert_eq!(server.session.display_mode, DisplayMode::Transcript);
        assert_eq!(server.session.native_language, "es");
        assert!(server.session.show_word_status);
        assert_eq!(server.engine.sync_interval_ms, 100);
        assert_eq!(server.page.video_duration_secs, 600.0);
        assert_eq!(server.vocab.remote_url.as_deref(), Some("https://api.example.com"));
        assert_eq!(server.log_format, "pretty");
        assert_eq!(server.feed_capacity, 16);
    }

    #[test]
    fn test_into_server_config() {
        let server_config = ConfigFile::default_config().into_server_config();

        assert_eq!(server_config.port, 3000);
        assert_eq!(server_config.engine.flush_interval_secs, 30);
        assert_eq!(server_config.max_payload_mb, 10);
    }

    #[test]
    fn test_generate_default_config() {
        let temp_file = NamedTempFile::new().unwrap();
        let path = temp_file.path().to_path_buf();

        generate_default_config(&path).unwrap();

        assert!(path.exists());
        let loaded = ConfigFile::from_file(&path).unwrap();
        assert_eq!(loaded.server.port, 3000);
    }
}
