//! Daemon configuration

use lexisub_lib::{EngineConfig, SessionConfig, VocabConfig};
use serde::{Deserialize, Serialize};

/// Headless page the session runs against
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageConfig {
    /// Page URL; selects the platform adapter
    pub url: String,

    /// Duration of the simulated video in seconds
    pub video_duration_secs: f64,

    /// Attach a native caption layer for the adapter to hide
    pub native_captions: bool,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            url: "https://www.youtube.com/watch?v=lexisub".to_string(),
            video_duration_secs: 600.0,
            native_captions: true,
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Enable CORS
    pub cors_enabled: bool,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Log output format (pretty, json)
    pub log_format: String,

    /// Captured payloads buffered ahead of the adapter
    pub feed_capacity: usize,

    /// Largest accepted subtitle payload in megabytes
    pub max_payload_mb: usize,

    pub page: PageConfig,

    pub session: SessionConfig,

    pub engine: EngineConfig,

    pub vocab: VocabConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            cors_enabled: true,
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            feed_capacity: 16,
            max_payload_mb: 10,
            page: PageConfig::default(),
            session: SessionConfig::default(),
            engine: EngineConfig::default(),
            vocab: VocabConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Get the socket address string
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the payload limit in bytes
    pub fn max_payload_bytes(&self) -> usize {
        self.max_payload_mb * 1024 * 1024
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: ServerConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file(&self, path: &str) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
