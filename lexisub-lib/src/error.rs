use thiserror::Error;

/// Main error type for the subtitle and vocabulary engine
#[derive(Error, Debug)]
pub enum LexisubError {
    /// A standard I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serializing or deserializing persisted state failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The local vocabulary store could not be read or written
    #[error("Storage error: {0}")]
    Storage(String),

    /// The remote vocabulary store rejected or failed a request
    #[error("Remote error: {0}")]
    Remote(String),

    /// No video element could be located before the discovery window closed
    #[error("No video element found within {0}ms")]
    VideoNotFound(u64),

    /// The requested subtitle format name is not recognised
    #[error("Unknown subtitle format: {0}")]
    UnknownFormat(String),

    /// A word normalized to nothing (punctuation or whitespace only)
    #[error("Not a word: {0:?}")]
    InvalidWord(String),

    /// The requested vocabulary status name is not recognised
    #[error("Unknown vocabulary status: {0}")]
    UnknownStatus(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for LexisubError {
    fn from(err: reqwest::Error) -> Self {
        LexisubError::Remote(err.to_string())
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, LexisubError>;
