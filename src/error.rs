//! Error types for the Eyeway client

use thiserror::Error;

/// Result type alias for Eyeway operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the Eyeway client
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Audio capture/playback error
    #[error("audio error: {0}")]
    Audio(String),

    /// Speech-to-text error
    #[error("STT error: {0}")]
    Stt(String),

    /// Text-to-speech error
    #[error("TTS error: {0}")]
    Tts(String),

    /// Navigation backend error
    #[error("navigation error: {0}")]
    Navigation(String),

    /// Obstacle vision backend error
    #[error("vision error: {0}")]
    Vision(String),

    /// Location provider error
    #[error("location error: {0}")]
    Location(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}
