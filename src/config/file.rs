//! TOML configuration file loading
//!
//! Supports `~/.config/eyeway/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::path::PathBuf;

use serde::Deserialize;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct EyewayConfigFile {
    /// Speech output (TTS) configuration
    #[serde(default)]
    pub speech: SpeechFileConfig,

    /// Listening (capture + transcription) configuration
    #[serde(default)]
    pub listen: ListenFileConfig,

    /// Voice control loop timing
    #[serde(default)]
    pub loops: LoopsFileConfig,

    /// API keys for external services
    #[serde(default)]
    pub api_keys: ApiKeysFileConfig,

    /// Backend endpoints
    #[serde(default)]
    pub endpoints: EndpointsFileConfig,

    /// Obstacle vision configuration
    #[serde(default)]
    pub vision: VisionFileConfig,

    /// Static location (used when no platform location service exists)
    #[serde(default)]
    pub location: LocationFileConfig,
}

/// Speech output configuration
#[derive(Debug, Default, Deserialize)]
pub struct SpeechFileConfig {
    /// Speech language (e.g. "en")
    pub language: Option<String>,

    /// Voice pitch multiplier
    pub pitch: Option<f32>,

    /// Speaking rate multiplier
    pub rate: Option<f32>,

    /// TTS model (e.g. "tts-1")
    pub tts_model: Option<String>,

    /// TTS voice identifier (e.g. "alloy")
    pub tts_voice: Option<String>,

    /// Pause between queued utterances, in milliseconds
    pub utterance_gap_ms: Option<u64>,
}

/// Listening configuration
#[derive(Debug, Default, Deserialize)]
pub struct ListenFileConfig {
    /// Fixed microphone capture window, in milliseconds
    pub record_window_ms: Option<u64>,

    /// Transcript job poll interval, in milliseconds
    pub poll_interval_ms: Option<u64>,

    /// Silence buffer between speech completion and listening, in milliseconds
    pub post_speech_buffer_ms: Option<u64>,

    /// Language code sent to the transcription service
    pub language_code: Option<String>,

    /// Optional ceiling on transcript poll attempts (unbounded when absent)
    pub max_polls: Option<u32>,
}

/// Voice control loop timing
#[derive(Debug, Default, Deserialize)]
pub struct LoopsFileConfig {
    /// Delay between idle home-loop cycles, in seconds
    pub idle_delay_secs: Option<u64>,

    /// Delay before retrying after a loop error, in seconds
    pub retry_delay_secs: Option<u64>,
}

/// API keys configuration
#[derive(Debug, Default, Deserialize)]
pub struct ApiKeysFileConfig {
    /// Transcription service bearer credential
    pub transcription: Option<String>,

    /// `OpenAI` API key (for TTS synthesis)
    pub openai: Option<String>,
}

/// Backend endpoints
#[derive(Debug, Default, Deserialize)]
pub struct EndpointsFileConfig {
    /// Transcription service base URL
    pub transcription_url: Option<String>,

    /// Navigation/vision backend base URL
    pub navigation_url: Option<String>,
}

/// Obstacle vision configuration
#[derive(Debug, Default, Deserialize)]
pub struct VisionFileConfig {
    /// Enable obstacle detection
    pub enabled: Option<bool>,

    /// Frame check interval, in milliseconds
    pub check_interval_ms: Option<u64>,

    /// Minimum confidence before an obstacle is announced
    pub confidence_threshold: Option<f32>,

    /// Cooldown before repeating the same announcement, in milliseconds
    pub cooldown_ms: Option<u64>,
}

/// Static location configuration
#[derive(Debug, Default, Deserialize)]
pub struct LocationFileConfig {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

/// Load the TOML config file from the standard path
///
/// Returns `EyewayConfigFile::default()` if the file doesn't exist or can't be parsed.
#[must_use]
pub fn load_config_file() -> EyewayConfigFile {
    let Some(path) = config_file_path() else {
        return EyewayConfigFile::default();
    };

    if !path.exists() {
        return EyewayConfigFile::default();
    }

    match std::fs::read_to_string(&path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                EyewayConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            EyewayConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/eyeway/config.toml`
#[must_use]
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("eyeway").join("config.toml"))
}
