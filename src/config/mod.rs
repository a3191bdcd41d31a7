//! Configuration for the Eyeway client
//!
//! Sources are merged with env > config file > defaults.

mod file;

use std::time::Duration;

pub use file::{EyewayConfigFile, config_file_path, load_config_file};

use crate::nav::Coordinates;
use crate::speech::SpeechOptions;
use crate::{Error, Result};

/// Default pause between queued utterances
const DEFAULT_UTTERANCE_GAP_MS: u64 = 200;

/// Default fixed microphone capture window
const DEFAULT_RECORD_WINDOW_MS: u64 = 4000;

/// Default transcript job poll interval
const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

/// Default silence buffer between speech completion and listening
const DEFAULT_POST_SPEECH_BUFFER_MS: u64 = 1000;

/// Default delay between idle home-loop cycles
const DEFAULT_IDLE_DELAY_SECS: u64 = 20;

/// Default delay before retrying after a loop error
const DEFAULT_RETRY_DELAY_SECS: u64 = 5;

/// Default obstacle frame check interval
const DEFAULT_VISION_INTERVAL_MS: u64 = 1000;

/// Default obstacle confidence threshold
const DEFAULT_VISION_CONFIDENCE: f32 = 0.7;

/// Default cooldown before repeating an obstacle announcement
const DEFAULT_VISION_COOLDOWN_MS: u64 = 5000;

/// Runtime configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Speech output options (language, pitch, rate)
    pub speech_options: SpeechOptions,

    /// TTS model (e.g. "tts-1")
    pub tts_model: String,

    /// TTS voice identifier (e.g. "alloy")
    pub tts_voice: String,

    /// Pause between queued utterances
    pub utterance_gap: Duration,

    /// Fixed microphone capture window
    pub record_window: Duration,

    /// Transcript job poll interval
    pub poll_interval: Duration,

    /// Silence buffer between speech completion and listening
    pub post_speech_buffer: Duration,

    /// Language code sent to the transcription service
    pub language_code: String,

    /// Optional ceiling on transcript poll attempts (unbounded when `None`)
    pub max_polls: Option<u32>,

    /// Delay between idle home-loop cycles
    pub idle_delay: Duration,

    /// Delay before retrying after a loop error
    pub retry_delay: Duration,

    /// Transcription service bearer credential
    pub transcription_key: Option<String>,

    /// `OpenAI` API key for TTS synthesis
    pub openai_key: Option<String>,

    /// Transcription service base URL
    pub transcription_url: String,

    /// Navigation/vision backend base URL
    pub navigation_url: String,

    /// Enable obstacle detection
    pub vision_enabled: bool,

    /// Obstacle frame check interval
    pub vision_interval: Duration,

    /// Minimum confidence before an obstacle is announced
    pub vision_confidence: f32,

    /// Cooldown before repeating the same obstacle announcement
    pub vision_cooldown: Duration,

    /// Static current location used for navigation requests
    pub location: Coordinates,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            speech_options: SpeechOptions::default(),
            tts_model: "tts-1".to_string(),
            tts_voice: "alloy".to_string(),
            utterance_gap: Duration::from_millis(DEFAULT_UTTERANCE_GAP_MS),
            record_window: Duration::from_millis(DEFAULT_RECORD_WINDOW_MS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            post_speech_buffer: Duration::from_millis(DEFAULT_POST_SPEECH_BUFFER_MS),
            language_code: "en".to_string(),
            max_polls: None,
            idle_delay: Duration::from_secs(DEFAULT_IDLE_DELAY_SECS),
            retry_delay: Duration::from_secs(DEFAULT_RETRY_DELAY_SECS),
            transcription_key: None,
            openai_key: None,
            transcription_url: "https://api.assemblyai.com/v2".to_string(),
            navigation_url: "http://localhost:8001".to_string(),
            vision_enabled: false,
            vision_interval: Duration::from_millis(DEFAULT_VISION_INTERVAL_MS),
            vision_confidence: DEFAULT_VISION_CONFIDENCE,
            vision_cooldown: Duration::from_millis(DEFAULT_VISION_COOLDOWN_MS),
            location: Coordinates::default(),
        }
    }
}

impl Config {
    /// Load configuration from the config file and environment
    ///
    /// Environment variables override file values, which override defaults.
    #[must_use]
    pub fn load() -> Self {
        let file = load_config_file();
        Self::from_sources(&file)
    }

    /// Build a config from a parsed file overlay plus the environment
    #[must_use]
    pub fn from_sources(file: &EyewayConfigFile) -> Self {
        let defaults = Self::default();

        let mut speech_options = defaults.speech_options;
        if let Some(language) = &file.speech.language {
            speech_options.language.clone_from(language);
        }
        if let Some(pitch) = file.speech.pitch {
            speech_options.pitch = pitch;
        }
        if let Some(rate) = file.speech.rate {
            speech_options.rate = rate;
        }

        Self {
            speech_options,
            tts_model: file
                .speech
                .tts_model
                .clone()
                .unwrap_or(defaults.tts_model),
            tts_voice: file
                .speech
                .tts_voice
                .clone()
                .unwrap_or(defaults.tts_voice),
            utterance_gap: millis_or(file.speech.utterance_gap_ms, defaults.utterance_gap),
            record_window: millis_or(
                env_u64("EYEWAY_RECORD_WINDOW_MS").or(file.listen.record_window_ms),
                defaults.record_window,
            ),
            poll_interval: millis_or(file.listen.poll_interval_ms, defaults.poll_interval),
            post_speech_buffer: millis_or(
                file.listen.post_speech_buffer_ms,
                defaults.post_speech_buffer,
            ),
            language_code: file
                .listen
                .language_code
                .clone()
                .unwrap_or(defaults.language_code),
            max_polls: file.listen.max_polls,
            idle_delay: secs_or(
                env_u64("EYEWAY_IDLE_DELAY_SECS").or(file.loops.idle_delay_secs),
                defaults.idle_delay,
            ),
            retry_delay: secs_or(file.loops.retry_delay_secs, defaults.retry_delay),
            transcription_key: std::env::var("EYEWAY_TRANSCRIPTION_KEY")
                .or_else(|_| std::env::var("ASSEMBLYAI_API_KEY"))
                .ok()
                .or_else(|| file.api_keys.transcription.clone()),
            openai_key: std::env::var("OPENAI_API_KEY")
                .ok()
                .or_else(|| file.api_keys.openai.clone()),
            transcription_url: std::env::var("EYEWAY_TRANSCRIPTION_URL")
                .ok()
                .or_else(|| file.endpoints.transcription_url.clone())
                .unwrap_or(defaults.transcription_url),
            navigation_url: std::env::var("EYEWAY_NAVIGATION_URL")
                .ok()
                .or_else(|| file.endpoints.navigation_url.clone())
                .unwrap_or(defaults.navigation_url),
            vision_enabled: file.vision.enabled.unwrap_or(defaults.vision_enabled),
            vision_interval: millis_or(file.vision.check_interval_ms, defaults.vision_interval),
            vision_confidence: file
                .vision
                .confidence_threshold
                .unwrap_or(defaults.vision_confidence),
            vision_cooldown: millis_or(file.vision.cooldown_ms, defaults.vision_cooldown),
            location: match (file.location.lat, file.location.lng) {
                (Some(lat), Some(lng)) => Coordinates { lat, lng },
                _ => defaults.location,
            },
        }
    }

    /// Return the transcription credential, or an error if unset
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if no transcription key is configured
    pub fn require_transcription_key(&self) -> Result<&str> {
        self.transcription_key.as_deref().ok_or_else(|| {
            Error::Config(
                "no transcription key set (EYEWAY_TRANSCRIPTION_KEY or config file)".to_string(),
            )
        })
    }

    /// Return the `OpenAI` key, or an error if unset
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if no `OpenAI` key is configured
    pub fn require_openai_key(&self) -> Result<&str> {
        self.openai_key.as_deref().ok_or_else(|| {
            Error::Config("no OpenAI key set (OPENAI_API_KEY or config file)".to_string())
        })
    }
}

fn env_u64(name: &str) -> Option<u64> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

fn millis_or(value: Option<u64>, default: Duration) -> Duration {
    value.map_or(default, Duration::from_millis)
}

fn secs_or(value: Option<u64>, default: Duration) -> Duration {
    value.map_or(default, Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_timings() {
        let config = Config::default();
        assert_eq!(config.utterance_gap, Duration::from_millis(200));
        assert_eq!(config.record_window, Duration::from_millis(4000));
        assert_eq!(config.poll_interval, Duration::from_millis(1000));
        assert_eq!(config.post_speech_buffer, Duration::from_millis(1000));
        assert_eq!(config.idle_delay, Duration::from_secs(20));
        assert!(config.max_polls.is_none());
    }

    #[test]
    fn file_overlay_overrides_defaults() {
        let file: EyewayConfigFile = toml::from_str(
            r#"
            [listen]
            record_window_ms = 2500
            max_polls = 30

            [speech]
            rate = 1.2

            [location]
            lat = 12.9716
            lng = 77.5946
            "#,
        )
        .unwrap();

        let config = Config::from_sources(&file);
        assert_eq!(config.record_window, Duration::from_millis(2500));
        assert_eq!(config.max_polls, Some(30));
        assert!((config.speech_options.rate - 1.2).abs() < f32::EPSILON);
        assert!((config.location.lat - 12.9716).abs() < f64::EPSILON);
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let file: EyewayConfigFile = toml::from_str("[vision]\nenabled = true\n").unwrap();
        let config = Config::from_sources(&file);
        assert!(config.vision_enabled);
        assert_eq!(config.vision_cooldown, Duration::from_millis(5000));
        assert_eq!(config.tts_voice, "alloy");
    }
}
