//! Speech engine interface and HTTP TTS implementation

use async_trait::async_trait;

use crate::speech::playback::AudioPlayback;
use crate::{Error, Result};

/// Per-utterance speech options
#[derive(Debug, Clone)]
pub struct SpeechOptions {
    /// Speech language (e.g. "en")
    pub language: String,

    /// Voice pitch multiplier
    pub pitch: f32,

    /// Speaking rate multiplier
    pub rate: f32,
}

impl Default for SpeechOptions {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            pitch: 1.0,
            rate: 0.9,
        }
    }
}

/// How an utterance finished
///
/// All three variants complete the utterance from the caller's point of
/// view. An engine failure is announced to nobody and never propagates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechOutcome {
    /// Playback ran to the end
    Done,
    /// Playback was interrupted by a stop request
    Stopped,
    /// Synthesis or playback failed
    Error,
}

/// Capability interface for synthesizing and playing one utterance
#[async_trait]
pub trait SpeechEngine: Send + Sync {
    /// Speak `text` to completion and report how it ended
    ///
    /// Must not return until audio has finished (or failed). Never panics
    /// and never returns a `Result` - failure is a `SpeechOutcome`.
    async fn speak(&self, text: &str, options: &SpeechOptions) -> SpeechOutcome;
}

/// `OpenAI`-style TTS over HTTP with local cpal playback
pub struct HttpTtsEngine {
    client: reqwest::Client,
    api_key: String,
    voice: String,
    model: String,
    base_url: String,
}

impl HttpTtsEngine {
    /// Create a new HTTP TTS engine
    ///
    /// # Errors
    ///
    /// Returns error if the API key is empty
    pub fn new(api_key: String, voice: String, model: String) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config("OpenAI API key required for TTS".to_string()));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            voice,
            model,
            base_url: "https://api.openai.com".to_string(),
        })
    }

    /// Override the API base URL (used for self-hosted gateways)
    #[must_use]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    /// Synthesize text to MP3 bytes
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the API rejects it
    pub async fn synthesize(&self, text: &str, speed: f32) -> Result<Vec<u8>> {
        #[derive(serde::Serialize)]
        struct TtsRequest<'a> {
            model: &'a str,
            input: &'a str,
            voice: &'a str,
            speed: f32,
        }

        let request = TtsRequest {
            model: &self.model,
            input: text,
            voice: &self.voice,
            speed,
        };

        let response = self
            .client
            .post(format!("{}/v1/audio/speech", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Tts(format!("TTS error {status}: {body}")));
        }

        let audio = response.bytes().await?;
        Ok(audio.to_vec())
    }
}

#[async_trait]
impl SpeechEngine for HttpTtsEngine {
    async fn speak(&self, text: &str, options: &SpeechOptions) -> SpeechOutcome {
        let audio = match self.synthesize(text, options.rate).await {
            Ok(audio) => audio,
            Err(e) => {
                tracing::warn!(error = %e, "TTS synthesis failed");
                return SpeechOutcome::Error;
            }
        };

        // cpal streams aren't Send, so playback stays on a blocking thread
        let result = tokio::task::spawn_blocking(move || {
            let playback = AudioPlayback::new()?;
            playback.play_mp3(&audio)
        })
        .await;

        match result {
            Ok(Ok(())) => SpeechOutcome::Done,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "audio playback failed");
                SpeechOutcome::Error
            }
            Err(e) => {
                tracing::warn!(error = %e, "playback task panicked");
                SpeechOutcome::Error
            }
        }
    }
}
