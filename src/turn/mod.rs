//! Turn-based voice interaction: speak fully, then listen
//!
//! The strict speak-then-listen discipline exists so the microphone never
//! hears the device's own TTS output.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::speech::{SpeechChannel, SpeechOptions, SpeechOutcome};
use crate::transcribe::TranscriptionClient;

/// How often the listen path re-checks the speaking flag
const SPEAKING_POLL: Duration = Duration::from_millis(100);

/// Capability interface for one listening attempt
///
/// The duration hint is advisory; real implementations record a fixed
/// window regardless.
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    /// Listen once and return the recognized text, or `None` for no input
    async fn recognize(&self, duration_hint: Duration) -> Option<String>;
}

/// Recognizer backed by the remote transcription client
pub struct RemoteRecognizer {
    client: Arc<TranscriptionClient>,
}

impl RemoteRecognizer {
    #[must_use]
    pub const fn new(client: Arc<TranscriptionClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SpeechRecognizer for RemoteRecognizer {
    async fn recognize(&self, _duration_hint: Duration) -> Option<String> {
        self.client.capture_and_transcribe().await
    }
}

/// Coordinates speech output and listening into non-overlapping turns
#[derive(Clone)]
pub struct TurnManager {
    speech: SpeechChannel,
    recognizer: Arc<dyn SpeechRecognizer>,
    options: SpeechOptions,
    /// Silence between the last utterance ending and the microphone opening
    listen_buffer: Duration,
}

impl TurnManager {
    #[must_use]
    pub fn new(
        speech: SpeechChannel,
        recognizer: Arc<dyn SpeechRecognizer>,
        options: SpeechOptions,
        listen_buffer: Duration,
    ) -> Self {
        Self {
            speech,
            recognizer,
            options,
            listen_buffer,
        }
    }

    /// Speak with the manager's default options, waiting for completion
    pub async fn speak(&self, text: &str) -> SpeechOutcome {
        self.speech.enqueue_speak(text, &self.options).await
    }

    /// Speak with explicit options, waiting for completion
    pub async fn speak_with(&self, text: &str, options: &SpeechOptions) -> SpeechOutcome {
        self.speech.enqueue_speak(text, options).await
    }

    /// Listen once, deferring until all speech output has finished
    ///
    /// Waits while the channel is speaking, then waits the post-speech
    /// buffer so the TTS tail drains out of the speakers, then records.
    pub async fn listen(&self, duration_hint: Duration) -> Option<String> {
        while self.speech.is_speaking() {
            tokio::time::sleep(SPEAKING_POLL).await;
        }

        tokio::time::sleep(self.listen_buffer).await;

        self.recognizer.recognize(duration_hint).await
    }

    /// Speak a prompt to completion, then listen
    pub async fn speak_then_listen(
        &self,
        prompt: &str,
        duration_hint: Duration,
    ) -> Option<String> {
        self.speak(prompt).await;
        self.listen(duration_hint).await
    }

    /// Whether speech output is currently active
    #[must_use]
    pub fn is_speaking(&self) -> bool {
        self.speech.is_speaking()
    }

    /// Stop all pending speech output
    pub fn stop_speaking(&self) {
        self.speech.stop();
    }
}
