//! Daemon orchestration: wires the voice pipeline and runs the screen flow

use std::sync::Arc;

use crate::config::Config;
use crate::control::{CancelToken, DestinationLoop, HomeControlLoop};
use crate::nav::{LocationProvider, NavigationClient, RoutePlanner, StaticLocation};
use crate::router::{Navigator, ScreenStack};
use crate::speech::{HttpTtsEngine, SpeechChannel, SpeechEngine};
use crate::transcribe::{CpalRecorder, HttpTranscriptApi, TranscriptApi, TranscriptionClient};
use crate::turn::{RemoteRecognizer, SpeechRecognizer, TurnManager};
use crate::vision::{FrameSource, ObstacleAnnouncer, VisionClient};
use crate::{Result, VoiceAction};

/// The Eyeway voice daemon
pub struct Daemon {
    config: Config,
    speech: SpeechChannel,
    turns: TurnManager,
    navigator: Arc<ScreenStack>,
    nav: Arc<NavigationClient>,
    location: Arc<dyn LocationProvider>,
    frames: Option<Arc<dyn FrameSource>>,
}

impl Daemon {
    /// Build the daemon from config, using real audio and HTTP backends
    ///
    /// # Errors
    ///
    /// Returns error if required API keys are missing
    pub fn new(config: Config) -> Result<Self> {
        let openai_key = config.require_openai_key()?.to_string();
        let transcription_key = config.require_transcription_key()?.to_string();

        let engine: Arc<dyn SpeechEngine> = Arc::new(HttpTtsEngine::new(
            openai_key,
            config.tts_voice.clone(),
            config.tts_model.clone(),
        )?);

        let api: Arc<dyn TranscriptApi> = Arc::new(HttpTranscriptApi::new(
            config.transcription_url.clone(),
            transcription_key,
        )?);

        let transcription = Arc::new(TranscriptionClient::new(
            api,
            Arc::new(CpalRecorder),
            &config,
        ));
        let recognizer: Arc<dyn SpeechRecognizer> = Arc::new(RemoteRecognizer::new(transcription));

        let speech = SpeechChannel::new(engine, config.utterance_gap);
        let turns = TurnManager::new(
            speech.clone(),
            recognizer,
            config.speech_options.clone(),
            config.post_speech_buffer,
        );

        let nav = Arc::new(NavigationClient::new(config.navigation_url.clone()));
        let location: Arc<dyn LocationProvider> = Arc::new(StaticLocation::new(config.location));

        Ok(Self {
            config,
            speech,
            turns,
            navigator: Arc::new(ScreenStack::new()),
            nav,
            location,
            frames: None,
        })
    }

    /// Attach a camera frame source for obstacle detection
    #[must_use]
    pub fn with_frame_source(mut self, frames: Arc<dyn FrameSource>) -> Self {
        self.frames = Some(frames);
        self
    }

    /// Run the daemon until Ctrl-C
    ///
    /// # Errors
    ///
    /// Returns error if the shutdown signal handler cannot be installed
    pub async fn run(&self) -> Result<()> {
        tracing::info!(
            transcription = %self.config.transcription_url,
            navigation = %self.config.navigation_url,
            "eyeway daemon starting"
        );

        let cancel = CancelToken::new();

        let vision_task = self.spawn_vision(&cancel);

        tokio::select! {
            () = self.run_screens(&cancel) => {
                tracing::info!("voice loop finished");
            }
            result = tokio::signal::ctrl_c() => {
                result?;
                tracing::info!("shutdown requested");
            }
        }

        cancel.cancel();
        self.speech.stop();

        if let Some(task) = vision_task {
            let _ = task.await;
        }

        tracing::info!("eyeway daemon stopped");
        Ok(())
    }

    /// Start obstacle detection if enabled and a camera is attached
    fn spawn_vision(&self, cancel: &CancelToken) -> Option<tokio::task::JoinHandle<()>> {
        if !self.config.vision_enabled {
            return None;
        }

        let Some(frames) = self.frames.clone() else {
            tracing::warn!("vision enabled but no frame source attached");
            return None;
        };

        let announcer = ObstacleAnnouncer::new(
            Arc::new(VisionClient::new(self.config.navigation_url.clone())),
            frames,
            self.speech.clone(),
            self.config.speech_options.clone(),
            self.config.vision_interval,
            self.config.vision_confidence,
            self.config.vision_cooldown,
        );

        let cancel = cancel.clone();
        Some(tokio::spawn(async move {
            announcer.run(&cancel).await;
        }))
    }

    /// Home loop plus per-screen flows, until cancellation
    async fn run_screens(&self, cancel: &CancelToken) {
        let mut first_visit = true;

        loop {
            let mut home = HomeControlLoop::new(
                self.turns.clone(),
                Arc::clone(&self.navigator) as Arc<dyn Navigator>,
                self.config.idle_delay,
                self.config.record_window,
            );
            if !first_visit {
                home = home.without_greeting();
            }
            first_visit = false;

            let Some(action) = home.run(cancel).await else {
                return;
            };

            self.run_screen(action, cancel).await;

            // Every screen flow ends back at home
            self.navigator.back();
        }
    }

    /// Run the voice flow for one dispatched screen
    async fn run_screen(&self, action: VoiceAction, cancel: &CancelToken) {
        match action {
            VoiceAction::StartNavigation => {
                let destination = DestinationLoop::new(
                    self.turns.clone(),
                    Arc::clone(&self.nav) as Arc<dyn RoutePlanner>,
                    Arc::clone(&self.location),
                    self.config.retry_delay,
                    self.config.record_window,
                );

                if let Some(route) = destination.run(cancel).await {
                    tracing::info!(
                        mode = %route.route_mode,
                        distance_m = route.total_distance_meters,
                        "route ready"
                    );
                }
            }
            VoiceAction::WhereAmI => {
                match self.location.current_location().await {
                    Ok(coords) => {
                        self.turns
                            .speak(&format!("You are at {}.", coords.spoken()))
                            .await;
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "location lookup failed");
                        self.turns
                            .speak("Could not determine your location.")
                            .await;
                    }
                }
            }
            VoiceAction::SavedRoutes => {
                self.turns
                    .speak("You have no saved routes yet. Returning home.")
                    .await;
            }
            VoiceAction::Settings => {
                self.turns
                    .speak("Settings are not available by voice yet. Returning home.")
                    .await;
            }
            VoiceAction::GoBack => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction_requires_api_keys() {
        let config = Config {
            openai_key: None,
            transcription_key: None,
            ..Config::default()
        };

        let result = Daemon::new(config);
        assert!(matches!(result, Err(crate::Error::Config(_))));
    }

    #[test]
    fn construction_requires_transcription_key() {
        let config = Config {
            openai_key: Some("sk-test".to_string()),
            transcription_key: None,
            ..Config::default()
        };

        let result = Daemon::new(config);
        assert!(matches!(result, Err(crate::Error::Config(_))));
    }
}
