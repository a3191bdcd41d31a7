//! Capture-and-transcribe client with a single-flight recording guard

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::audio::{AudioCapture, SAMPLE_RATE, samples_to_wav};
use crate::config::Config;
use crate::{Error, Result};

use super::api::{TranscriptApi, TranscriptStatus};

/// Capability interface for recording one fixed window of audio
#[async_trait]
pub trait Recorder: Send + Sync {
    /// Record for `window` and return WAV bytes
    ///
    /// # Errors
    ///
    /// Returns error if the device cannot be opened or nothing was captured
    async fn record(&self, window: Duration) -> Result<Vec<u8>>;
}

/// Microphone recorder backed by cpal
pub struct CpalRecorder;

#[async_trait]
impl Recorder for CpalRecorder {
    async fn record(&self, window: Duration) -> Result<Vec<u8>> {
        // cpal streams aren't Send; the whole session runs on a blocking thread
        tokio::task::spawn_blocking(move || {
            let mut capture = AudioCapture::new()?;
            capture.start()?;
            std::thread::sleep(window);
            capture.stop();

            let samples = capture.take_buffer();
            if samples.is_empty() {
                return Err(Error::Audio("no audio captured".to_string()));
            }

            samples_to_wav(&samples, SAMPLE_RATE)
        })
        .await
        .map_err(|e| Error::Audio(format!("capture task failed: {e}")))?
    }
}

/// Records a fixed window of microphone audio and transcribes it remotely
///
/// Every failure path collapses to `None` - callers treat missing text as
/// "no input" and stay alive.
pub struct TranscriptionClient {
    api: Arc<dyn TranscriptApi>,
    recorder: Arc<dyn Recorder>,
    /// Single-flight guard: at most one recording session process-wide
    busy: AtomicBool,
    record_window: Duration,
    poll_interval: Duration,
    language_code: String,
    max_polls: Option<u32>,
}

impl TranscriptionClient {
    /// Create a client with timings and language from config
    #[must_use]
    pub fn new(api: Arc<dyn TranscriptApi>, recorder: Arc<dyn Recorder>, config: &Config) -> Self {
        Self {
            api,
            recorder,
            busy: AtomicBool::new(false),
            record_window: config.record_window,
            poll_interval: config.poll_interval,
            language_code: config.language_code.clone(),
            max_polls: config.max_polls,
        }
    }

    /// Whether a recording session is in progress
    #[must_use]
    pub fn is_recording(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Record one fixed window and return its transcript
    ///
    /// Returns `None` when a recording is already in progress (the call is
    /// rejected, never queued), when capture fails, or when any step of the
    /// upload/submit/poll flow fails.
    pub async fn capture_and_transcribe(&self) -> Option<String> {
        if self.busy.swap(true, Ordering::SeqCst) {
            tracing::debug!("recording already in progress, rejecting capture");
            return None;
        }

        let recorded = self.recorder.record(self.record_window).await;

        // The microphone is free again; transcription can overlap the next
        // caller's capture without contention.
        self.busy.store(false, Ordering::SeqCst);

        let audio = match recorded {
            Ok(audio) => audio,
            Err(e) => {
                tracing::warn!(error = %e, "audio capture failed");
                return None;
            }
        };

        match self.transcribe(audio).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(error = %e, "transcription failed");
                None
            }
        }
    }

    /// Upload, submit, and poll until the job settles
    async fn transcribe(&self, audio: Vec<u8>) -> Result<Option<String>> {
        let audio_url = self.api.upload(audio).await?;
        let id = self.api.submit(&audio_url, &self.language_code).await?;

        tracing::debug!(job = %id, "transcript job submitted");

        let mut attempts = 0_u32;
        loop {
            let job = self.api.poll(&id).await?;

            match job.status {
                TranscriptStatus::Completed => {
                    tracing::debug!(job = %id, "transcript completed");
                    return Ok(job.text);
                }
                TranscriptStatus::Error => {
                    tracing::warn!(job = %id, error = ?job.error, "transcript job failed");
                    return Ok(None);
                }
                TranscriptStatus::Queued | TranscriptStatus::Processing => {}
            }

            attempts += 1;
            if let Some(max) = self.max_polls
                && attempts >= max
            {
                tracing::warn!(job = %id, attempts, "transcript poll limit reached");
                return Ok(None);
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicU32;

    use super::super::api::TranscriptJob;
    use super::*;

    struct FixedRecorder {
        delay: Duration,
    }

    #[async_trait]
    impl Recorder for FixedRecorder {
        async fn record(&self, _window: Duration) -> Result<Vec<u8>> {
            tokio::time::sleep(self.delay).await;
            Ok(vec![0_u8; 64])
        }
    }

    struct FailingRecorder;

    #[async_trait]
    impl Recorder for FailingRecorder {
        async fn record(&self, _window: Duration) -> Result<Vec<u8>> {
            Err(Error::Audio("no input device".to_string()))
        }
    }

    /// Completes after a fixed number of polls
    struct ScriptedApi {
        polls_until_done: u32,
        polls_seen: AtomicU32,
        final_status: TranscriptStatus,
    }

    #[async_trait]
    impl TranscriptApi for ScriptedApi {
        async fn upload(&self, _audio: Vec<u8>) -> Result<String> {
            Ok("https://host/audio/1".to_string())
        }

        async fn submit(&self, _audio_url: &str, _language_code: &str) -> Result<String> {
            Ok("job-1".to_string())
        }

        async fn poll(&self, id: &str) -> Result<TranscriptJob> {
            let seen = self.polls_seen.fetch_add(1, Ordering::SeqCst) + 1;
            let status = if seen >= self.polls_until_done {
                self.final_status
            } else {
                TranscriptStatus::Processing
            };

            Ok(TranscriptJob {
                id: id.to_string(),
                status,
                text: (status == TranscriptStatus::Completed)
                    .then(|| "start navigation".to_string()),
                error: (status == TranscriptStatus::Error)
                    .then(|| "bad audio".to_string()),
            })
        }
    }

    fn fast_config() -> Config {
        Config {
            record_window: Duration::from_millis(5),
            poll_interval: Duration::from_millis(2),
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn polls_until_completed() {
        let api = Arc::new(ScriptedApi {
            polls_until_done: 3,
            polls_seen: AtomicU32::new(0),
            final_status: TranscriptStatus::Completed,
        });
        let client = TranscriptionClient::new(
            Arc::clone(&api) as Arc<dyn TranscriptApi>,
            Arc::new(FixedRecorder {
                delay: Duration::from_millis(1),
            }),
            &fast_config(),
        );

        let text = client.capture_and_transcribe().await;
        assert_eq!(text.as_deref(), Some("start navigation"));
        assert_eq!(api.polls_seen.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn error_status_yields_none() {
        let api = Arc::new(ScriptedApi {
            polls_until_done: 2,
            polls_seen: AtomicU32::new(0),
            final_status: TranscriptStatus::Error,
        });
        let client = TranscriptionClient::new(
            api,
            Arc::new(FixedRecorder {
                delay: Duration::from_millis(1),
            }),
            &fast_config(),
        );

        assert!(client.capture_and_transcribe().await.is_none());
    }

    #[tokio::test]
    async fn capture_failure_yields_none() {
        let api = Arc::new(ScriptedApi {
            polls_until_done: 1,
            polls_seen: AtomicU32::new(0),
            final_status: TranscriptStatus::Completed,
        });
        let client =
            TranscriptionClient::new(api, Arc::new(FailingRecorder), &fast_config());

        assert!(client.capture_and_transcribe().await.is_none());
    }

    #[tokio::test]
    async fn concurrent_capture_is_rejected_not_queued() {
        let api = Arc::new(ScriptedApi {
            polls_until_done: 1,
            polls_seen: AtomicU32::new(0),
            final_status: TranscriptStatus::Completed,
        });
        let client = Arc::new(TranscriptionClient::new(
            api,
            Arc::new(FixedRecorder {
                delay: Duration::from_millis(50),
            }),
            &fast_config(),
        ));

        let first = {
            let client = Arc::clone(&client);
            tokio::spawn(async move { client.capture_and_transcribe().await })
        };

        // Let the first capture start, then collide with it
        tokio::time::sleep(Duration::from_millis(10)).await;
        let start = std::time::Instant::now();
        let second = client.capture_and_transcribe().await;

        assert!(second.is_none());
        // Rejection is immediate, not queued behind the first capture
        assert!(start.elapsed() < Duration::from_millis(40));
        assert_eq!(first.await.unwrap().as_deref(), Some("start navigation"));
    }

    #[tokio::test]
    async fn poll_limit_bounds_the_wait() {
        let api = Arc::new(ScriptedApi {
            polls_until_done: 100,
            polls_seen: AtomicU32::new(0),
            final_status: TranscriptStatus::Completed,
        });
        let config = Config {
            max_polls: Some(4),
            ..fast_config()
        };
        let client = TranscriptionClient::new(
            Arc::clone(&api) as Arc<dyn TranscriptApi>,
            Arc::new(FixedRecorder {
                delay: Duration::from_millis(1),
            }),
            &config,
        );

        assert!(client.capture_and_transcribe().await.is_none());
        assert_eq!(api.polls_seen.load(Ordering::SeqCst), 4);
    }
}
