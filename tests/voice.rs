//! Voice pipeline integration tests
//!
//! Exercises the speech queue, turn discipline, and capture guard with
//! scripted components - no audio hardware or network.

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use async_trait::async_trait;

use eyeway::speech::{SpeechChannel, SpeechEngine, SpeechOptions, SpeechOutcome};
use eyeway::transcribe::{Recorder, TranscriptApi, TranscriptJob, TranscriptStatus,
    TranscriptionClient};
use eyeway::turn::SpeechRecognizer;
use eyeway::{Config, Result};

mod common;

use common::{MockSpeechEngine, ScriptedRecognizer, fast_turns};

#[tokio::test]
async fn queued_utterances_never_overlap_and_keep_order() {
    let engine = MockSpeechEngine::new(Duration::from_millis(15));
    let channel = SpeechChannel::new(
        Arc::clone(&engine) as Arc<dyn SpeechEngine>,
        Duration::from_millis(2),
    );
    let options = SpeechOptions::default();

    // Enqueue from several clones, the way loops and the obstacle
    // announcer share one channel
    let mut handles = Vec::new();
    for text in ["alpha", "bravo", "charlie", "delta"] {
        let channel = channel.clone();
        let options = options.clone();
        handles.push(tokio::spawn(async move {
            channel.enqueue_speak(text, &options).await
        }));
        tokio::time::sleep(Duration::from_millis(3)).await;
    }

    for handle in handles {
        assert_eq!(handle.await.unwrap(), SpeechOutcome::Done);
    }

    assert_eq!(
        engine.spoken_texts(),
        vec!["alpha", "bravo", "charlie", "delta"]
    );
    assert!(!engine.overlapped.load(Ordering::SeqCst));
}

#[tokio::test]
async fn stop_silences_the_queue_but_completes_waiters() {
    let engine = MockSpeechEngine::new(Duration::from_millis(50));
    let channel = SpeechChannel::new(
        Arc::clone(&engine) as Arc<dyn SpeechEngine>,
        Duration::from_millis(1),
    );
    let options = SpeechOptions::default();

    let playing = {
        let channel = channel.clone();
        let options = options.clone();
        tokio::spawn(async move { channel.enqueue_speak("playing", &options).await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;

    let queued = {
        let channel = channel.clone();
        let options = options.clone();
        tokio::spawn(async move { channel.enqueue_speak("queued", &options).await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;

    channel.stop();

    assert_eq!(playing.await.unwrap(), SpeechOutcome::Done);
    assert_eq!(queued.await.unwrap(), SpeechOutcome::Stopped);
    assert_eq!(engine.spoken_texts(), vec!["playing"]);
}

#[tokio::test]
async fn listening_waits_for_all_speech_to_finish() {
    let engine = MockSpeechEngine::new(Duration::from_millis(30));
    let channel = SpeechChannel::new(
        Arc::clone(&engine) as Arc<dyn SpeechEngine>,
        Duration::from_millis(1),
    );
    let recognizer =
        ScriptedRecognizer::with_probe(vec![Some("start navigation")], channel.clone());

    let turns = eyeway::turn::TurnManager::new(
        channel,
        Arc::clone(&recognizer) as Arc<dyn SpeechRecognizer>,
        SpeechOptions::default(),
        Duration::from_millis(5),
    );

    let heard = turns
        .speak_then_listen("Say a command.", Duration::from_secs(4))
        .await;

    assert_eq!(heard.as_deref(), Some("start navigation"));
    assert!(!recognizer.heard_while_speaking.load(Ordering::SeqCst));
    assert_eq!(engine.spoken_texts(), vec!["Say a command."]);
}

#[tokio::test]
async fn listen_returns_none_when_nothing_recognized() {
    let engine = MockSpeechEngine::new(Duration::from_millis(2));
    let recognizer = ScriptedRecognizer::new(vec![None]);
    let turns = fast_turns(engine, recognizer);

    let heard = turns
        .speak_then_listen("Anything?", Duration::from_secs(4))
        .await;
    assert!(heard.is_none());
}

// --- capture single-flight against scripted transcription ---

struct SlowRecorder {
    window: Duration,
}

#[async_trait]
impl Recorder for SlowRecorder {
    async fn record(&self, _window: Duration) -> Result<Vec<u8>> {
        tokio::time::sleep(self.window).await;
        Ok(vec![0_u8; 32])
    }
}

struct InstantApi;

#[async_trait]
impl TranscriptApi for InstantApi {
    async fn upload(&self, _audio: Vec<u8>) -> Result<String> {
        Ok("https://host/audio/0".to_string())
    }

    async fn submit(&self, _audio_url: &str, _language_code: &str) -> Result<String> {
        Ok("job-0".to_string())
    }

    async fn poll(&self, id: &str) -> Result<TranscriptJob> {
        Ok(TranscriptJob {
            id: id.to_string(),
            status: TranscriptStatus::Completed,
            text: Some("saved routes".to_string()),
            error: None,
        })
    }
}

#[tokio::test]
async fn only_one_recording_session_at_a_time() {
    let config = Config {
        record_window: Duration::from_millis(40),
        poll_interval: Duration::from_millis(2),
        ..Config::default()
    };
    let client = Arc::new(TranscriptionClient::new(
        Arc::new(InstantApi),
        Arc::new(SlowRecorder {
            window: Duration::from_millis(40),
        }),
        &config,
    ));

    let first = {
        let client = Arc::clone(&client);
        tokio::spawn(async move { client.capture_and_transcribe().await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;

    // Collides with the in-flight capture: rejected, not queued
    assert!(client.is_recording());
    assert!(client.capture_and_transcribe().await.is_none());

    assert_eq!(first.await.unwrap().as_deref(), Some("saved routes"));

    // Guard released; the next capture succeeds
    assert!(!client.is_recording());
    assert_eq!(
        client.capture_and_transcribe().await.as_deref(),
        Some("saved routes")
    );
}
