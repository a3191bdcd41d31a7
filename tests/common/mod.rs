//! Shared test doubles for the voice pipeline
//!
//! No audio hardware or network; everything is driven by scripted
//! capability implementations.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use eyeway::nav::{Coordinates, RoutePlanner};
use eyeway::router::{Navigator, Route};
use eyeway::speech::{SpeechChannel, SpeechEngine, SpeechOptions, SpeechOutcome};
use eyeway::turn::{SpeechRecognizer, TurnManager};
use eyeway::{Error, Result, RouteSummary};

/// Engine that records what was spoken and flags overlapping playback
pub struct MockSpeechEngine {
    pub spoken: Mutex<Vec<String>>,
    pub active: AtomicU32,
    pub overlapped: AtomicBool,
    pub per_utterance: Duration,
}

impl MockSpeechEngine {
    pub fn new(per_utterance: Duration) -> Arc<Self> {
        Arc::new(Self {
            spoken: Mutex::new(Vec::new()),
            active: AtomicU32::new(0),
            overlapped: AtomicBool::new(false),
            per_utterance,
        })
    }

    pub fn spoken_texts(&self) -> Vec<String> {
        self.spoken.lock().unwrap().clone()
    }
}

#[async_trait]
impl SpeechEngine for MockSpeechEngine {
    async fn speak(&self, text: &str, _options: &SpeechOptions) -> SpeechOutcome {
        if self.active.fetch_add(1, Ordering::SeqCst) > 0 {
            self.overlapped.store(true, Ordering::SeqCst);
        }
        tokio::time::sleep(self.per_utterance).await;
        self.spoken.lock().unwrap().push(text.to_string());
        self.active.fetch_sub(1, Ordering::SeqCst);
        SpeechOutcome::Done
    }
}

/// Recognizer that replays a scripted sequence of transcripts
///
/// When a speaking probe is attached, it flags any invocation that
/// happens while speech output is still active.
pub struct ScriptedRecognizer {
    replies: Mutex<VecDeque<Option<String>>>,
    pub calls: AtomicU32,
    speaking_probe: Option<SpeechChannel>,
    pub heard_while_speaking: AtomicBool,
}

impl ScriptedRecognizer {
    pub fn new(replies: Vec<Option<&str>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(
                replies
                    .into_iter()
                    .map(|r| r.map(str::to_string))
                    .collect(),
            ),
            calls: AtomicU32::new(0),
            speaking_probe: None,
            heard_while_speaking: AtomicBool::new(false),
        })
    }

    pub fn with_probe(replies: Vec<Option<&str>>, channel: SpeechChannel) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(
                replies
                    .into_iter()
                    .map(|r| r.map(str::to_string))
                    .collect(),
            ),
            calls: AtomicU32::new(0),
            speaking_probe: Some(channel),
            heard_while_speaking: AtomicBool::new(false),
        })
    }
}

#[async_trait]
impl SpeechRecognizer for ScriptedRecognizer {
    async fn recognize(&self, _duration_hint: Duration) -> Option<String> {
        if let Some(channel) = &self.speaking_probe
            && channel.is_speaking()
        {
            self.heard_while_speaking.store(true, Ordering::SeqCst);
        }
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.replies.lock().unwrap().pop_front().flatten()
    }
}

/// Navigator that records dispatches
#[derive(Default)]
pub struct RecordingNavigator {
    pub pushes: Mutex<Vec<Route>>,
    pub backs: AtomicU32,
}

impl Navigator for RecordingNavigator {
    fn push(&self, route: Route) {
        self.pushes.lock().unwrap().push(route);
    }

    fn back(&self) {
        self.backs.fetch_add(1, Ordering::SeqCst);
    }

    fn current(&self) -> Route {
        self.pushes
            .lock()
            .unwrap()
            .last()
            .copied()
            .unwrap_or(Route::Home)
    }
}

/// Route planner that replays scripted outcomes
///
/// `Err(detail)` entries become backend navigation errors.
pub struct ScriptedPlanner {
    script: Mutex<VecDeque<std::result::Result<RouteSummary, String>>>,
    pub calls: AtomicU32,
}

impl ScriptedPlanner {
    pub fn new(script: Vec<std::result::Result<RouteSummary, String>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into_iter().collect()),
            calls: AtomicU32::new(0),
        })
    }
}

#[async_trait]
impl RoutePlanner for ScriptedPlanner {
    async fn plan(&self, _current: Coordinates, _destination: &str) -> Result<RouteSummary> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.script.lock().unwrap().pop_front() {
            Some(Ok(route)) => Ok(route),
            Some(Err(detail)) => Err(Error::Navigation(detail)),
            None => Err(Error::Navigation("no scripted route".to_string())),
        }
    }
}

/// A plausible walking route for assertions
pub fn sample_route(distance_meters: f64, minutes: f64) -> RouteSummary {
    RouteSummary {
        route_mode: "walking".to_string(),
        total_distance_meters: distance_meters,
        estimated_time_minutes: minutes,
        steps: Vec::new(),
        polyline: None,
    }
}

/// Build a turn manager on fast mock timings
pub fn fast_turns(
    engine: Arc<MockSpeechEngine>,
    recognizer: Arc<dyn SpeechRecognizer>,
) -> TurnManager {
    let channel = SpeechChannel::new(engine, Duration::from_millis(1));
    TurnManager::new(
        channel,
        recognizer,
        SpeechOptions::default(),
        Duration::from_millis(2),
    )
}
