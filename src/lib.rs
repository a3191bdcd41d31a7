//! Eyeway - voice-guided navigation client for visually impaired users
//!
//! This library provides the turn-based voice interaction core:
//! - Speech output channel (ordered, non-overlapping TTS queue)
//! - Transcription client (fixed-window capture + remote STT)
//! - Voice turn manager (strict speak-then-listen discipline)
//! - Command interpreter and cancellable voice control loops
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                 Voice Control Loops                  │
//! │     Home (idle)  │  Destination  │  Obstacles       │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │                  Turn Manager                        │
//! │   Speech Channel (TTS)  │  Recognizer (capture+STT) │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │               Remote backends (HTTP)                 │
//! │   Transcription  │  Navigation  │  Obstacle vision  │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod audio;
pub mod commands;
pub mod config;
pub mod control;
pub mod daemon;
pub mod error;
pub mod nav;
pub mod router;
pub mod speech;
pub mod transcribe;
pub mod turn;
pub mod vision;

pub use commands::{VoiceAction, parse_voice_command};
pub use config::Config;
pub use control::{CancelToken, DestinationLoop, HomeControlLoop, LoopState};
pub use daemon::Daemon;
pub use error::{Error, Result};
pub use nav::{
    Coordinates, LocationProvider, NavigationClient, RoutePlanner, RouteSummary, StaticLocation,
};
pub use router::{Navigator, Route, ScreenStack};
pub use speech::{SpeechChannel, SpeechEngine, SpeechOptions, SpeechOutcome};
pub use transcribe::{TranscriptApi, TranscriptJob, TranscriptStatus, TranscriptionClient};
pub use turn::{SpeechRecognizer, TurnManager};
pub use vision::{FrameSource, Obstacle, ObstacleAnnouncer, VisionClient};
