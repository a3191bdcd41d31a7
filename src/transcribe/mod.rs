//! Remote transcription: capture a fixed window of audio and turn it into text

mod api;
mod client;

pub use api::{HttpTranscriptApi, TranscriptApi, TranscriptJob, TranscriptStatus};
pub use client::{CpalRecorder, Recorder, TranscriptionClient};
