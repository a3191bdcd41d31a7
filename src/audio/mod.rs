//! Microphone capture and WAV encoding

mod capture;

pub use capture::{AudioCapture, SAMPLE_RATE, samples_to_wav};
