//! Speech output: TTS synthesis, playback, and the ordered utterance queue

mod channel;
mod engine;
mod playback;

pub use channel::SpeechChannel;
pub use engine::{HttpTtsEngine, SpeechEngine, SpeechOptions, SpeechOutcome};
pub use playback::AudioPlayback;
