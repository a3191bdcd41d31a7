use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use eyeway::audio::AudioCapture;
use eyeway::speech::{AudioPlayback, HttpTtsEngine};
use eyeway::transcribe::{CpalRecorder, HttpTranscriptApi, TranscriptionClient};
use eyeway::{Config, Daemon};

/// Eyeway - voice-guided navigation assistant
#[derive(Parser)]
#[command(name = "eyeway", version, about)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
#[allow(clippy::enum_variant_names)]
enum Command {
    /// Test microphone input
    TestMic {
        /// Duration in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,
    },
    /// Test speaker output
    TestSpeaker,
    /// Test TTS output
    TestSpeak {
        /// Text to speak
        #[arg(default_value = "Welcome to Eyeway, your navigation assistant.")]
        text: String,
    },
    /// Record one window and print the transcript
    TestListen,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,eyeway=info",
        1 => "info,eyeway=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

#[allow(clippy::future_not_send)]
async fn run(cli: Cli) -> anyhow::Result<()> {
    if let Some(cmd) = cli.command {
        return match cmd {
            Command::TestMic { duration } => test_mic(duration).await,
            Command::TestSpeaker => test_speaker(),
            Command::TestSpeak { text } => test_speak(&text).await,
            Command::TestListen => test_listen().await,
        };
    }

    let config = Config::load();
    tracing::debug!(?config, "loaded configuration");

    let daemon = Daemon::new(config)?;
    tracing::info!("eyeway ready - listening for commands");

    // Run until interrupted
    daemon.run().await?;

    Ok(())
}

/// Test microphone input
#[allow(clippy::future_not_send)]
async fn test_mic(duration: u64) -> anyhow::Result<()> {
    println!("Testing microphone for {duration} seconds...");
    println!("Speak into your microphone!\n");

    let mut capture = AudioCapture::new()?;
    capture.start()?;
    println!("---");

    for i in 0..duration {
        tokio::time::sleep(Duration::from_secs(1)).await;

        let samples = capture.take_buffer();
        let energy = calculate_rms(&samples);
        let peak = samples.iter().map(|s| s.abs()).fold(0.0_f32, f32::max);

        // Visual meter
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let meter_len = (energy * 100.0).min(50.0) as usize;
        let meter: String = "█".repeat(meter_len) + &" ".repeat(50 - meter_len);

        let second = i + 1;
        println!("[{second:2}s] RMS: {energy:.4} | Peak: {peak:.4} | [{meter}]");
    }

    capture.stop();

    println!("\n---");
    println!("If you saw movement in the meter, your mic is working!");
    println!("If RMS stayed near 0, check:");
    println!("  1. Is your mic plugged in?");
    println!("  2. Run: pactl info | grep 'Default Source'");
    println!("  3. Run: arecord -l (to list devices)");

    Ok(())
}

/// Calculate RMS energy
#[allow(clippy::cast_precision_loss)]
fn calculate_rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}

/// Test speaker output with a sine wave
fn test_speaker() -> anyhow::Result<()> {
    println!("Testing speaker output...");
    println!("You should hear a 440Hz tone for 2 seconds\n");

    let playback = AudioPlayback::new()?;

    // 2 seconds of 440Hz sine at 24kHz
    let sample_rate = 24000_usize;
    let frequency = 440.0_f32;
    let num_samples = sample_rate * 2;

    #[allow(clippy::cast_precision_loss)]
    let samples: Vec<f32> = (0..num_samples)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            (2.0 * std::f32::consts::PI * frequency * t).sin() * 0.3 // 30% volume
        })
        .collect();

    let count = samples.len();
    println!("Playing {count} samples at {sample_rate} Hz...");
    playback.play_samples(&samples)?;

    println!("\n---");
    println!("If you heard the tone, your speakers are working!");

    Ok(())
}

/// Test TTS synthesis and playback
#[allow(clippy::future_not_send)]
async fn test_speak(text: &str) -> anyhow::Result<()> {
    println!("Testing TTS with text: \"{text}\"\n");

    let config = Config::load();
    let engine = HttpTtsEngine::new(
        config.require_openai_key()?.to_string(),
        config.tts_voice.clone(),
        config.tts_model.clone(),
    )?;

    println!("Synthesizing speech...");
    let mp3_data = engine.synthesize(text, config.speech_options.rate).await?;
    println!("Got {} bytes of audio data", mp3_data.len());

    println!("Playing audio...");
    let playback = AudioPlayback::new()?;
    playback.play_mp3(&mp3_data)?;

    println!("\n---");
    println!("If you heard the speech, TTS is working!");

    Ok(())
}

/// Record one fixed window and print the transcript
async fn test_listen() -> anyhow::Result<()> {
    let config = Config::load();
    let window = config.record_window;

    println!("Recording for {} ms - speak now!\n", window.as_millis());

    let api = HttpTranscriptApi::new(
        config.transcription_url.clone(),
        config.require_transcription_key()?.to_string(),
    )?;
    let client = TranscriptionClient::new(Arc::new(api), Arc::new(CpalRecorder), &config);

    match client.capture_and_transcribe().await {
        Some(text) => println!("Heard: \"{text}\""),
        None => println!("No transcript (silence, capture failure, or service error)"),
    }

    Ok(())
}
