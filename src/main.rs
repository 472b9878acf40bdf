use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use murmur::agent::Mode;
use murmur::voice::{
    AudioCapture, AudioDevice, AudioPlayback, CpalAudioDevice, Synthesizer, TextToSpeech,
    peak_amplitude, rms,
};
use murmur::{Config, Daemon, LanguageHint};

/// Sample rate used by the device self-tests
const TEST_SAMPLE_RATE: u32 = 44_100;

/// Murmur - push-to-talk voice assistant
#[derive(Parser)]
#[command(name = "murmur", version, about)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Answer in a secondary language for the whole session (e.g. "spanish")
    #[arg(short, long, env = "MURMUR_LANGUAGE")]
    language: Option<LanguageHint>,

    /// Config file (defaults to ~/.config/murmur/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
#[allow(clippy::enum_variant_names)]
enum Command {
    /// Push-to-talk voice conversation (default)
    Voice,
    /// Typed conversation at the console
    Text,
    /// Test microphone input
    TestMic {
        /// Duration in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,
    },
    /// Test speaker output
    TestSpeaker,
    /// Test TTS output
    TestTts {
        /// Text to speak
        #[arg(default_value = "Hello! This is a test of the text to speech system.")]
        text: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "warn,murmur=info",
        1 => "info,murmur=debug",
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
    let mut config = Config::load(cli.config.as_deref())?;
    if cli.language.is_some() {
        config.language_hint = cli.language;
    }

    match cli.command.unwrap_or(Command::Voice) {
        Command::Voice => converse(&config, Mode::Voice).await,
        Command::Text => converse(&config, Mode::Text).await,
        Command::TestMic { duration } => test_mic(&config, duration).await,
        Command::TestSpeaker => test_speaker().await,
        Command::TestTts { text } => test_tts(&config, &text).await,
    }
}

/// Run a conversation on the console until `quit` or Ctrl-C
#[allow(clippy::future_not_send)]
async fn converse(config: &Config, mode: Mode) -> anyhow::Result<()> {
    tracing::info!(
        mode = ?mode,
        model = %config.llm.model,
        language = ?config.language_hint,
        "starting murmur"
    );

    let mut daemon = Daemon::from_config(config, mode)?;
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());

    match mode {
        Mode::Voice => daemon.run_voice(stdin).await?,
        Mode::Text => daemon.run_text(stdin).await?,
    }

    println!("Goodbye!");
    Ok(())
}

/// Test microphone input
#[allow(clippy::future_not_send)]
async fn test_mic(config: &Config, duration: u64) -> anyhow::Result<()> {
    println!("Testing microphone for {duration} seconds...");
    println!("Speak into your microphone!\n");

    let mut capture = AudioCapture::new(TEST_SAMPLE_RATE)?;
    capture.start()?;

    println!("Sample rate: {} Hz", capture.sample_rate());
    println!("---");

    let mut loudest = 0.0_f32;
    for i in 0..duration {
        tokio::time::sleep(Duration::from_secs(1)).await;

        let samples = capture.peek_buffer();
        let energy = rms(&samples);
        let peak = peak_amplitude(&samples);
        loudest = loudest.max(peak);

        // Visual meter
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let meter_len = (energy * 100.0).min(50.0) as usize;
        let meter: String = "█".repeat(meter_len) + &" ".repeat(50 - meter_len);

        println!("[{:2}s] RMS: {energy:.4} | Peak: {peak:.4} | [{meter}]", i + 1);

        capture.clear_buffer();
    }

    capture.stop();

    println!("\n---");
    if loudest > config.voice.silence_threshold {
        println!("Microphone is working (peak {loudest:.4}).");
    } else {
        println!(
            "Microphone is not picking up sound (peak {loudest:.4} <= {}).",
            config.voice.silence_threshold
        );
        println!("Check that the mic is plugged in and selected as the default input.");
    }

    Ok(())
}

/// Test speaker output with a sine wave
async fn test_speaker() -> anyhow::Result<()> {
    println!("Testing speaker output...");
    println!("You should hear a 440Hz tone for 2 seconds\n");

    let playback = AudioPlayback::new(TEST_SAMPLE_RATE)?;
    let samples = sine_wave(440.0, TEST_SAMPLE_RATE, 2.0, 0.3);

    println!("Playing {} samples at {TEST_SAMPLE_RATE} Hz...", samples.len());
    playback.play(samples).await?;

    println!("\n---");
    println!("If you heard the tone, your speakers are working!");

    Ok(())
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn sine_wave(frequency: f32, sample_rate: u32, secs: f32, volume: f32) -> Vec<f32> {
    let num_samples = (sample_rate as f32 * secs) as usize;
    (0..num_samples)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            (2.0 * std::f32::consts::PI * frequency * t).sin() * volume
        })
        .collect()
}

/// Test TTS output
#[allow(clippy::future_not_send)]
async fn test_tts(config: &Config, text: &str) -> anyhow::Result<()> {
    println!("Testing TTS with text: \"{text}\"\n");

    let tts = TextToSpeech::new(
        config.api_key()?,
        &config.llm.base_url,
        &config.voice.tts_model,
        &config.voice.tts_voice,
        config.llm.request_timeout,
    )?
    .with_response_format(&config.voice.response_format);

    println!("Synthesizing speech with voice {}...", tts.voice());
    let audio = tts.synthesize(text).await?;
    println!("Got {} bytes of audio data", audio.len());

    println!("Playing audio...");
    let mut device = CpalAudioDevice::new(
        config.voice.sample_rate,
        config.voice.playback_rate,
        config.voice.record_duration,
    );
    device.play(&audio).await?;

    println!("\n---");
    println!("If you heard the speech, TTS is working!");

    Ok(())
}
