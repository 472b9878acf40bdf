//! Voice pipeline integration tests
//!
//! Tests voice components without requiring audio hardware

use std::io::Cursor;
use std::sync::Arc;

use murmur::agent::{Mode, SystemPrompts, TurnProcessor, TurnState};
use murmur::completion::CompletionService;
use murmur::session::{ConversationSession, Role};
use murmur::tools::ToolRegistry;
use murmur::voice::{AudioBuffer, DEFAULT_SAMPLE_RATE, decode_audio, is_silent, samples_to_wav};
use murmur::{Daemon, Error, VoiceIo, VoiceTurn};

mod common;

use common::{FakeAudio, FakeSynthesizer, FakeTranscriber, ScriptedCompletion, Step, sine_samples};

const SILENCE_THRESHOLD: f32 = 0.001;

struct Harness {
    daemon: Daemon,
    completion: Arc<ScriptedCompletion>,
    transcriber: Arc<FakeTranscriber>,
    synthesizer: Arc<FakeSynthesizer>,
    played: Arc<std::sync::Mutex<Vec<Vec<u8>>>>,
}

fn harness(
    steps: Vec<Step>,
    audio: FakeAudio,
    transcriber: Arc<FakeTranscriber>,
    synthesizer: Arc<FakeSynthesizer>,
) -> Harness {
    let completion = ScriptedCompletion::new(steps);
    let service: Arc<dyn CompletionService> = completion.clone();
    let processor = TurnProcessor::new(
        service,
        Arc::new(ToolRegistry::with_builtin_tools()),
        SystemPrompts::for_mode(Mode::Voice),
    );
    let played = Arc::clone(&audio.played);

    let daemon = Daemon::new(processor, ConversationSession::new()).with_voice(VoiceIo {
        device: Box::new(audio),
        transcriber: transcriber.clone(),
        synthesizer: synthesizer.clone(),
        silence_threshold: SILENCE_THRESHOLD,
    });

    Harness {
        daemon,
        completion,
        transcriber,
        synthesizer,
        played,
    }
}

#[tokio::test]
async fn test_voice_turn_speaks_reply() {
    let mut h = harness(
        vec![Step::text("Hello there!")],
        FakeAudio::speaking(),
        FakeTranscriber::saying("hi murmur"),
        FakeSynthesizer::working(),
    );

    let turn = h.daemon.voice_turn().await.unwrap();

    assert_eq!(
        turn,
        VoiceTurn::Replied {
            transcript: "hi murmur".to_string(),
            reply: "Hello there!".to_string(),
            spoken: true,
        }
    );
    assert_eq!(h.daemon.session().len(), 2);
    assert_eq!(h.played.lock().unwrap().as_slice(), &[b"Hello there!".to_vec()]);
}

#[tokio::test]
async fn test_synthesis_failure_skips_playback() {
    let mut h = harness(
        vec![Step::text("Hello there!")],
        FakeAudio::speaking(),
        FakeTranscriber::saying("hi"),
        FakeSynthesizer::failing(),
    );

    let turn = h.daemon.voice_turn().await.unwrap();

    assert!(matches!(turn, VoiceTurn::Replied { spoken: false, .. }));
    assert!(h.played.lock().unwrap().is_empty());
    assert_eq!(h.daemon.processor().state(), TurnState::TurnComplete);
    assert_eq!(h.synthesizer.texts.lock().unwrap().len(), 1);
    // The turn itself still completed
    assert_eq!(h.daemon.session().len(), 2);
}

#[tokio::test]
async fn test_empty_transcription_appends_nothing() {
    let mut h = harness(
        vec![Step::text("unused")],
        FakeAudio::speaking(),
        FakeTranscriber::saying("   "),
        FakeSynthesizer::working(),
    );

    let turn = h.daemon.voice_turn().await.unwrap();

    assert_eq!(turn, VoiceTurn::NotUnderstood);
    assert!(h.daemon.session().is_empty());
    assert!(h.completion.requests().is_empty());
    assert_eq!(h.daemon.processor().state(), TurnState::AwaitingUserInput);
    assert!(h.played.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_transcription_failure_is_not_understood() {
    let mut h = harness(
        vec![Step::text("unused")],
        FakeAudio::speaking(),
        FakeTranscriber::failing(),
        FakeSynthesizer::working(),
    );

    let turn = h.daemon.voice_turn().await.unwrap();

    assert_eq!(turn, VoiceTurn::NotUnderstood);
    assert_eq!(h.transcriber.call_count(), 1);
    assert!(h.daemon.session().is_empty());
}

#[tokio::test]
async fn test_silent_recording_is_not_transcribed() {
    let silence = AudioBuffer::new(vec![0.0; 2_400], DEFAULT_SAMPLE_RATE);
    let mut h = harness(
        vec![],
        FakeAudio::with_recording(silence),
        FakeTranscriber::saying("ghost"),
        FakeSynthesizer::working(),
    );

    let turn = h.daemon.voice_turn().await.unwrap();

    assert_eq!(turn, VoiceTurn::Silent);
    assert_eq!(h.transcriber.call_count(), 0);
    assert!(h.daemon.session().is_empty());
}

#[tokio::test]
async fn test_capture_failure_leaves_session_untouched() {
    let mut h = harness(
        vec![],
        FakeAudio::broken_microphone(),
        FakeTranscriber::saying("hi"),
        FakeSynthesizer::working(),
    );

    let err = h.daemon.voice_turn().await.unwrap_err();

    assert!(matches!(err, Error::Device(_)));
    assert!(h.daemon.session().is_empty());
}

#[tokio::test]
async fn test_playback_failure_keeps_history() {
    let mut h = harness(
        vec![Step::text("Hello there!")],
        FakeAudio::speaking().with_failing_playback(),
        FakeTranscriber::saying("hi"),
        FakeSynthesizer::working(),
    );

    let turn = h.daemon.voice_turn().await.unwrap();

    assert!(matches!(turn, VoiceTurn::Replied { spoken: false, .. }));
    assert_eq!(h.daemon.session().len(), 2);
}

#[tokio::test]
async fn test_voice_turn_requires_audio() {
    let completion = ScriptedCompletion::new(Vec::new());
    let service: Arc<dyn CompletionService> = completion;
    let processor = TurnProcessor::new(
        service,
        Arc::new(ToolRegistry::new()),
        SystemPrompts::default(),
    );
    let mut daemon = Daemon::new(processor, ConversationSession::new());

    assert!(matches!(daemon.voice_turn().await, Err(Error::Config(_))));
}

#[tokio::test]
async fn test_voice_loop_records_on_enter_until_quit() {
    let mut h = harness(
        vec![Step::text("First."), Step::text("Second.")],
        FakeAudio::speaking(),
        FakeTranscriber::saying("hello"),
        FakeSynthesizer::working(),
    );

    // Non-empty, non-quit input is ignored
    let input: &[u8] = b"\nsomething else\n\nquit\n\n";
    h.daemon.run_voice(input).await.unwrap();

    assert_eq!(h.daemon.session().len(), 4);
    assert_eq!(h.played.lock().unwrap().len(), 2);
    assert_eq!(h.completion.requests().len(), 2);
}

#[tokio::test]
async fn test_text_loop_runs_turns_until_quit() {
    let mut h = harness(
        vec![Step::text("Hi!"), Step::tool_call("launch_rocket", "{}"), Step::text("Bye!")],
        FakeAudio::speaking(),
        FakeTranscriber::saying("unused"),
        FakeSynthesizer::working(),
    );

    // An unknown tool fails only its own turn
    let input: &[u8] = b"hello\n\nlaunch\nbye\nexit\nnever read\n";
    h.daemon.run_text(input).await.unwrap();

    let roles: Vec<Role> = h
        .daemon
        .session()
        .history()
        .iter()
        .map(murmur::Turn::role)
        .collect();
    assert_eq!(
        roles,
        vec![
            Role::User,
            Role::Assistant,
            Role::User,
            Role::User,
            Role::Assistant
        ]
    );
    assert!(h.played.lock().unwrap().is_empty());
    assert_eq!(h.transcriber.call_count(), 0);
}

#[tokio::test]
async fn test_text_loop_stops_at_end_of_input() {
    let mut h = harness(
        vec![Step::text("Hi!")],
        FakeAudio::speaking(),
        FakeTranscriber::saying("unused"),
        FakeSynthesizer::working(),
    );

    let input: &[u8] = b"hello";
    h.daemon.run_text(input).await.unwrap();

    assert_eq!(h.daemon.session().len(), 2);
}

#[test]
fn test_silence_gate_threshold() {
    assert!(is_silent(&[0.0; 100], SILENCE_THRESHOLD));
    assert!(is_silent(&[0.0005, -0.0009], SILENCE_THRESHOLD));
    assert!(!is_silent(
        &sine_samples(440.0, 0.1, 0.3, DEFAULT_SAMPLE_RATE),
        SILENCE_THRESHOLD
    ));
}

#[test]
fn test_samples_to_wav() {
    let samples = sine_samples(440.0, 0.1, 0.5, DEFAULT_SAMPLE_RATE);
    let wav_data = samples_to_wav(&samples, DEFAULT_SAMPLE_RATE).unwrap();

    // Check WAV header magic
    assert_eq!(&wav_data[0..4], b"RIFF");
    assert_eq!(&wav_data[8..12], b"WAVE");

    // At least the 44-byte header plus 16-bit samples
    assert!(wav_data.len() >= 44 + samples.len() * 2);
}

#[test]
fn test_wav_roundtrip() {
    let original_samples: Vec<f32> = vec![0.0, 0.5, -0.5, 1.0, -1.0, 0.25];
    let wav_data = samples_to_wav(&original_samples, DEFAULT_SAMPLE_RATE).unwrap();

    let mut reader = hound::WavReader::new(Cursor::new(wav_data.clone())).unwrap();
    let spec = reader.spec();
    assert_eq!(spec.sample_rate, DEFAULT_SAMPLE_RATE);
    assert_eq!(spec.channels, 1);
    assert_eq!(spec.bits_per_sample, 16);

    let read_samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
    assert_eq!(read_samples.len(), original_samples.len());
    assert_eq!(read_samples[3], 32767);

    let (decoded, rate) = decode_audio(&wav_data).unwrap();
    assert_eq!(rate, DEFAULT_SAMPLE_RATE);
    assert_eq!(decoded.len(), original_samples.len());
}

#[test]
fn test_audio_buffer_to_wav() {
    let buffer = AudioBuffer::new(sine_samples(440.0, 0.5, 0.3, 16_000), 16_000);
    assert!((buffer.duration_secs() - 0.5).abs() < 1e-3);

    let wav = buffer.to_wav().unwrap();
    let reader = hound::WavReader::new(Cursor::new(wav)).unwrap();
    assert_eq!(reader.spec().sample_rate, 16_000);
    assert_eq!(reader.len() as usize, buffer.samples.len());
}
