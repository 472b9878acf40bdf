//! Voice processing module
//!
//! Audio capture and playback behind [`AudioDevice`], plus the remote
//! speech-to-text and text-to-speech clients.

mod capture;
mod device;
mod playback;
mod stt;
mod tts;

pub use capture::{
    AudioBuffer, AudioCapture, DEFAULT_SAMPLE_RATE, is_silent, peak_amplitude, rms, samples_to_wav,
};
pub use device::{AudioDevice, CpalAudioDevice};
pub use playback::{AudioPlayback, PLAYBACK_SAMPLE_RATE, decode_audio, resample};
pub use stt::{SpeechToText, Transcriber};
pub use tts::{Synthesizer, TextToSpeech};
