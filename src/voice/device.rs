//! Device boundary for push-to-talk capture and playback

use std::time::Duration;

use async_trait::async_trait;

use super::capture::{AudioBuffer, AudioCapture};
use super::playback::AudioPlayback;
use crate::Result;

/// Microphone and speaker access
///
/// Implementations hold device streams that are not `Send`, so the futures
/// are local to the driving task.
#[async_trait(?Send)]
pub trait AudioDevice {
    /// Record one fixed-length buffer, returning when recording ends
    ///
    /// # Errors
    ///
    /// Returns `Device` if the input device fails
    async fn capture(&mut self) -> Result<AudioBuffer>;

    /// Play encoded audio, returning when playback ends
    ///
    /// # Errors
    ///
    /// Returns `Device` if decoding or the output device fails
    async fn play(&mut self, audio: &[u8]) -> Result<()>;
}

/// Default host devices through cpal
///
/// Devices are opened per call so a missing microphone only fails the
/// capture step that needs it.
#[derive(Debug, Clone, Copy)]
pub struct CpalAudioDevice {
    capture_rate: u32,
    playback_rate: u32,
    record_duration: Duration,
}

impl CpalAudioDevice {
    #[must_use]
    pub const fn new(capture_rate: u32, playback_rate: u32, record_duration: Duration) -> Self {
        Self {
            capture_rate,
            playback_rate,
            record_duration,
        }
    }

    #[must_use]
    pub const fn record_duration(&self) -> Duration {
        self.record_duration
    }
}

#[async_trait(?Send)]
impl AudioDevice for CpalAudioDevice {
    async fn capture(&mut self) -> Result<AudioBuffer> {
        let mut capture = AudioCapture::new(self.capture_rate)?;
        capture.record(self.record_duration).await
    }

    async fn play(&mut self, audio: &[u8]) -> Result<()> {
        AudioPlayback::new(self.playback_rate)?
            .play_encoded(audio)
            .await
    }
}
