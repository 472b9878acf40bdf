//! Console daemon: push-to-talk voice loop and text REPL
//!
//! The daemon owns the [`ConversationSession`] and lends it to the
//! [`TurnProcessor`] one turn at a time. Turns never overlap: capture,
//! transcription, completion, synthesis and playback are awaited in order.

use std::io::Write;
use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};

use crate::agent::{Mode, SystemPrompts, TurnOutcome, TurnProcessor};
use crate::completion::OpenAiChat;
use crate::config::Config;
use crate::session::ConversationSession;
use crate::tools::ToolRegistry;
use crate::voice::{
    AudioDevice, CpalAudioDevice, SpeechToText, Synthesizer, TextToSpeech, Transcriber, is_silent,
};
use crate::{Error, Result};

/// Audio side of the voice loop
pub struct VoiceIo {
    pub device: Box<dyn AudioDevice>,
    pub transcriber: Arc<dyn Transcriber>,
    pub synthesizer: Arc<dyn Synthesizer>,
    /// Recordings whose peak amplitude is at or below this are dropped
    pub silence_threshold: f32,
}

/// What happened during one push-to-talk turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceTurn {
    /// Recording never rose above the silence threshold
    Silent,
    /// Transcription failed or came back empty; nothing was appended
    NotUnderstood,
    /// The processor ran and produced `reply`
    Replied {
        transcript: String,
        reply: String,
        /// False when synthesis or playback failed
        spoken: bool,
    },
}

/// Owns one conversation and drives it from the console
pub struct Daemon {
    session: ConversationSession,
    processor: TurnProcessor,
    voice: Option<VoiceIo>,
}

impl Daemon {
    #[must_use]
    pub const fn new(processor: TurnProcessor, session: ConversationSession) -> Self {
        Self {
            session,
            processor,
            voice: None,
        }
    }

    /// Attach audio input/output for voice turns
    #[must_use]
    pub fn with_voice(mut self, voice: VoiceIo) -> Self {
        self.voice = Some(voice);
        self
    }

    /// Build a daemon wired to the configured remote services
    ///
    /// Voice mode also opens the default audio devices and the speech
    /// clients.
    ///
    /// # Errors
    ///
    /// Returns `Config` if no API key is configured or a client cannot be built
    pub fn from_config(config: &Config, mode: Mode) -> Result<Self> {
        let timeout = config.llm.request_timeout;
        let completion = OpenAiChat::new(
            config.api_key()?,
            &config.llm.base_url,
            &config.llm.model,
            timeout,
        )?;

        let processor = TurnProcessor::new(
            Arc::new(completion),
            Arc::new(ToolRegistry::with_builtin_tools()),
            SystemPrompts::for_mode(mode),
        )
        .with_fallback_reply(&config.llm.fallback_reply);

        let session = ConversationSession::with_language_hint(config.language_hint);
        let daemon = Self::new(processor, session);

        if mode == Mode::Text {
            return Ok(daemon);
        }

        let transcriber = SpeechToText::new(
            config.api_key()?,
            &config.llm.base_url,
            &config.voice.stt_model,
            timeout,
        )?;
        let synthesizer = TextToSpeech::new(
            config.api_key()?,
            &config.llm.base_url,
            &config.voice.tts_model,
            &config.voice.tts_voice,
            timeout,
        )?
        .with_response_format(&config.voice.response_format);
        let device = CpalAudioDevice::new(
            config.voice.sample_rate,
            config.voice.playback_rate,
            config.voice.record_duration,
        );

        Ok(daemon.with_voice(VoiceIo {
            device: Box::new(device),
            transcriber: Arc::new(transcriber),
            synthesizer: Arc::new(synthesizer),
            silence_threshold: config.voice.silence_threshold,
        }))
    }

    #[must_use]
    pub const fn session(&self) -> &ConversationSession {
        &self.session
    }

    #[must_use]
    pub const fn processor(&self) -> &TurnProcessor {
        &self.processor
    }

    /// Run one turn on typed input
    ///
    /// # Errors
    ///
    /// Propagates `UnknownTool` and `MalformedToolCall` from the processor
    pub async fn text_turn(&mut self, input: &str) -> Result<TurnOutcome> {
        self.processor.process(&mut self.session, input).await
    }

    /// Run one push-to-talk turn: capture, transcribe, process, speak
    ///
    /// Transcription and synthesis failures degrade to empty results; a
    /// failed synthesis skips playback.
    ///
    /// # Errors
    ///
    /// Returns `Config` without attached audio, `Device` if capture fails,
    /// and processor errors as for [`Daemon::text_turn`]
    #[allow(clippy::future_not_send)]
    pub async fn voice_turn(&mut self) -> Result<VoiceTurn> {
        let Some(voice) = self.voice.as_mut() else {
            return Err(Error::Config("voice turn requested without audio devices".to_string()));
        };

        let audio = voice.device.capture().await?;
        if is_silent(&audio.samples, voice.silence_threshold) {
            tracing::debug!(samples = audio.samples.len(), "recording below silence threshold");
            return Ok(VoiceTurn::Silent);
        }

        let transcript = voice.transcriber.transcribe(&audio).await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "transcription failed");
            String::new()
        });
        let transcript = transcript.trim().to_string();
        if transcript.is_empty() {
            return Ok(VoiceTurn::NotUnderstood);
        }
        tracing::info!(transcript = %transcript, "transcribed");

        let TurnOutcome::Completed(turn) = self.processor.process(&mut self.session, &transcript).await?
        else {
            return Ok(VoiceTurn::NotUnderstood);
        };

        let speech = voice.synthesizer.synthesize(&turn.reply).await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "speech synthesis failed");
            Vec::new()
        });

        let spoken = if speech.is_empty() {
            false
        } else {
            match voice.device.play(&speech).await {
                Ok(()) => true,
                Err(e) => {
                    tracing::error!(error = %e, "playback failed");
                    false
                }
            }
        };

        Ok(VoiceTurn::Replied {
            transcript,
            reply: turn.reply,
            spoken,
        })
    }

    /// Push-to-talk loop: Enter records, `quit` or `exit` stops
    ///
    /// # Errors
    ///
    /// Returns error if the console cannot be read
    #[allow(clippy::future_not_send)]
    pub async fn run_voice<R>(&mut self, input: R) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        if self.voice.is_none() {
            return Err(Error::Config("voice mode requires audio devices".to_string()));
        }

        let mut lines = input.lines();
        tracing::info!(history = self.session.len(), "voice loop started");

        loop {
            prompt("\nPress Enter to record or type 'quit' to exit: ")?;
            let Some(line) = next_line(&mut lines).await? else {
                break;
            };
            let command = line.trim();
            if is_quit(command) {
                break;
            }
            if !command.is_empty() {
                continue;
            }

            println!("Recording audio...");
            match self.voice_turn().await {
                Ok(VoiceTurn::Silent) => println!("No speech detected."),
                Ok(VoiceTurn::NotUnderstood) => println!("Could not understand audio."),
                Ok(VoiceTurn::Replied {
                    transcript,
                    reply,
                    spoken,
                }) => {
                    println!("[you] {transcript}");
                    println!("Assistant: {reply}");
                    if !spoken {
                        println!("Could not generate speech.");
                    }
                }
                Err(e) => tracing::error!(error = %e, "voice turn failed"),
            }
        }

        tracing::info!(history = self.session.len(), "voice loop stopped");
        Ok(())
    }

    /// Text REPL over the same processor
    ///
    /// # Errors
    ///
    /// Returns error if the console cannot be read
    pub async fn run_text<R>(&mut self, input: R) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = input.lines();
        println!("Type 'quit' to exit.");

        loop {
            prompt("\nYou: ")?;
            let Some(line) = next_line(&mut lines).await? else {
                break;
            };
            let text = line.trim();
            if is_quit(text) {
                break;
            }
            if text.is_empty() {
                continue;
            }

            match self.text_turn(text).await {
                Ok(TurnOutcome::Completed(turn)) => println!("Assistant: {}", turn.reply),
                Ok(TurnOutcome::Skipped) => {}
                Err(e) => tracing::error!(error = %e, "turn failed"),
            }
        }

        tracing::info!(history = self.session.len(), "text loop stopped");
        Ok(())
    }
}

/// Next console line; `None` on end of input or Ctrl-C
async fn next_line<R>(lines: &mut Lines<R>) -> Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    tokio::select! {
        line = lines.next_line() => Ok(line?),
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("interrupted");
            Ok(None)
        }
    }
}

fn prompt(text: &str) -> Result<()> {
    let mut stdout = std::io::stdout();
    stdout.write_all(text.as_bytes())?;
    stdout.flush()?;
    Ok(())
}

fn is_quit(command: &str) -> bool {
    command.eq_ignore_ascii_case("quit") || command.eq_ignore_ascii_case("exit")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quit_words() {
        assert!(is_quit("quit"));
        assert!(is_quit("EXIT"));
        assert!(!is_quit(""));
        assert!(!is_quit("quitter"));
    }
}
