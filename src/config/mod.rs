//! Configuration management for Murmur

pub mod file;

use std::path::Path;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use crate::agent::DEFAULT_FALLBACK_REPLY;
use crate::session::LanguageHint;
use crate::voice::DEFAULT_SAMPLE_RATE;
use crate::{Error, Result};

pub use file::{MurmurConfigFile, config_file_path, load_config_file, load_config_file_from};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_LLM_MODEL: &str = "gpt-4o-mini";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_RECORD_SECONDS: f32 = 5.0;
const DEFAULT_SILENCE_THRESHOLD: f32 = 0.001;

/// Murmur configuration
#[derive(Debug)]
pub struct Config {
    /// `OpenAI`-compatible API key (never logged)
    api_key: Option<SecretString>,

    /// Chat completion settings
    pub llm: LlmConfig,

    /// Voice processing settings
    pub voice: VoiceConfig,

    /// Session-wide language hint applied at start-up
    pub language_hint: Option<LanguageHint>,
}

/// Chat completion configuration
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// API base URL shared by chat, transcription and speech endpoints
    pub base_url: String,

    /// Model identifier for chat completions
    pub model: String,

    /// Bound on every remote call
    pub request_timeout: Duration,

    /// Reply recorded when the completion service fails
    pub fallback_reply: String,
}

/// Voice processing configuration
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    /// STT model (e.g. "whisper-1")
    pub stt_model: String,

    /// TTS model (e.g. "tts-1")
    pub tts_model: String,

    /// TTS voice identifier
    pub tts_voice: String,

    /// TTS container format
    pub response_format: String,

    /// Capture sample rate in Hz
    pub sample_rate: u32,

    /// Playback sample rate in Hz
    pub playback_rate: u32,

    /// Length of one push-to-talk recording
    pub record_duration: Duration,

    /// Peak amplitude at or below which a recording is treated as silence
    pub silence_threshold: f32,
}

impl Config {
    /// Load configuration from the environment and the TOML config file
    ///
    /// `path` overrides the default config file location; an explicit path
    /// must exist and parse.
    ///
    /// # Errors
    ///
    /// Returns error if an explicit config file is unreadable or a value is invalid
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let fc = match path {
            Some(path) => file::load_config_file_from(path)?,
            None => file::load_config_file(),
        };
        Self::from_sources(fc, |key| std::env::var(key).ok())
    }

    /// Merge a parsed config file with environment lookups (env > toml > default)
    ///
    /// # Errors
    ///
    /// Returns `Config` if a value is out of range or unparseable
    pub fn from_sources(
        fc: MurmurConfigFile,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let api_key = env("OPENAI_API_KEY")
            .or(fc.api_keys.openai)
            .filter(|key| !key.trim().is_empty())
            .map(SecretString::from);

        let llm = LlmConfig {
            base_url: env("MURMUR_BASE_URL")
                .or(fc.llm.base_url)
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: env("MURMUR_MODEL")
                .or(fc.llm.model)
                .unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string()),
            request_timeout: Duration::from_secs(
                fc.llm.request_timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
            fallback_reply: fc
                .llm
                .fallback_reply
                .unwrap_or_else(|| DEFAULT_FALLBACK_REPLY.to_string()),
        };

        let sample_rate = fc.voice.sample_rate.unwrap_or(DEFAULT_SAMPLE_RATE);
        let record_seconds = fc.voice.record_seconds.unwrap_or(DEFAULT_RECORD_SECONDS);
        let silence_threshold = fc
            .voice
            .silence_threshold
            .unwrap_or(DEFAULT_SILENCE_THRESHOLD);

        if record_seconds <= 0.0 {
            return Err(Error::Config(format!(
                "record_seconds must be positive, got {record_seconds}"
            )));
        }
        let record_duration = Duration::try_from_secs_f32(record_seconds)
            .map_err(|e| Error::Config(format!("invalid record_seconds: {e}")))?;
        if !silence_threshold.is_finite() || silence_threshold < 0.0 {
            return Err(Error::Config(format!(
                "silence_threshold must not be negative, got {silence_threshold}"
            )));
        }

        let voice = VoiceConfig {
            stt_model: fc.voice.stt_model.unwrap_or_else(|| "whisper-1".to_string()),
            tts_model: fc.voice.tts_model.unwrap_or_else(|| "tts-1".to_string()),
            tts_voice: fc.voice.tts_voice.unwrap_or_else(|| "alloy".to_string()),
            response_format: fc
                .voice
                .response_format
                .unwrap_or_else(|| "mp3".to_string()),
            sample_rate,
            playback_rate: fc.voice.playback_rate.unwrap_or(sample_rate),
            record_duration,
            silence_threshold,
        };

        if voice.sample_rate == 0 || voice.playback_rate == 0 {
            return Err(Error::Config("sample rates must be non-zero".to_string()));
        }
        if llm.request_timeout.is_zero() {
            return Err(Error::Config(
                "request_timeout_secs must be non-zero".to_string(),
            ));
        }

        let language_hint = env("MURMUR_LANGUAGE")
            .or(fc.agent.language_hint)
            .map(|raw| raw.parse::<LanguageHint>())
            .transpose()?;

        tracing::debug!(
            model = %llm.model,
            base_url = %llm.base_url,
            has_api_key = api_key.is_some(),
            language_hint = ?language_hint,
            "configuration resolved"
        );

        Ok(Self {
            api_key,
            llm,
            voice,
            language_hint,
        })
    }

    #[must_use]
    pub const fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// API key for remote services
    ///
    /// # Errors
    ///
    /// Returns `Config` if no key was configured
    pub fn api_key(&self) -> Result<SecretString> {
        self.api_key
            .as_ref()
            .map(|key| SecretString::from(key.expose_secret().to_owned()))
            .ok_or_else(|| {
                Error::Config(
                    "no API key: set OPENAI_API_KEY or [api_keys].openai in config.toml"
                        .to_string(),
                )
            })
    }
}
