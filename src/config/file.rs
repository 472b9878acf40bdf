//! TOML configuration file loading
//!
//! Supports `~/.config/murmur/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::{Error, Result};

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct MurmurConfigFile {
    /// Chat completion configuration
    #[serde(default)]
    pub llm: LlmFileConfig,

    /// Voice/audio configuration
    #[serde(default)]
    pub voice: VoiceFileConfig,

    /// Conversation behavior
    #[serde(default)]
    pub agent: AgentFileConfig,

    /// API keys for external services
    #[serde(default)]
    pub api_keys: ApiKeysFileConfig,
}

/// LLM-related configuration
#[derive(Debug, Default, Deserialize)]
pub struct LlmFileConfig {
    /// Model identifier (e.g. "gpt-4o-mini")
    pub model: Option<String>,

    /// API base URL (e.g. `https://api.openai.com/v1`)
    pub base_url: Option<String>,

    /// Timeout applied to every remote call
    pub request_timeout_secs: Option<u64>,

    /// Reply recorded when the completion service fails
    pub fallback_reply: Option<String>,
}

/// Voice processing configuration
#[derive(Debug, Default, Deserialize)]
pub struct VoiceFileConfig {
    /// STT model (e.g. "whisper-1")
    pub stt_model: Option<String>,

    /// TTS model (e.g. "tts-1")
    pub tts_model: Option<String>,

    /// TTS voice identifier (e.g. "alloy")
    pub tts_voice: Option<String>,

    /// TTS container ("mp3" or "wav")
    pub response_format: Option<String>,

    /// Capture sample rate in Hz
    pub sample_rate: Option<u32>,

    /// Playback sample rate in Hz
    pub playback_rate: Option<u32>,

    /// Seconds recorded per push-to-talk capture
    pub record_seconds: Option<f32>,

    /// Peak amplitude at or below which a recording counts as silence
    pub silence_threshold: Option<f32>,
}

/// Conversation behavior
#[derive(Debug, Default, Deserialize)]
pub struct AgentFileConfig {
    /// Session-wide language hint (e.g. "spanish")
    pub language_hint: Option<String>,
}

/// API keys configuration
#[derive(Debug, Default, Deserialize)]
pub struct ApiKeysFileConfig {
    pub openai: Option<String>,
}

/// Load the TOML config file from the standard path
///
/// Returns `MurmurConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file() -> MurmurConfigFile {
    let Some(path) = config_file_path() else {
        return MurmurConfigFile::default();
    };

    if !path.exists() {
        return MurmurConfigFile::default();
    }

    match load_config_file_from(&path) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to load config file, using defaults"
            );
            MurmurConfigFile::default()
        }
    }
}

/// Load a config file from an explicit path
///
/// # Errors
///
/// Returns error if the file cannot be read or parsed
pub fn load_config_file_from(path: &Path) -> Result<MurmurConfigFile> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("cannot read {}: {e}", path.display()))
    })?;
    let config = toml::from_str(&content)?;
    tracing::info!(path = %path.display(), "loaded config file");
    Ok(config)
}

/// Return the config file path: `~/.config/murmur/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("murmur").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn partial_file_parses() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[llm]\nmodel = \"gpt-4o\"\n\n[voice]\nrecord_seconds = 3.5\n\n[agent]\nlanguage_hint = \"spanish\""
        )
        .unwrap();

        let config = load_config_file_from(file.path()).unwrap();
        assert_eq!(config.llm.model.as_deref(), Some("gpt-4o"));
        assert_eq!(config.voice.record_seconds, Some(3.5));
        assert_eq!(config.agent.language_hint.as_deref(), Some("spanish"));
        assert!(config.api_keys.openai.is_none());
    }

    #[test]
    fn invalid_toml_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[llm\nmodel = 1").unwrap();
        assert!(matches!(load_config_file_from(file.path()), Err(Error::Toml(_))));
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_config_file_from(&dir.path().join("absent.toml"));
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
