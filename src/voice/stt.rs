//! Speech-to-text (STT) processing

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use super::capture::AudioBuffer;
use crate::{Error, Result};

/// Converts captured audio to text
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe a mono PCM buffer
    ///
    /// # Errors
    ///
    /// Returns `Transcription` on empty input or any remote failure
    async fn transcribe(&self, audio: &AudioBuffer) -> Result<String>;
}

/// Response from the Whisper transcription API
#[derive(serde::Deserialize)]
struct WhisperResponse {
    text: String,
}

/// Transcribes speech through an `OpenAI`-compatible Whisper endpoint
pub struct SpeechToText {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    model: String,
}

impl SpeechToText {
    /// Create a new STT client
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing or the HTTP client cannot be built
    pub fn new(
        api_key: SecretString,
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        if api_key.expose_secret().is_empty() {
            return Err(Error::Config(
                "OpenAI API key required for Whisper".to_string(),
            ));
        }

        Ok(Self {
            client: reqwest::Client::builder().timeout(timeout).build()?,
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        })
    }
}

#[async_trait]
impl Transcriber for SpeechToText {
    async fn transcribe(&self, audio: &AudioBuffer) -> Result<String> {
        if audio.is_empty() {
            return Err(Error::Transcription("empty audio buffer".to_string()));
        }

        let wav = audio.to_wav()?;
        tracing::debug!(audio_bytes = wav.len(), "starting Whisper transcription");

        let form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(wav)
                    .file_name("audio.wav")
                    .mime_str("audio/wav")
                    .map_err(|e| Error::Transcription(e.to_string()))?,
            )
            .text("model", self.model.clone());

        let response = self
            .client
            .post(format!("{}/audio/transcriptions", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Whisper request failed");
                Error::Transcription(e.to_string())
            })?;

        let status = response.status();
        tracing::debug!(status = %status, "received response");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Whisper API error");
            return Err(Error::Transcription(format!(
                "Whisper API error {status}: {body}"
            )));
        }

        let result: WhisperResponse = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "failed to parse response");
            Error::Transcription(e.to_string())
        })?;

        let text = result.text.trim().to_string();
        tracing::info!(transcript = %text, "transcription complete");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> SpeechToText {
        SpeechToText::new(
            SecretString::from("sk-test".to_string()),
            "http://127.0.0.1:9/v1/",
            "whisper-1",
            Duration::from_millis(200),
        )
        .unwrap()
    }

    #[test]
    fn base_url_is_normalized() {
        assert_eq!(client().base_url, "http://127.0.0.1:9/v1");
    }

    #[test]
    fn empty_key_rejected() {
        let result = SpeechToText::new(
            SecretString::from(String::new()),
            "https://api.openai.com/v1",
            "whisper-1",
            Duration::from_secs(1),
        );
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn empty_buffer_fails_without_a_request() {
        let err = client()
            .transcribe(&AudioBuffer::new(Vec::new(), 24_000))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Transcription(msg) if msg.contains("empty")));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_transcription_error() {
        let err = client()
            .transcribe(&AudioBuffer::new(vec![0.1; 2400], 24_000))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Transcription(_)));
    }
}
