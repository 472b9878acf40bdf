//! Shared test utilities: scripted stand-ins for the remote services and
//! audio devices

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Map, Value};

use murmur::completion::{CompletionRequest, CompletionService, Reply, ToolCallRequest};
use murmur::session::Turn;
use murmur::tools::{ToolDescriptor, ToolHandler};
use murmur::voice::{AudioBuffer, AudioDevice, Synthesizer, Transcriber};
use murmur::{Error, Result};

/// One scripted model reply
#[derive(Debug, Clone)]
pub enum Step {
    Text(String),
    ToolCall { name: String, arguments: String },
    /// Reply with the content of the latest tool result
    EchoToolResult,
    Fail,
}

impl Step {
    pub fn text(text: &str) -> Self {
        Self::Text(text.to_string())
    }

    pub fn tool_call(name: &str, arguments: &str) -> Self {
        Self::ToolCall {
            name: name.to_string(),
            arguments: arguments.to_string(),
        }
    }
}

/// Snapshot of a request the completion service received
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub system: String,
    pub history: Vec<Turn>,
    pub tools: Vec<String>,
}

/// Completion service that replays a fixed script
#[derive(Default)]
pub struct ScriptedCompletion {
    script: Mutex<VecDeque<Step>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl ScriptedCompletion {
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(steps.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionService for ScriptedCompletion {
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<Reply> {
        let call_index = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(RecordedRequest {
                system: request.system.to_string(),
                history: request.history.to_vec(),
                tools: request.tools.iter().map(|t| t.name.clone()).collect(),
            });
            requests.len()
        };

        let step = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| Error::CompletionService("script exhausted".to_string()))?;

        match step {
            Step::Text(text) => Ok(Reply::Text(text)),
            Step::ToolCall { name, arguments } => Ok(Reply::ToolCall(ToolCallRequest {
                id: format!("call_{call_index}"),
                name,
                raw_arguments: arguments,
            })),
            Step::EchoToolResult => {
                let result = request
                    .history
                    .iter()
                    .rev()
                    .find_map(|turn| match turn {
                        Turn::ToolResult { content, .. } => Some(content.clone()),
                        _ => None,
                    })
                    .unwrap_or_default();
                Ok(Reply::Text(format!("Here is what I found. {result}")))
            }
            Step::Fail => Err(Error::CompletionService("scripted failure".to_string())),
        }
    }
}

/// Tool that records every argument object it receives
pub struct RecordingTool {
    reply: String,
    pub calls: Mutex<Vec<Map<String, Value>>>,
}

impl RecordingTool {
    pub fn new(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.to_string(),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Descriptor accepting any argument object
    pub fn descriptor(name: &str) -> ToolDescriptor {
        ToolDescriptor {
            name: name.to_string(),
            description: format!("records calls to {name}"),
            parameters: serde_json::json!({ "type": "object" }),
        }
    }
}

#[async_trait]
impl ToolHandler for RecordingTool {
    async fn call(&self, arguments: &Map<String, Value>) -> Result<String> {
        self.calls.lock().unwrap().push(arguments.clone());
        Ok(self.reply.clone())
    }
}

/// Transcriber returning a fixed transcript, or failing when `None`
pub struct FakeTranscriber {
    transcript: Option<String>,
    pub calls: AtomicUsize,
}

impl FakeTranscriber {
    pub fn saying(text: &str) -> Arc<Self> {
        Arc::new(Self {
            transcript: Some(text.to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            transcript: None,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transcriber for FakeTranscriber {
    async fn transcribe(&self, _audio: &AudioBuffer) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.transcript
            .clone()
            .ok_or_else(|| Error::Transcription("scripted failure".to_string()))
    }
}

/// Synthesizer returning the text's bytes as "audio"
pub struct FakeSynthesizer {
    fail: bool,
    pub texts: Mutex<Vec<String>>,
}

impl FakeSynthesizer {
    pub fn working() -> Arc<Self> {
        Arc::new(Self {
            fail: false,
            texts: Mutex::new(Vec::new()),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            texts: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl Synthesizer for FakeSynthesizer {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        self.texts.lock().unwrap().push(text.to_string());
        if self.fail {
            return Err(Error::Synthesis("scripted failure".to_string()));
        }
        Ok(text.as_bytes().to_vec())
    }
}

/// Audio device with a canned recording and a log of played audio
pub struct FakeAudio {
    recording: Option<AudioBuffer>,
    fail_playback: bool,
    pub played: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl FakeAudio {
    /// Device whose microphone hears a 440 Hz tone
    pub fn speaking() -> Self {
        Self::with_recording(AudioBuffer::new(sine_samples(440.0, 0.25, 0.3, 24_000), 24_000))
    }

    pub fn with_recording(recording: AudioBuffer) -> Self {
        Self {
            recording: Some(recording),
            fail_playback: false,
            played: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Device whose microphone cannot be opened
    pub fn broken_microphone() -> Self {
        Self {
            recording: None,
            fail_playback: false,
            played: Arc::new(Mutex::new(Vec::new())),
        }
    }

    #[must_use]
    pub fn with_failing_playback(mut self) -> Self {
        self.fail_playback = true;
        self
    }
}

#[async_trait(?Send)]
impl AudioDevice for FakeAudio {
    async fn capture(&mut self) -> Result<AudioBuffer> {
        self.recording
            .clone()
            .ok_or_else(|| Error::Device("no input device available".to_string()))
    }

    async fn play(&mut self, audio: &[u8]) -> Result<()> {
        if self.fail_playback {
            return Err(Error::Device("no output device available".to_string()));
        }
        self.played.lock().unwrap().push(audio.to_vec());
        Ok(())
    }
}

/// Generate sine wave audio samples
pub fn sine_samples(frequency: f32, duration_secs: f32, amplitude: f32, sample_rate: u32) -> Vec<f32> {
    let num_samples = (sample_rate as f32 * duration_secs) as usize;
    (0..num_samples)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            amplitude * (2.0 * std::f32::consts::PI * frequency * t).sin()
        })
        .collect()
}
