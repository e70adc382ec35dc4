//! Speech ports
//!
//! The controller talks to speech engines through two traits:
//! - [`SpeechOutput`] vocalizes text and can be cancelled
//! - [`SpeechInput`] captures one spoken command and can be aborted
//!
//! Both contracts require that a pending call always settles: after
//! `cancel()` a pending `speak()` fails with `SpeechError::Interrupted`,
//! after `abort()` a pending `recognize()` fails with
//! `RecognitionError::Aborted` within a bounded grace period.
//!
//! Backends:
//! - process: external TTS/STT commands (espeak-ng, a local STT tool, ...)
//! - console: stdout prompts and typed commands, for terminals and testing

pub mod console;
pub mod process;

use crate::config::{Config, RecognizerBackend, SpeakerBackend};
use crate::error::{PagevoxError, RecognitionError, SpeechError};
use crate::events::EventBus;
use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};
use tokio::sync::watch;

/// Final result of one recognition
#[derive(Debug, Clone, PartialEq)]
pub struct Recognition {
    pub transcript: String,
    pub confidence: f32,
}

impl Recognition {
    pub fn new(transcript: impl Into<String>, confidence: f32) -> Self {
        Self {
            transcript: transcript.into(),
            confidence,
        }
    }
}

/// Trait for text-to-speech implementations
#[async_trait::async_trait]
pub trait SpeechOutput: Send + Sync {
    /// Vocalize text, resolving once speech has completed
    async fn speak(&self, text: &str) -> Result<(), SpeechError>;

    /// Stop any in-flight speech
    fn cancel(&self);

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}

/// Trait for speech-to-text implementations
#[async_trait::async_trait]
pub trait SpeechInput: Send + Sync {
    /// Listen for one command and return its final transcript
    async fn recognize(&self) -> Result<Recognition, RecognitionError>;

    /// Request early termination of a pending recognition
    fn abort(&self);

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}

/// Generation counter used to interrupt pending port calls
///
/// Each call snapshots the generation when it starts; `trigger()` bumps it,
/// which wakes every call started before.
#[derive(Debug)]
pub(crate) struct Interrupt {
    sender: watch::Sender<u64>,
}

impl Interrupt {
    pub(crate) fn new() -> Self {
        let (sender, _) = watch::channel(0);
        Self { sender }
    }

    pub(crate) fn trigger(&self) {
        self.sender.send_modify(|generation| *generation += 1);
    }

    /// Receiver that resolves `changed()` on the next trigger
    pub(crate) fn listen(&self) -> watch::Receiver<u64> {
        self.sender.subscribe()
    }
}

impl Default for Interrupt {
    fn default() -> Self {
        Self::new()
    }
}

/// Substitute `{key}` placeholders in command arguments
///
/// Substituted values are not scanned again, so spoken text containing
/// braces is passed through untouched. Unknown keys are left as they are.
pub(crate) fn render_args(args: &[String], values: &BTreeMap<String, String>) -> Vec<String> {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    let placeholder =
        PLACEHOLDER.get_or_init(|| Regex::new(r"\{([A-Za-z0-9_]+)\}").expect("valid regex"));

    args.iter()
        .map(|arg| {
            placeholder
                .replace_all(arg, |caps: &Captures| match values.get(&caps[1]) {
                    Some(value) => value.clone(),
                    None => caps[0].to_string(),
                })
                .into_owned()
        })
        .collect()
}

/// Factory function for the configured speech output
pub fn create_speaker(config: &Config) -> Result<Arc<dyn SpeechOutput>, PagevoxError> {
    match config.speaker.backend {
        SpeakerBackend::Process => {
            let speaker = process::ProcessSpeaker::new(&config.speaker)?;
            tracing::debug!("Speech output via {}", config.speaker.command);
            Ok(Arc::new(speaker))
        }
        SpeakerBackend::Console => Ok(Arc::new(console::ConsoleSpeaker::new())),
    }
}

/// Factory function for the configured speech input
pub fn create_recognizer(
    config: &Config,
    events: &EventBus,
) -> Result<Arc<dyn SpeechInput>, PagevoxError> {
    match config.recognizer.backend {
        RecognizerBackend::Process => {
            let recognizer = process::ProcessRecognizer::new(&config.recognizer, events.clone())?;
            Ok(Arc::new(recognizer))
        }
        RecognizerBackend::Console => Ok(Arc::new(console::ConsoleRecognizer::new(
            events.clone(),
        ))),
    }
}
