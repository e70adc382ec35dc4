//! Speech through external commands
//!
//! `ProcessSpeaker` runs a text-to-speech command (espeak-ng by default) for
//! every prompt. `ProcessRecognizer` runs a speech-to-text command for every
//! recognition; the command listens, prints what it heard and exits.
//!
//! Recognizer output protocol:
//! - plain text on stdout: the transcript (confidence 1.0)
//! - a JSON object: `{"transcript": "read headers", "confidence": 0.87}`
//! - empty output with exit status 0: nothing matched
//! - non-zero exit status: engine error, stderr is reported
//!
//! Both kill their child process when cancelled, aborted or dropped.

use super::{render_args, Interrupt, Recognition, SpeechInput, SpeechOutput};
use crate::config::{RecognizerConfig, SpeakerConfig};
use crate::error::{PagevoxError, RecognitionError, SpeechError};
use crate::events::{EventBus, InteractionEvent};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::time::timeout;

/// JSON output accepted from recognizer commands
#[derive(Debug, Deserialize)]
struct RecognizerOutput {
    transcript: String,
    #[serde(default = "full_confidence")]
    confidence: f32,
}

fn full_confidence() -> f32 {
    1.0
}

/// Make sure an engine binary can be found before it is needed
fn ensure_available(command: &str) -> Result<(), SpeechError> {
    which::which(command)
        .map(|path| tracing::debug!("Found {} at {:?}", command, path))
        .map_err(|e| SpeechError::Unavailable(format!("{}: {}", command, e)))
}

/// Text-to-speech via an external command
pub struct ProcessSpeaker {
    command: String,
    args: Vec<String>,
    values: BTreeMap<String, String>,
    interrupt: Interrupt,
}

impl ProcessSpeaker {
    pub fn new(config: &SpeakerConfig) -> Result<Self, PagevoxError> {
        ensure_available(&config.command)?;

        let values = [
            ("lang".to_string(), config.lang.clone()),
            ("voice".to_string(), config.voice.clone()),
        ]
        .into_iter()
        .collect();

        Ok(Self {
            command: config.command.clone(),
            args: config.args.clone(),
            values,
            interrupt: Interrupt::new(),
        })
    }

    fn build_command(&self, text: &str) -> Command {
        let mut values = self.values.clone();
        values.insert("text".to_string(), text.to_string());

        let mut cmd = Command::new(&self.command);
        cmd.args(render_args(&self.args, &values))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait::async_trait]
impl SpeechOutput for ProcessSpeaker {
    async fn speak(&self, text: &str) -> Result<(), SpeechError> {
        let mut cancelled = self.interrupt.listen();

        tracing::debug!("Speaking: {:?}", text);
        let mut child = self
            .build_command(text)
            .spawn()
            .map_err(|e| SpeechError::Failed(format!("Failed to spawn {}: {}", self.command, e)))?;

        tokio::select! {
            status = child.wait() => match status {
                Ok(status) if status.success() => Ok(()),
                Ok(status) => Err(SpeechError::Failed(format!(
                    "{} exited with {}",
                    self.command, status
                ))),
                Err(e) => Err(SpeechError::Failed(e.to_string())),
            },
            _ = cancelled.changed() => {
                tracing::debug!("Speech cancelled");
                if let Err(e) = child.start_kill() {
                    tracing::warn!("Failed to stop {}: {}", self.command, e);
                }
                Err(SpeechError::Interrupted)
            }
        }
    }

    fn cancel(&self) {
        self.interrupt.trigger();
    }

    fn name(&self) -> &'static str {
        "process"
    }
}

/// Speech-to-text via an external command
pub struct ProcessRecognizer {
    command: String,
    args: Vec<String>,
    grace: Duration,
    events: EventBus,
    interrupt: Interrupt,
}

impl ProcessRecognizer {
    pub fn new(config: &RecognizerConfig, events: EventBus) -> Result<Self, PagevoxError> {
        let command = config.command.clone().ok_or_else(|| {
            PagevoxError::Config(
                "recognizer.command is required for the process backend".to_string(),
            )
        })?;
        ensure_available(&command)?;

        Ok(Self {
            command,
            args: render_args(&config.args, &config.template_values()),
            grace: Duration::from_millis(config.grace_ms),
            events,
            interrupt: Interrupt::new(),
        })
    }

    fn fail(&self, error: RecognitionError) -> RecognitionError {
        tracing::debug!("Recognition error: {}", error);
        let event = match error {
            RecognitionError::NoMatch => InteractionEvent::RecognitionNoMatch,
            ref other => InteractionEvent::RecognitionError {
                error: other.to_string(),
            },
        };
        self.events.emit(event);
        self.events.emit(InteractionEvent::RecognitionEnd);
        error
    }

    fn parse_output(&self, stdout: &str) -> Result<Recognition, RecognitionError> {
        let output = stdout.trim();
        if output.is_empty() {
            return Err(RecognitionError::NoMatch);
        }

        if output.starts_with('{') {
            let parsed: RecognizerOutput = serde_json::from_str(output).map_err(|e| {
                RecognitionError::Engine(format!("Invalid recognizer output: {}", e))
            })?;
            if parsed.transcript.trim().is_empty() {
                return Err(RecognitionError::NoMatch);
            }
            return Ok(Recognition::new(parsed.transcript.trim(), parsed.confidence));
        }

        Ok(Recognition::new(output, full_confidence()))
    }
}

#[async_trait::async_trait]
impl SpeechInput for ProcessRecognizer {
    async fn recognize(&self) -> Result<Recognition, RecognitionError> {
        let mut aborted = self.interrupt.listen();

        let mut child = Command::new(&self.command)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                self.fail(RecognitionError::Engine(format!(
                    "Failed to spawn {}: {}",
                    self.command, e
                )))
            })?;

        tracing::debug!("Recognition started");
        self.events.emit(InteractionEvent::RecognitionStart);

        let (Some(mut stdout), Some(mut stderr)) = (child.stdout.take(), child.stderr.take())
        else {
            return Err(self.fail(RecognitionError::Engine(
                "Recognizer output not available".to_string(),
            )));
        };

        let reading = async {
            let mut out = String::new();
            let mut err = String::new();
            let (out_read, err_read) = tokio::join!(
                stdout.read_to_string(&mut out),
                stderr.read_to_string(&mut err)
            );
            out_read?;
            err_read?;
            Ok::<_, std::io::Error>((out, err))
        };
        tokio::pin!(reading);

        let finished = tokio::select! {
            read = &mut reading => Some(read),
            _ = aborted.changed() => None,
        };

        let Some(read) = finished else {
            tracing::debug!("Recognition aborted, stopping {}", self.command);
            if let Err(e) = child.start_kill() {
                tracing::warn!("Failed to stop {}: {}", self.command, e);
            }
            if timeout(self.grace, child.wait()).await.is_err() {
                tracing::warn!(
                    "{} did not exit within {:?} after abort",
                    self.command,
                    self.grace
                );
            }
            return Err(self.fail(RecognitionError::Aborted));
        };

        let (out, err) = read.map_err(|e| self.fail(RecognitionError::Engine(e.to_string())))?;
        let status = child
            .wait()
            .await
            .map_err(|e| self.fail(RecognitionError::Engine(e.to_string())))?;

        if !status.success() {
            let reason = match err.trim() {
                "" => format!("{} exited with {}", self.command, status),
                stderr => stderr.to_string(),
            };
            return Err(self.fail(RecognitionError::Engine(reason)));
        }

        let recognition = self.parse_output(&out).map_err(|e| self.fail(e))?;

        tracing::debug!(
            "Recognized {:?} with a confidence of {}",
            recognition.transcript,
            recognition.confidence
        );
        self.events.emit(InteractionEvent::RecognitionResult {
            transcript: recognition.transcript.clone(),
            confidence: recognition.confidence,
        });
        self.events.emit(InteractionEvent::RecognitionEnd);

        Ok(recognition)
    }

    fn abort(&self) {
        self.interrupt.trigger();
    }

    fn name(&self) -> &'static str {
        "process"
    }
}
