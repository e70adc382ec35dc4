//! Console speech backend
//!
//! Prompts are printed instead of spoken and commands are typed, one line
//! per recognition. Useful on machines without speech engines and for
//! scripting a session through a pipe.

use super::{Interrupt, Recognition, SpeechInput, SpeechOutput};
use crate::error::{RecognitionError, SpeechError};
use crate::events::{EventBus, InteractionEvent};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tokio::sync::Mutex;

/// Prints every prompt on stdout
#[derive(Debug, Default)]
pub struct ConsoleSpeaker;

impl ConsoleSpeaker {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl SpeechOutput for ConsoleSpeaker {
    async fn speak(&self, text: &str) -> Result<(), SpeechError> {
        println!("{}", text);
        Ok(())
    }

    fn cancel(&self) {}

    fn name(&self) -> &'static str {
        "console"
    }
}

type LineSource = Box<dyn AsyncBufRead + Send + Unpin>;

/// Reads typed commands, one line per recognition
pub struct ConsoleRecognizer {
    lines: Mutex<Lines<LineSource>>,
    events: EventBus,
    interrupt: Interrupt,
}

impl ConsoleRecognizer {
    /// Read commands from stdin
    pub fn new(events: EventBus) -> Self {
        Self::from_reader(BufReader::new(tokio::io::stdin()), events)
    }

    pub fn from_reader(reader: impl AsyncBufRead + Send + Unpin + 'static, events: EventBus) -> Self {
        let source: LineSource = Box::new(reader);
        Self {
            lines: Mutex::new(source.lines()),
            events,
            interrupt: Interrupt::new(),
        }
    }

    fn settle(&self, result: Result<Recognition, RecognitionError>) -> Result<Recognition, RecognitionError> {
        let event = match &result {
            Ok(recognition) => InteractionEvent::RecognitionResult {
                transcript: recognition.transcript.clone(),
                confidence: recognition.confidence,
            },
            Err(RecognitionError::NoMatch) => InteractionEvent::RecognitionNoMatch,
            Err(e) => InteractionEvent::RecognitionError {
                error: e.to_string(),
            },
        };
        self.events.emit(event);
        self.events.emit(InteractionEvent::RecognitionEnd);
        result
    }
}

#[async_trait::async_trait]
impl SpeechInput for ConsoleRecognizer {
    async fn recognize(&self) -> Result<Recognition, RecognitionError> {
        let mut aborted = self.interrupt.listen();
        self.events.emit(InteractionEvent::RecognitionStart);

        let mut lines = self.lines.lock().await;
        // next_line is cancel safe, a line typed after an abort is kept
        let read = tokio::select! {
            line = lines.next_line() => line,
            _ = aborted.changed() => return self.settle(Err(RecognitionError::Aborted)),
        };

        let result = match read {
            Ok(Some(line)) if line.trim().is_empty() => Err(RecognitionError::NoMatch),
            Ok(Some(line)) => Ok(Recognition::new(line.trim(), 1.0)),
            Ok(None) => {
                tracing::debug!("End of input");
                Err(RecognitionError::Aborted)
            }
            Err(e) => Err(RecognitionError::Engine(e.to_string())),
        };
        self.settle(result)
    }

    fn abort(&self) {
        self.interrupt.trigger();
    }

    fn name(&self) -> &'static str {
        "console"
    }
}
