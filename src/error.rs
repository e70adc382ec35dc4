//! Error types for pagevox
//!
//! Uses thiserror for the error taxonomy. Domain errors carry the message
//! that is spoken back to the user, so their `Display` output is the prompt.

use thiserror::Error;

/// Top-level error type for the pagevox application
#[derive(Error, Debug)]
pub enum PagevoxError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Language error: {0}")]
    Language(#[from] LanguageError),

    #[error("Page error: {0}")]
    Page(String),

    #[error("Speech output error: {0}")]
    Speech(#[from] SpeechError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Which end of the element collection was hit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    First,
    Last,
}

impl std::fmt::Display for Boundary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Boundary::First => write!(f, "first"),
            Boundary::Last => write!(f, "last"),
        }
    }
}

/// User-facing failures. The message is spoken when the failure happens
/// during a voice interaction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("There is not a current element to read")]
    NoCurrentElement,

    #[error("The current element is the {0}")]
    BoundaryReached(Boundary),

    #[error("There is not a current link to follow")]
    NoCurrentLink,

    #[error("The main content of this page cannot be found")]
    MainNotFound,

    #[error("Sorry, I could not find a match")]
    NoMatch,

    #[error("An error has occurred while recognizing your speech")]
    RecognitionFailure,

    #[error("Sorry, I could not recognize your speech")]
    NoSpeechRecognized,

    #[error("Sorry, the command was not recognized")]
    UnknownCommand,
}

/// Errors surfaced by interaction operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InteractionError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Aborted recognition or interrupted speech. Never spoken.
    #[error("Interaction cancelled")]
    Cancelled,

    #[error("Unexpected failure: {0}")]
    Unexpected(String),
}

impl InteractionError {
    /// True for the silent, cancellation-class failures
    pub fn is_cancellation(&self) -> bool {
        matches!(self, InteractionError::Cancelled)
    }
}

/// Errors reported by a speech output port
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpeechError {
    /// Speech was cancelled before it completed
    #[error("Speech interrupted")]
    Interrupted,

    #[error("Speech engine not available: {0}")]
    Unavailable(String),

    #[error("Speech synthesis failed: {0}")]
    Failed(String),
}

/// Errors reported by a speech input port
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecognitionError {
    /// The engine heard speech but could not match it
    #[error("No match")]
    NoMatch,

    /// The engine reported an error
    #[error("Recognition error: {0}")]
    Engine(String),

    /// The engine ended without producing a final result
    #[error("Recognition ended without a result")]
    NoResult,

    /// Recognition was aborted
    #[error("Recognition aborted")]
    Aborted,
}

/// Errors related to language packs
#[derive(Error, Debug)]
pub enum LanguageError {
    #[error("Failed to fetch translation '{path}': {reason}")]
    Fetch { path: String, reason: String },

    #[error("Invalid translation for '{lang}': {reason}")]
    Invalid { lang: String, reason: String },

    #[error("Invalid pattern '{pattern}' for {command}: {reason}")]
    Pattern {
        command: String,
        pattern: String,
        reason: String,
    },
}

impl From<SpeechError> for InteractionError {
    fn from(e: SpeechError) -> Self {
        match e {
            SpeechError::Interrupted => InteractionError::Cancelled,
            other => InteractionError::Unexpected(other.to_string()),
        }
    }
}

impl From<RecognitionError> for InteractionError {
    fn from(e: RecognitionError) -> Self {
        match e {
            RecognitionError::NoMatch => DomainError::NoMatch.into(),
            RecognitionError::Engine(_) => DomainError::RecognitionFailure.into(),
            RecognitionError::NoResult => DomainError::NoSpeechRecognized.into(),
            RecognitionError::Aborted => InteractionError::Cancelled,
        }
    }
}

/// Result type alias using PagevoxError
pub type Result<T> = std::result::Result<T, PagevoxError>;
