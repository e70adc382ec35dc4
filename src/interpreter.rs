//! Command interpretation
//!
//! Turns a recognized transcript into a [`VoiceCommand`] using the active
//! language pack. Interpretation never fails: text that matches no pattern
//! becomes [`VoiceCommand::Unrecognized`], which the router reports to the
//! user.

use crate::language::{CommandKind, CommandMatch, LanguagePack};
use crate::page::{HeaderFilter, LinkFilter};

/// A structured voice command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceCommand {
    ReadHeaders { level: Option<u8> },
    ReadLinks { ancestor: Option<String> },
    ReadCurrentElement,
    ReadNextElement,
    ReadPreviousElement,
    GoToLink,
    ReadMain,
    SearchMain,
    ReadPageTitle,
    ReadPageSummary,
    GoToPreviousPage,
    GoToNextPage,
    GoToHomepage,
    Unrecognized { transcript: String },
}

impl VoiceCommand {
    /// Header filter for `ReadHeaders`
    pub fn header_filter(&self) -> HeaderFilter {
        match self {
            VoiceCommand::ReadHeaders { level } => HeaderFilter { level: *level },
            _ => HeaderFilter::default(),
        }
    }

    /// Link filter for `ReadLinks`
    pub fn link_filter(&self) -> LinkFilter {
        match self {
            VoiceCommand::ReadLinks { ancestor } => LinkFilter {
                ancestor: ancestor.clone(),
            },
            _ => LinkFilter::default(),
        }
    }

    fn from_match(found: CommandMatch) -> Self {
        match found.kind {
            CommandKind::ReadHeaders => VoiceCommand::ReadHeaders { level: found.level },
            CommandKind::ReadLinks => VoiceCommand::ReadLinks {
                ancestor: found.ancestor,
            },
            CommandKind::ReadCurrentElement => VoiceCommand::ReadCurrentElement,
            CommandKind::ReadNextElement => VoiceCommand::ReadNextElement,
            CommandKind::ReadPreviousElement => VoiceCommand::ReadPreviousElement,
            CommandKind::GoToLink => VoiceCommand::GoToLink,
            CommandKind::ReadMain => VoiceCommand::ReadMain,
            CommandKind::SearchMain => VoiceCommand::SearchMain,
            CommandKind::ReadPageTitle => VoiceCommand::ReadPageTitle,
            CommandKind::ReadPageSummary => VoiceCommand::ReadPageSummary,
            CommandKind::GoToPreviousPage => VoiceCommand::GoToPreviousPage,
            CommandKind::GoToNextPage => VoiceCommand::GoToNextPage,
            CommandKind::GoToHomepage => VoiceCommand::GoToHomepage,
        }
    }
}

impl std::fmt::Display for VoiceCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VoiceCommand::ReadHeaders { level: Some(level) } => {
                write!(f, "read level {} headers", level)
            }
            VoiceCommand::ReadHeaders { level: None } => write!(f, "read headers"),
            VoiceCommand::ReadLinks {
                ancestor: Some(ancestor),
            } => write!(f, "read links in {}", ancestor),
            VoiceCommand::ReadLinks { ancestor: None } => write!(f, "read links"),
            VoiceCommand::ReadCurrentElement => write!(f, "read current element"),
            VoiceCommand::ReadNextElement => write!(f, "read next element"),
            VoiceCommand::ReadPreviousElement => write!(f, "read previous element"),
            VoiceCommand::GoToLink => write!(f, "go to link"),
            VoiceCommand::ReadMain => write!(f, "read main content"),
            VoiceCommand::SearchMain => write!(f, "search main content"),
            VoiceCommand::ReadPageTitle => write!(f, "read page title"),
            VoiceCommand::ReadPageSummary => write!(f, "read page summary"),
            VoiceCommand::GoToPreviousPage => write!(f, "go to previous page"),
            VoiceCommand::GoToNextPage => write!(f, "go to next page"),
            VoiceCommand::GoToHomepage => write!(f, "go to homepage"),
            VoiceCommand::Unrecognized { transcript } => write!(f, "unrecognized {:?}", transcript),
        }
    }
}

/// Normalize a transcript before matching
///
/// Lower-cases, trims, drops trailing punctuation added by recognizers and
/// collapses runs of whitespace.
pub fn normalize(transcript: &str) -> String {
    transcript
        .trim()
        .trim_end_matches(['.', '!', '?', ','])
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Resolve a transcript to a command
pub fn interpret(transcript: &str, pack: &LanguagePack) -> VoiceCommand {
    let text = normalize(transcript);
    match pack.find(&text) {
        Some(found) => {
            let command = VoiceCommand::from_match(found);
            tracing::debug!("Interpreted {:?} as {}", transcript, command);
            command
        }
        None => {
            tracing::debug!("No command matches {:?} in {}", transcript, pack.lang());
            VoiceCommand::Unrecognized {
                transcript: transcript.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  Read   Headers. "), "read headers");
        assert_eq!(normalize("Next!"), "next");
        assert_eq!(normalize("What is the title?"), "what is the title");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_interpret_simple_commands() {
        let pack = LanguagePack::builtin();
        assert_eq!(interpret("Next.", &pack), VoiceCommand::ReadNextElement);
        assert_eq!(interpret("previous", &pack), VoiceCommand::ReadPreviousElement);
        assert_eq!(interpret("Go home", &pack), VoiceCommand::GoToHomepage);
        assert_eq!(interpret("go back", &pack), VoiceCommand::GoToPreviousPage);
        assert_eq!(interpret("Read the main content", &pack), VoiceCommand::ReadMain);
    }

    #[test]
    fn test_interpret_headers() {
        let pack = LanguagePack::builtin();
        assert_eq!(
            interpret("Read headers", &pack),
            VoiceCommand::ReadHeaders { level: None }
        );
        assert_eq!(
            interpret("read level two headings", &pack),
            VoiceCommand::ReadHeaders { level: Some(2) }
        );
    }

    #[test]
    fn test_interpret_links() {
        let pack = LanguagePack::builtin();
        assert_eq!(
            interpret("read links", &pack),
            VoiceCommand::ReadLinks { ancestor: None }
        );
        let command = interpret("Read links in the footer", &pack);
        assert_eq!(
            command,
            VoiceCommand::ReadLinks {
                ancestor: Some("footer".into())
            }
        );
        assert_eq!(command.link_filter(), LinkFilter::within("footer"));
    }

    #[test]
    fn test_unrecognized_keeps_transcript() {
        let pack = LanguagePack::builtin();
        assert_eq!(
            interpret("Make me a sandwich", &pack),
            VoiceCommand::Unrecognized {
                transcript: "Make me a sandwich".into()
            }
        );
    }

    #[test]
    fn test_filters() {
        let command = VoiceCommand::ReadHeaders { level: Some(3) };
        assert_eq!(command.header_filter(), HeaderFilter::level(3));
        assert_eq!(VoiceCommand::ReadMain.header_filter(), HeaderFilter::default());
    }

    #[test]
    fn test_display() {
        assert_eq!(
            VoiceCommand::ReadHeaders { level: Some(2) }.to_string(),
            "read level 2 headers"
        );
        assert_eq!(VoiceCommand::GoToLink.to_string(), "go to link");
    }
}
