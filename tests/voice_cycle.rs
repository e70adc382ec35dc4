//! Voice cycle integration tests over a page snapshot fixture
//!
//! Commands are typed into the console recognizer and prompts are recorded
//! instead of spoken, so a whole session runs without speech engines.

use pagevox::config::Config;
use pagevox::controller::{Controller, Outcome, Ports, READY_PROMPT};
use pagevox::error::SpeechError;
use pagevox::events::{EventBus, InteractionEvent};
use pagevox::page::SnapshotPage;
use pagevox::speech::console::ConsoleRecognizer;
use pagevox::speech::SpeechOutput;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Path to the page fixture
fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/page.json")
}

/// Speech output that records prompts
#[derive(Default)]
struct RecordingSpeaker {
    spoken: Mutex<Vec<String>>,
}

impl RecordingSpeaker {
    /// Everything spoken except the "Ready" prompts
    fn answers(&self) -> Vec<String> {
        self.spoken
            .lock()
            .unwrap()
            .iter()
            .filter(|text| text.as_str() != READY_PROMPT)
            .cloned()
            .collect()
    }
}

#[async_trait::async_trait]
impl SpeechOutput for RecordingSpeaker {
    async fn speak(&self, text: &str) -> Result<(), SpeechError> {
        self.spoken.lock().unwrap().push(text.to_string());
        Ok(())
    }

    fn cancel(&self) {}

    fn name(&self) -> &'static str {
        "recording"
    }
}

struct Session {
    controller: Controller,
    speaker: Arc<RecordingSpeaker>,
    page: Arc<SnapshotPage>,
}

impl Session {
    /// Session answering the given typed commands, one per line
    fn typing(commands: &'static str) -> Self {
        let events = EventBus::new();
        let recognizer = ConsoleRecognizer::from_reader(commands.as_bytes(), events.clone());
        Self::with_recognizer(recognizer, events)
    }

    fn with_recognizer(recognizer: ConsoleRecognizer, events: EventBus) -> Self {
        let page = Arc::new(SnapshotPage::load(&fixture_path()).unwrap());
        let speaker = Arc::new(RecordingSpeaker::default());
        let config = Config {
            delay_ms: 0,
            ..Config::default()
        };
        let ports = Ports {
            speaker: speaker.clone(),
            recognizer: Arc::new(recognizer),
            locator: page.clone(),
            page: page.clone(),
        };
        Session {
            controller: Controller::new(config, ports, events),
            speaker,
            page,
        }
    }

    async fn run(&self, cycles: usize) -> Vec<Outcome> {
        let mut outcomes = Vec::new();
        for _ in 0..cycles {
            outcomes.push(self.controller.receive_command().await);
        }
        outcomes
    }
}

// ============================================================================
// Sequential reading
// ============================================================================

#[tokio::test]
async fn headers_then_previous_and_next() {
    let session = Session::typing("read headers\nprevious\nprevious\nnext\nnext\nnext\n");

    let outcomes = session.run(6).await;

    assert_eq!(
        session.speaker.answers(),
        vec![
            "Intro H1",
            "Details H2",
            "Contact H2",
            "Details",
            "Intro",
            "Details",
            "Contact",
            "The current element is the last",
        ]
    );
    assert_eq!(outcomes[0], Outcome::Completed);
    assert_eq!(
        outcomes[5],
        Outcome::Failed("The current element is the last".into())
    );
    assert_eq!(session.controller.cursor(), Some(2));
    assert!(session.page.highlighted().is_empty());
}

#[tokio::test]
async fn level_filtered_headers() {
    let session = Session::typing("read level two headings\n");

    session.run(1).await;

    assert_eq!(session.speaker.answers(), vec!["Details", "Contact"]);
}

#[tokio::test]
async fn next_without_elements() {
    let session = Session::typing("Next.\n");

    let outcomes = session.run(1).await;

    assert_eq!(
        outcomes,
        vec![Outcome::Failed("There is not a current element to read".into())]
    );
    assert_eq!(
        session.speaker.answers(),
        vec!["There is not a current element to read"]
    );
    assert!(!session.controller.is_interacting());
}

// ============================================================================
// Links and navigation
// ============================================================================

#[tokio::test]
async fn follow_link_in_navigation() {
    let session = Session::typing("read links in the navigation\nfollow link\ngo back\ngo forward\n");

    session.run(2).await;
    assert_eq!(session.speaker.answers(), vec!["Home", "Articles"]);
    assert_eq!(session.page.location(), "/articles");

    session.run(1).await;
    assert_eq!(session.page.location(), "https://example.org/articles/voice");

    session.run(1).await;
    assert_eq!(session.page.location(), "/articles");
}

#[tokio::test]
async fn follow_link_on_a_header() {
    let session = Session::typing("read h1\nfollow link\n");

    let outcomes = session.run(2).await;

    assert_eq!(
        outcomes[1],
        Outcome::Failed("There is not a current link to follow".into())
    );
    assert_eq!(session.page.location(), "https://example.org/articles/voice");
}

#[tokio::test]
async fn go_home() {
    let session = Session::typing("go home\n");

    session.run(1).await;

    assert_eq!(session.page.location(), "/");
    assert!(session.speaker.answers().is_empty());
}

// ============================================================================
// Main content, title and summary
// ============================================================================

#[tokio::test]
async fn read_and_focus_main_content() {
    let session = Session::typing("read main content\nskip to main content\n");

    session.run(2).await;

    assert_eq!(
        session.speaker.answers(),
        vec!["Voice navigation lets you explore a page without a screen."]
    );
    assert_eq!(session.page.focused(), Some(4));
    assert_eq!(session.page.current_tab_index(4), Some(-1));

    session.page.blur();
    assert_eq!(session.page.current_tab_index(4), Some(0));
}

#[tokio::test]
async fn title_and_summary() {
    let session = Session::typing("what is the title\nsummary\n");

    session.run(2).await;

    assert_eq!(
        session.speaker.answers(),
        vec![
            "The title of the page is Reading the web by voice",
            "The page contains 3 headers and 4 links",
        ]
    );
}

#[tokio::test]
async fn unknown_phrase() {
    let session = Session::typing("open the pod bay doors\n\n");

    let outcomes = session.run(2).await;

    assert_eq!(
        session.speaker.answers(),
        vec![
            "Sorry, the command was not recognized",
            "Sorry, I could not find a match",
        ]
    );
    assert!(matches!(outcomes[1], Outcome::Failed(_)));
}

// ============================================================================
// Lifecycle
// ============================================================================

#[tokio::test]
async fn events_of_a_completed_cycle() {
    let session = Session::typing("read page title\n");
    let mut events = session.controller.events().subscribe();

    session.run(1).await;

    let mut names = Vec::new();
    while let Ok(event) = events.try_recv() {
        names.push(event.name());
    }
    assert_eq!(
        names,
        vec![
            "interactionstart",
            "recognitionstart",
            "recognitionresult",
            "recognitionend",
            "interactionend",
        ]
    );
}

#[tokio::test]
async fn end_of_input_is_silent() {
    let session = Session::typing("");

    let outcomes = session.run(1).await;

    assert_eq!(outcomes, vec![Outcome::Cancelled]);
    assert!(session.speaker.answers().is_empty());
}

#[tokio::test]
async fn stop_while_listening() {
    let (_writer, reader) = tokio::io::duplex(64);
    let events = EventBus::new();
    let recognizer =
        ConsoleRecognizer::from_reader(tokio::io::BufReader::new(reader), events.clone());
    let session = Session::with_recognizer(recognizer, events);
    let mut rx = session.controller.events().subscribe();

    let cycle = session.controller.receive_command();
    assert!(session.controller.is_interacting());

    let stopper = async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        session.controller.stop_command();
        assert!(!session.controller.is_interacting());
    };
    let (outcome, ()) = tokio::join!(cycle, stopper);

    assert_eq!(outcome, Outcome::Cancelled);
    assert!(session.speaker.answers().is_empty());

    let mut last = None;
    while let Ok(event) = rx.try_recv() {
        last = Some(event);
    }
    assert_eq!(last, Some(InteractionEvent::InteractionEnd));
}
