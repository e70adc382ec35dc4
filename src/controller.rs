//! Interaction controller
//!
//! Owns the session state and drives one voice cycle at a time:
//! "Ready" → recognize → interpret → route → speak.
//!
//! Every navigation operation can also be called directly. Direct callers
//! receive domain errors as values; only the voice cycle turns them into
//! speech.
//!
//! Stopping is cooperative. `stop_command()` flips the interaction flag,
//! forwards abort/cancel to the speech ports and bumps a stop generation.
//! Every pending speech, recognition or pause observes the new generation
//! and settles through the cancellation path.

use crate::config::Config;
use crate::error::{DomainError, InteractionError};
use crate::events::{EventBus, InteractionEvent};
use crate::interpreter::{interpret, VoiceCommand};
use crate::language::LanguageStore;
use crate::page::{BlurAction, ContentElement, ContentLocator, HeaderFilter, LinkFilter, PageActions};
use crate::router;
use crate::speech::{SpeechInput, SpeechOutput};
use crate::state::SessionState;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::watch;

/// Prompt spoken when the controller starts listening
pub const READY_PROMPT: &str = "Ready";

/// Spoken when a cycle fails for a reason the user cannot act on
pub const GENERIC_FAILURE: &str = "Sorry, I could not recognize the command";

/// Collaborators used by the controller
#[derive(Clone)]
pub struct Ports {
    pub speaker: Arc<dyn SpeechOutput>,
    pub recognizer: Arc<dyn SpeechInput>,
    pub locator: Arc<dyn ContentLocator>,
    pub page: Arc<dyn PageActions>,
}

/// How a voice cycle ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The command ran to completion
    Completed,
    /// A domain error; its message was spoken
    Failed(String),
    /// Stopped or aborted; nothing was spoken
    Cancelled,
    /// Unexpected failure; the session was reset
    Aborted(String),
}

/// Voice-driven page reader
pub struct Controller {
    config: Config,
    delay: Option<Duration>,
    speaker: Arc<dyn SpeechOutput>,
    recognizer: Arc<dyn SpeechInput>,
    locator: Arc<dyn ContentLocator>,
    page: Arc<dyn PageActions>,
    languages: LanguageStore,
    events: EventBus,
    state: Mutex<SessionState>,
    stop: watch::Sender<u64>,
}

impl Controller {
    pub fn new(config: Config, ports: Ports, events: EventBus) -> Self {
        let (stop, _) = watch::channel(0);
        Self {
            delay: config.delay(),
            config,
            speaker: ports.speaker,
            recognizer: ports.recognizer,
            locator: ports.locator,
            page: ports.page,
            languages: LanguageStore::new(),
            events,
            state: Mutex::new(SessionState::new()),
            stop,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn languages(&self) -> &LanguageStore {
        &self.languages
    }

    /// Whether a voice cycle is running
    pub fn is_interacting(&self) -> bool {
        self.state().is_interacting
    }

    pub fn cursor(&self) -> Option<usize> {
        self.state().cursor
    }

    /// Size of the last traversed collection
    pub fn element_count(&self) -> usize {
        self.state().element_count()
    }

    pub fn current_element(&self) -> Option<ContentElement> {
        self.state().current_element().cloned()
    }

    /// Copy of the session state
    pub fn session(&self) -> SessionState {
        self.state().clone()
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn stop_listener(&self) -> watch::Receiver<u64> {
        self.stop.subscribe()
    }

    /// Run one voice cycle
    ///
    /// The interaction flag is set and `interactionstart` emitted before
    /// this returns, so callers observe the new state before polling. The
    /// flag is cleared and `interactionend` emitted on every exit, including
    /// when the future is dropped.
    ///
    /// Do not call while a cycle is already running.
    pub fn receive_command(&self) -> impl Future<Output = Outcome> + Send + '_ {
        let guard = InteractionGuard::begin(self);
        let mut stop = self.stop_listener();

        async move {
            let _guard = guard;
            let result = self.voice_cycle(&mut stop).await;
            self.settle(result, &mut stop).await
        }
    }

    async fn voice_cycle(&self, stop: &mut watch::Receiver<u64>) -> Result<(), InteractionError> {
        until_stopped(stop, self.speaker.speak(READY_PROMPT)).await?;

        let recognition = until_stopped(stop, self.recognizer.recognize()).await?;

        let pack = self.languages.resolve(self.config.language());
        let command = interpret(&recognition.transcript, &pack);

        until_stopped(stop, router::route(self, command)).await
    }

    async fn settle(
        &self,
        result: Result<(), InteractionError>,
        stop: &mut watch::Receiver<u64>,
    ) -> Outcome {
        match result {
            Ok(()) => Outcome::Completed,
            Err(InteractionError::Domain(error)) => {
                let message = error.to_string();
                tracing::debug!("Command failed: {}", message);
                self.speak_feedback(stop, &message).await;
                Outcome::Failed(message)
            }
            Err(InteractionError::Cancelled) => {
                tracing::debug!("Interaction cancelled");
                Outcome::Cancelled
            }
            Err(InteractionError::Unexpected(reason)) => {
                tracing::error!("An error occurred: {}", reason);
                {
                    let mut state = self.state();
                    let interacting = state.is_interacting;
                    state.reset();
                    state.is_interacting = interacting;
                }
                self.speak_feedback(stop, GENERIC_FAILURE).await;
                Outcome::Aborted(reason)
            }
        }
    }

    async fn speak_feedback(&self, stop: &mut watch::Receiver<u64>, text: &str) {
        if let Err(e) = until_stopped(stop, self.speaker.speak(text)).await {
            tracing::debug!("Feedback not spoken: {}", e);
        }
    }

    /// Stop the running cycle
    ///
    /// The flag is cleared immediately; pending operations settle afterwards
    /// as cancelled.
    pub fn stop_command(&self) {
        self.recognizer.abort();
        self.speaker.cancel();
        self.state().is_interacting = false;
        self.stop.send_modify(|generation| *generation += 1);
        tracing::debug!("Interaction stopped");
    }

    /// Shortcut behaviour: stop when interacting, start a cycle otherwise
    ///
    /// Returns the new cycle when one was started.
    pub fn toggle_interaction(&self) -> Option<impl Future<Output = Outcome> + Send + '_> {
        if self.is_interacting() {
            if let Some(element) = self.current_element() {
                self.page.unhighlight(&element);
            }
            self.stop_command();
            None
        } else {
            Some(self.receive_command())
        }
    }

    /// Load the configured language unless it is already available
    ///
    /// The result is announced both as an event and as speech.
    pub async fn load_language(&self) -> Result<(), InteractionError> {
        let lang = self.config.language().to_string();
        if lang.is_empty() || self.languages.is_loaded(&lang) {
            return Ok(());
        }

        let mut stop = self.stop_listener();
        match self
            .languages
            .load(&self.config.translations_path, &lang)
            .await
        {
            Ok(_) => {
                let message = format!("Language \"{}\" successfully loaded", lang);
                tracing::debug!("{}", message);
                self.events
                    .emit(InteractionEvent::LanguageDownloadSuccess { lang: lang.clone() });
                self.say(&mut stop, &message).await
            }
            Err(e) => {
                tracing::debug!("{}", e);
                self.events
                    .emit(InteractionEvent::LanguageDownloadError { lang: lang.clone() });
                let message = format!("An error occurred: the language \"{}\" was not loaded", lang);
                self.say(&mut stop, &message).await
            }
        }
    }

    /// Read the headers of the page, optionally of one level only
    ///
    /// Unfiltered reads announce the tag after the text ("Intro H1").
    pub async fn read_headers(&self, filter: HeaderFilter) -> Result<(), InteractionError> {
        let mut stop = self.stop_listener();
        let headers = self.locator.headers(&filter);
        tracing::debug!("Reading {} headers", headers.len());

        self.state().replace_elements(headers.clone());

        for (index, header) in headers.iter().enumerate() {
            self.state().cursor = Some(index);

            let text = match filter.level {
                Some(_) => header.text().to_string(),
                None => format!("{} {}", header.text(), header.tag()),
            };
            {
                let _highlight = Highlight::new(self.page.as_ref(), header.clone());
                self.say(&mut stop, &text).await?;
            }
            self.pause(&mut stop).await?;
        }
        Ok(())
    }

    /// Read the links of the page, optionally inside one region only
    pub async fn read_links(&self, filter: LinkFilter) -> Result<(), InteractionError> {
        let mut stop = self.stop_listener();
        let links = self.locator.links(&filter);
        tracing::debug!("Reading {} links", links.len());

        let count = links.len();
        self.state().replace_elements(links);

        for index in 0..count {
            self.state().cursor = Some(index);
            self.read_current(&mut stop).await?;
            self.pause(&mut stop).await?;
        }
        Ok(())
    }

    /// Read the element under the cursor
    pub async fn read_current_element(&self) -> Result<(), InteractionError> {
        let mut stop = self.stop_listener();
        self.read_current(&mut stop).await
    }

    pub async fn read_previous_element(&self) -> Result<(), InteractionError> {
        let mut stop = self.stop_listener();
        self.state().move_previous()?;
        self.read_current(&mut stop).await
    }

    pub async fn read_next_element(&self) -> Result<(), InteractionError> {
        let mut stop = self.stop_listener();
        self.state().move_next()?;
        self.read_current(&mut stop).await
    }

    async fn read_current(&self, stop: &mut watch::Receiver<u64>) -> Result<(), InteractionError> {
        let element = self.state().require_current()?.clone();
        let highlight = Highlight::new(self.page.as_ref(), element);
        self.say(stop, highlight.element.text()).await
    }

    /// Follow the current element when it is a link
    pub fn go_to_link(&self) -> Result<(), DomainError> {
        let href = self
            .current_element()
            .filter(ContentElement::is_link)
            .and_then(|element| element.href().map(str::to_string))
            .ok_or(DomainError::NoCurrentLink)?;

        tracing::debug!("Following link to {}", href);
        self.page.navigate(&href);
        Ok(())
    }

    /// Read the main content of the page
    pub async fn read_main(&self) -> Result<(), InteractionError> {
        let mut stop = self.stop_listener();

        let Some(main) = self.locator.main() else {
            let mut state = self.state();
            state.replace_elements(Vec::new());
            state.cursor = Some(0);
            return Err(DomainError::MainNotFound.into());
        };

        {
            let mut state = self.state();
            state.replace_elements(vec![main.clone()]);
            state.cursor = Some(0);
        }
        self.say(&mut stop, main.text()).await
    }

    /// Move keyboard focus to the main content
    ///
    /// The main element gets a tab index of -1 while focused; the previous
    /// value comes back on blur.
    pub fn search_main(&self) -> Result<(), DomainError> {
        let main = self.locator.main().ok_or(DomainError::MainNotFound)?;

        let previous = self.page.tab_index(&main);
        self.page.set_tab_index(&main, Some(-1));
        self.page.focus(&main, BlurAction::RestoreTabIndex(previous));
        Ok(())
    }

    pub async fn read_page_title(&self) -> Result<(), InteractionError> {
        let mut stop = self.stop_listener();
        let text = match self.locator.title() {
            Some(title) => format!("The title of the page is {}", title),
            None => "This page does not have a title".to_string(),
        };
        self.say(&mut stop, &text).await
    }

    /// Announce how many headers and links the page has
    pub async fn read_page_summary(&self) -> Result<(), InteractionError> {
        let mut stop = self.stop_listener();
        let headers = self.locator.headers(&HeaderFilter::default()).len();
        let links = self.locator.links(&LinkFilter::default()).len();
        let text = format!(
            "The page contains {} headers and {} links",
            headers, links
        );
        self.say(&mut stop, &text).await
    }

    pub fn go_to_previous_page(&self) {
        self.page.history_back();
    }

    pub fn go_to_next_page(&self) {
        self.page.history_forward();
    }

    pub fn go_to_homepage(&self) {
        self.page.navigate("/");
    }

    /// Run a command without listening first
    pub async fn execute(&self, command: VoiceCommand) -> Result<(), InteractionError> {
        router::route(self, command).await
    }

    async fn say(&self, stop: &mut watch::Receiver<u64>, text: &str) -> Result<(), InteractionError> {
        until_stopped(stop, self.speaker.speak(text)).await
    }

    async fn pause(&self, stop: &mut watch::Receiver<u64>) -> Result<(), InteractionError> {
        let Some(delay) = self.delay else {
            return Ok(());
        };
        until_stopped(stop, async {
            tokio::time::sleep(delay).await;
            Ok::<_, InteractionError>(())
        })
        .await
    }
}

/// Await `operation` unless a stop is requested first
async fn until_stopped<T, E>(
    stop: &mut watch::Receiver<u64>,
    operation: impl Future<Output = Result<T, E>>,
) -> Result<T, InteractionError>
where
    InteractionError: From<E>,
{
    tokio::select! {
        biased;
        _ = stop.changed() => Err(InteractionError::Cancelled),
        result = operation => result.map_err(InteractionError::from),
    }
}

/// Marks the session as interacting for its lifetime
struct InteractionGuard<'a> {
    controller: &'a Controller,
}

impl<'a> InteractionGuard<'a> {
    fn begin(controller: &'a Controller) -> Self {
        controller.state().is_interacting = true;
        tracing::debug!("Interaction started");
        controller.events.emit(InteractionEvent::InteractionStart);
        Self { controller }
    }
}

impl Drop for InteractionGuard<'_> {
    fn drop(&mut self) {
        self.controller.state().is_interacting = false;
        tracing::debug!("Interaction completed");
        self.controller.events.emit(InteractionEvent::InteractionEnd);
    }
}

/// Keeps an element highlighted for its lifetime
struct Highlight<'a> {
    page: &'a dyn PageActions,
    element: ContentElement,
}

impl<'a> Highlight<'a> {
    fn new(page: &'a dyn PageActions, element: ContentElement) -> Self {
        page.highlight(&element);
        Self { page, element }
    }
}

impl Drop for Highlight<'_> {
    fn drop(&mut self) {
        self.page.unhighlight(&self.element);
    }
}
