//! Pagevox - voice-driven page navigation
//!
//! Run `pagevox listen <page.json>` to navigate a page by voice.
//! Use `pagevox read <page.json> <action>` to run one command directly.
//! Use `pagevox interpret <phrase>` to check how a phrase is understood.

use anyhow::Context;
use clap::Parser;
use pagevox::cli::{Cli, Commands, ReadAction};
use pagevox::config::{self, Config, SpeakerBackend};
use pagevox::events::EventBus;
use pagevox::interpreter::{self, VoiceCommand};
use pagevox::language::LanguageStore;
use pagevox::page::SnapshotPage;
use pagevox::{speech, Controller, Outcome, Ports};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("pagevox={},warn", log_level))),
        )
        .with_target(false)
        .init();

    // Load configuration
    let mut config = config::load_config(cli.config.as_deref())?;

    // Apply CLI overrides
    if let Some(delay) = cli.delay {
        config.delay_ms = delay;
    }
    if let Some(lang) = cli.lang {
        config.recognizer.lang = lang.clone();
        config.speaker.lang = lang;
    }
    if let Some(path) = cli.translations {
        config.translations_path = path;
    }
    if cli.console {
        config.speaker.backend = SpeakerBackend::Console;
    }

    match cli.command {
        Commands::Listen { page, once } => {
            listen(config, &page, once, cli.events).await?;
        }

        Commands::Read { page, action } => {
            read(config, &page, action, cli.events).await?;
        }

        Commands::Interpret { text } => {
            interpret_phrase(&config, &text).await;
        }

        Commands::Config => {
            show_config(&config)?;
        }
    }

    Ok(())
}

/// Wire a controller to a page snapshot and the configured speech engines
fn build_controller(
    config: Config,
    path: &Path,
    events: EventBus,
) -> anyhow::Result<(Controller, Arc<SnapshotPage>)> {
    let page = Arc::new(
        SnapshotPage::load(path).with_context(|| format!("Failed to load page {:?}", path))?,
    );
    let speaker = speech::create_speaker(&config)?;
    let recognizer = speech::create_recognizer(&config, &events)?;
    tracing::debug!(
        "Speech output: {}, speech input: {}",
        speaker.name(),
        recognizer.name()
    );

    let ports = Ports {
        speaker,
        recognizer,
        locator: page.clone(),
        page: page.clone(),
    };
    Ok((Controller::new(config, ports, events), page))
}

/// Print every event as a JSON line on stderr
fn print_events(events: &EventBus) {
    let mut rx = events.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => eprintln!("{}", event.to_json()),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Skipped {} events", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    });
}

/// Listen for commands until Ctrl+C, end of input or a single command
async fn listen(config: Config, path: &Path, once: bool, show_events: bool) -> anyhow::Result<()> {
    let events = EventBus::new();
    if show_events {
        print_events(&events);
    }
    let (controller, page) = build_controller(config, path, events)?;

    if let Err(e) = controller.load_language().await {
        tracing::warn!("Language announcement failed: {}", e);
    }

    tracing::info!("Listening on {}", page.location());
    loop {
        let location = page.location();

        let outcome = tokio::select! {
            outcome = controller.receive_command() => outcome,
            _ = tokio::signal::ctrl_c() => {
                controller.stop_command();
                tracing::info!("Interrupted");
                break;
            }
        };

        match &outcome {
            Outcome::Completed => tracing::debug!("Command completed"),
            Outcome::Failed(message) => tracing::debug!("Command failed: {}", message),
            Outcome::Aborted(reason) => tracing::warn!("Command aborted: {}", reason),
            Outcome::Cancelled => {
                tracing::info!("No more commands");
                break;
            }
        }

        let current = page.location();
        if current != location {
            tracing::info!("Navigated to {}", current);
        }

        if once {
            break;
        }
    }

    Ok(())
}

/// Run one command without listening
async fn read(
    config: Config,
    path: &Path,
    action: ReadAction,
    show_events: bool,
) -> anyhow::Result<()> {
    let events = EventBus::new();
    if show_events {
        print_events(&events);
    }
    let (controller, _page) = build_controller(config, path, events)?;

    let command = match action {
        ReadAction::Headers { level } => VoiceCommand::ReadHeaders { level },
        ReadAction::Links { within } => VoiceCommand::ReadLinks { ancestor: within },
        ReadAction::Main => VoiceCommand::ReadMain,
        ReadAction::Title => VoiceCommand::ReadPageTitle,
        ReadAction::Summary => VoiceCommand::ReadPageSummary,
        ReadAction::Say { text } => {
            controller.load_language().await?;
            let pack = controller
                .languages()
                .resolve(controller.config().language());
            interpreter::interpret(&text, &pack)
        }
    };

    controller.execute(command).await?;
    Ok(())
}

/// Print the command a phrase resolves to
async fn interpret_phrase(config: &Config, text: &str) {
    let store = LanguageStore::new();
    let lang = config.language();
    if !store.is_loaded(lang) {
        if let Err(e) = store.load(&config.translations_path, lang).await {
            tracing::warn!("{}", e);
        }
    }
    let pack = store.resolve(lang);

    println!("Language: {}", pack.lang());
    println!("Phrase:   {:?}", interpreter::normalize(text));
    println!("Command:  {}", interpreter::interpret(text, &pack));
}

/// Show current configuration
fn show_config(config: &Config) -> anyhow::Result<()> {
    println!("Current Configuration\n");
    println!("=====================\n");

    match Config::default_path() {
        Some(path) => println!("# {}\n", path.display()),
        None => println!("# no config directory\n"),
    }

    let rendered = toml::to_string_pretty(config).context("Failed to render config")?;
    println!("{}", rendered);
    Ok(())
}
