// Command-line interface definitions for pagevox
//
// This module is separate so it can be used by both the binary (main.rs)
// and build.rs for generating man pages.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "pagevox")]
#[command(author, version, about = "Voice-driven page navigation for screen-reader users")]
#[command(long_about = "
Pagevox reads a page aloud and lets you navigate it by voice.
Say a command after the \"Ready\" prompt: \"read headers\", \"next\",
\"previous\", \"read links in the footer\", \"read main content\",
\"what is the title\", \"go back\"...

SETUP:
  1. Install a speech synthesizer: espeak-ng (default) or any command
     configured under [speaker]
  2. Optionally configure a speech-to-text command under [recognizer];
     without one, commands are typed on the console
  3. Export the page to read as a JSON snapshot

USAGE:
  pagevox listen page.json      Listen for commands until Ctrl+C
  pagevox read page.json headers  Run one command without listening
")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<std::path::PathBuf>,

    /// Increase verbosity (-v = debug, -vv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (errors only)
    #[arg(short, long)]
    pub quiet: bool,

    /// Pause between items of a list in milliseconds (0 disables it)
    #[arg(long, value_name = "MS")]
    pub delay: Option<u64>,

    /// Language of commands and speech (e.g., en-GB, it-IT)
    #[arg(long, value_name = "LANG")]
    pub lang: Option<String>,

    /// Directory or URL holding <lang>.json translation files
    #[arg(long, value_name = "PATH")]
    pub translations: Option<String>,

    /// Print prompts instead of speaking them
    #[arg(long)]
    pub console: bool,

    /// Print interaction events as JSON lines on stderr
    #[arg(long)]
    pub events: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Listen for voice commands on a page
    Listen {
        /// Page snapshot (JSON)
        page: std::path::PathBuf,

        /// Stop after one command
        #[arg(long)]
        once: bool,
    },

    /// Run a single command on a page without listening
    Read {
        /// Page snapshot (JSON)
        page: std::path::PathBuf,

        #[command(subcommand)]
        action: ReadAction,
    },

    /// Show which command a phrase resolves to
    Interpret {
        /// Phrase, as a recognizer would return it
        text: String,
    },

    /// Show current configuration
    Config,
}

#[derive(Subcommand, Clone, Debug)]
pub enum ReadAction {
    /// Read the headers of the page
    Headers {
        /// Only headers of this level (1-6)
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=6))]
        level: Option<u8>,
    },

    /// Read the links of the page
    Links {
        /// Only links inside this region (tag, #id or .class)
        #[arg(long, value_name = "REGION")]
        within: Option<String>,
    },

    /// Read the main content
    Main,

    /// Read the page title
    Title,

    /// Read how many headers and links the page has
    Summary,

    /// Run any command phrase
    Say {
        /// Phrase to interpret and run
        text: String,
    },
}
