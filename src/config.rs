//! Configuration loading and types for pagevox
//!
//! Configuration is loaded in layers:
//! 1. Built-in defaults
//! 2. Config file (~/.config/pagevox/config.toml)
//! 3. Environment variables (PAGEVOX_*)
//! 4. CLI arguments (highest priority)
//!
//! The resulting [`Config`] is resolved once and handed to the controller,
//! which never mutates it.

use crate::error::PagevoxError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Language used when nothing else is configured
pub const DEFAULT_LANGUAGE: &str = "en-GB";

/// Default configuration file content
pub const DEFAULT_CONFIG: &str = r#"# Pagevox Configuration
#
# Location: ~/.config/pagevox/config.toml
# All settings can be overridden via CLI flags

# Pause between two items when reading headers or links, in milliseconds.
# 0 reads the items back to back.
delay_ms = 300

# Directory or http(s) URL holding translation files named <lang>.json.
# Empty means the current directory. en-GB is built in.
translations_path = ""

[recognizer]
# Language of the spoken commands. Also selects the translation file.
lang = "en-GB"

# Recognition backend: "console" (type commands on stdin) or "process"
# (run an external speech-to-text command).
backend = "console"

# Command for the "process" backend. It must print the transcript, or a
# JSON object {"transcript": "...", "confidence": 0.9}, on stdout.
# Arguments can use {lang} and any extra key of this table.
# command = "my-stt"
# args = ["--lang", "{lang}"]

# How long to wait for the engine to exit after an abort, in milliseconds.
grace_ms = 1500

[speaker]
# Language and voice for speech synthesis
lang = "en-GB"
voice = "en-gb"

# Synthesis backend: "process" (external text-to-speech command) or
# "console" (print prompts on stdout).
backend = "process"

# Command for the "process" backend. Arguments can use {lang}, {voice}
# and {text}.
command = "espeak-ng"
args = ["-v", "{voice}", "--", "{text}"]
"#;

/// Speech recognition backend selection
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RecognizerBackend {
    /// Read typed commands from stdin
    #[default]
    Console,
    /// Spawn an external speech-to-text command per recognition
    Process,
}

/// Speech synthesis backend selection
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SpeakerBackend {
    /// Print prompts on stdout
    Console,
    /// Spawn an external text-to-speech command per prompt
    #[default]
    Process,
}

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Pause between items of a sequential read (ms), 0 disables it
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,

    /// Where `<lang>.json` translation files are looked up
    #[serde(default)]
    pub translations_path: String,

    #[serde(default)]
    pub recognizer: RecognizerConfig,

    #[serde(default)]
    pub speaker: SpeakerConfig,
}

/// Speech recognition configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RecognizerConfig {
    /// Recognition language tag (e.g. "en-GB")
    #[serde(default = "default_language")]
    pub lang: String,

    #[serde(default)]
    pub backend: RecognizerBackend,

    /// External command for the process backend
    #[serde(default)]
    pub command: Option<String>,

    /// Arguments for the external command (templated)
    #[serde(default)]
    pub args: Vec<String>,

    /// Grace period after an abort before giving up on the engine (ms)
    #[serde(default = "default_grace_ms")]
    pub grace_ms: u64,

    /// Engine-specific settings, available as `{key}` in `args`
    #[serde(flatten)]
    pub passthrough: BTreeMap<String, toml::Value>,
}

/// Speech synthesis configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SpeakerConfig {
    /// Synthesis language tag
    #[serde(default = "default_language")]
    pub lang: String,

    /// Voice name passed to the engine
    #[serde(default = "default_voice")]
    pub voice: String,

    #[serde(default)]
    pub backend: SpeakerBackend,

    /// External command for the process backend
    #[serde(default = "default_speaker_command")]
    pub command: String,

    /// Arguments for the external command (templated)
    #[serde(default = "default_speaker_args")]
    pub args: Vec<String>,
}

fn default_delay_ms() -> u64 {
    300
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

fn default_grace_ms() -> u64 {
    1500
}

fn default_voice() -> String {
    "en-gb".to_string()
}

fn default_speaker_command() -> String {
    "espeak-ng".to_string()
}

fn default_speaker_args() -> Vec<String> {
    ["-v", "{voice}", "--", "{text}"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            lang: default_language(),
            backend: RecognizerBackend::default(),
            command: None,
            args: vec![],
            grace_ms: default_grace_ms(),
            passthrough: BTreeMap::new(),
        }
    }
}

impl Default for SpeakerConfig {
    fn default() -> Self {
        Self {
            lang: default_language(),
            voice: default_voice(),
            backend: SpeakerBackend::default(),
            command: default_speaker_command(),
            args: default_speaker_args(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            delay_ms: default_delay_ms(),
            translations_path: String::new(),
            recognizer: RecognizerConfig::default(),
            speaker: SpeakerConfig::default(),
        }
    }
}

impl Config {
    /// Inter-item delay, `None` when pauses are disabled
    pub fn delay(&self) -> Option<Duration> {
        (self.delay_ms > 0).then(|| Duration::from_millis(self.delay_ms))
    }

    /// Language used to pick the command translation
    pub fn language(&self) -> &str {
        &self.recognizer.lang
    }

    /// Get the default config file path
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "pagevox")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }
}

impl RecognizerConfig {
    /// Passthrough values rendered as strings for argument templating
    pub fn template_values(&self) -> BTreeMap<String, String> {
        let mut values: BTreeMap<String, String> = self
            .passthrough
            .iter()
            .map(|(k, v)| {
                let rendered = match v {
                    toml::Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (k.clone(), rendered)
            })
            .collect();
        values.insert("lang".to_string(), self.lang.clone());
        values
    }
}

/// Load configuration from file, with defaults for missing values
pub fn load_config(path: Option<&Path>) -> Result<Config, PagevoxError> {
    // Start with defaults
    let mut config = Config::default();

    let config_path = path.map(PathBuf::from).or_else(Config::default_path);

    if let Some(ref path) = config_path {
        if path.exists() {
            tracing::debug!("Loading config from {:?}", path);
            let contents = std::fs::read_to_string(path)
                .map_err(|e| PagevoxError::Config(format!("Failed to read config: {}", e)))?;

            config = toml::from_str(&contents)
                .map_err(|e| PagevoxError::Config(format!("Invalid config: {}", e)))?;
        } else {
            tracing::debug!("Config file not found at {:?}, using defaults", path);
        }
    }

    apply_env_overrides(&mut config)?;

    Ok(config)
}

fn apply_env_overrides(config: &mut Config) -> Result<(), PagevoxError> {
    if let Ok(delay) = std::env::var("PAGEVOX_DELAY_MS") {
        config.delay_ms = delay
            .parse()
            .map_err(|_| PagevoxError::Config(format!("Invalid PAGEVOX_DELAY_MS: {:?}", delay)))?;
    }
    if let Ok(lang) = std::env::var("PAGEVOX_LANG") {
        config.recognizer.lang = lang.clone();
        config.speaker.lang = lang;
    }
    if let Ok(path) = std::env::var("PAGEVOX_TRANSLATIONS_PATH") {
        config.translations_path = path;
    }
    Ok(())
}
