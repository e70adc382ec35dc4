//! Pagevox: voice-driven page navigation
//!
//! This library provides the core functionality for:
//! - Capturing spoken commands through a speech-to-text engine
//! - Interpreting them with per-language command patterns
//! - Walking headers, links and main content of a page
//! - Reading content aloud through a text-to-speech engine
//!
//! # Architecture
//!
//! ```text
//!                            ┌─────────────────────────────────────┐
//!                            │         Interaction Controller      │
//!                            └─────────────────────────────────────┘
//!                                            │
//!                   ┌────────────────────────┼────────────────────────┐
//!                   │                        │                        │
//!                   ▼                        ▼                        ▼
//!          ┌──────────────┐         ┌──────────────┐         ┌──────────────┐
//!          │ Speech Input │         │Speech Output │         │   Session    │
//!          │ (STT command)│         │ (espeak-ng)  │         │    State     │
//!          └──────────────┘         └──────────────┘         └──────────────┘
//!                   │                        ▲
//!                   │ transcript             │ text
//!                   ▼                        │
//!          ┌─────────────────────────────────────────────────────────────────┐
//!          │                          Voice Cycle                            │
//!          │  "Ready" ──▶ Recognize ──▶ Interpret ──▶ Route ──▶ Speak        │
//!          └─────────────────────────────────────────────────────────────────┘
//!                                            │
//!                                            ▼
//!                                   ┌──────────────┐
//!                                   │ Interpreter  │ (language pack patterns)
//!                                   └──────────────┘
//!                                            │
//!                                            ▼ voice command
//!                                   ┌──────────────┐
//!                                   │    Router    │
//!                                   └──────────────┘
//!                                            │
//!                                            ▼
//!                                   ┌──────────────┐
//!                                   │   Content    │ headers, links, main, title
//!                                   │   Locator    │
//!                                   └──────────────┘
//!                                            │
//!                                            ▼
//!                                   ┌──────────────┐
//!                                   │ Page Actions │ highlight, focus, history
//!                                   └──────────────┘
//! ```

pub mod cli;
pub mod config;
pub mod controller;
pub mod error;
pub mod events;
pub mod interpreter;
pub mod language;
pub mod page;
pub mod router;
pub mod speech;
pub mod state;

pub use cli::{Cli, Commands, ReadAction};
pub use config::Config;
pub use controller::{Controller, Outcome, Ports};
pub use error::{PagevoxError, Result};
pub use events::{EventBus, InteractionEvent};
pub use interpreter::VoiceCommand;
