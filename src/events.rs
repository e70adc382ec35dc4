//! Notification events emitted toward the host
//!
//! Events are broadcast to every subscriber. Emitting never blocks and
//! never fails: with no subscriber the event is simply dropped.

use serde::Serialize;
use tokio::sync::broadcast;

/// Namespace prefixed to event names when they leave the process
pub const NAMESPACE: &str = "pagevox";

const CHANNEL_CAPACITY: usize = 64;

/// Lifecycle notifications, each with an optional data payload
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum InteractionEvent {
    InteractionStart,
    InteractionEnd,
    RecognitionStart,
    RecognitionResult { transcript: String, confidence: f32 },
    RecognitionError { error: String },
    RecognitionNoMatch,
    RecognitionEnd,
    #[serde(rename = "languagedownload")]
    LanguageDownloadSuccess { lang: String },
    #[serde(rename = "languageerror")]
    LanguageDownloadError { lang: String },
}

impl InteractionEvent {
    /// Event name without namespace
    pub fn name(&self) -> &'static str {
        match self {
            InteractionEvent::InteractionStart => "interactionstart",
            InteractionEvent::InteractionEnd => "interactionend",
            InteractionEvent::RecognitionStart => "recognitionstart",
            InteractionEvent::RecognitionResult { .. } => "recognitionresult",
            InteractionEvent::RecognitionError { .. } => "recognitionerror",
            InteractionEvent::RecognitionNoMatch => "recognitionnomatch",
            InteractionEvent::RecognitionEnd => "recognitionend",
            InteractionEvent::LanguageDownloadSuccess { .. } => "languagedownload",
            InteractionEvent::LanguageDownloadError { .. } => "languageerror",
        }
    }

    /// Namespaced event name, e.g. `pagevox.interactionstart`
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", NAMESPACE, self.name())
    }

    /// JSON line for external consumers
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!("{{\"type\":\"{}\"}}", self.name()))
    }
}

/// Cloneable handle used to publish and subscribe to events
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<InteractionEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn emit(&self, event: InteractionEvent) {
        tracing::trace!("Event {}", event.qualified_name());
        // Err only means nobody is listening
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<InteractionEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names() {
        assert_eq!(
            InteractionEvent::InteractionStart.qualified_name(),
            "pagevox.interactionstart"
        );
        assert_eq!(
            InteractionEvent::LanguageDownloadError { lang: "fr-FR".into() }.name(),
            "languageerror"
        );
    }

    #[test]
    fn test_json_payload() {
        let event = InteractionEvent::RecognitionResult {
            transcript: "read headers".into(),
            confidence: 0.5,
        };
        let json: serde_json::Value = serde_json::from_str(&event.to_json()).unwrap();
        assert_eq!(json["type"], "recognitionresult");
        assert_eq!(json["data"]["transcript"], "read headers");
        assert_eq!(json["data"]["confidence"], 0.5);

        let json: serde_json::Value =
            serde_json::from_str(&InteractionEvent::RecognitionEnd.to_json()).unwrap();
        assert_eq!(json["type"], "recognitionend");
        assert!(json.get("data").is_none());
    }

    #[test]
    fn test_json_names_match_event_names() {
        let events = [
            InteractionEvent::InteractionStart,
            InteractionEvent::RecognitionNoMatch,
            InteractionEvent::LanguageDownloadSuccess { lang: "en-GB".into() },
            InteractionEvent::LanguageDownloadError { lang: "en-GB".into() },
        ];
        for event in events {
            let json: serde_json::Value = serde_json::from_str(&event.to_json()).unwrap();
            assert_eq!(json["type"], event.name());
        }
    }

    #[tokio::test]
    async fn test_subscribers_receive_events() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();

        bus.emit(InteractionEvent::InteractionStart);
        bus.emit(InteractionEvent::InteractionEnd);

        assert_eq!(rx.recv().await.unwrap(), InteractionEvent::InteractionStart);
        assert_eq!(rx.recv().await.unwrap(), InteractionEvent::InteractionEnd);
    }

    #[test]
    fn test_emit_without_subscribers() {
        let bus = EventBus::new();
        bus.emit(InteractionEvent::RecognitionStart);
    }
}
