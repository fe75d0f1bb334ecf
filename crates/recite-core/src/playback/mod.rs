pub mod controller;
pub mod espeak;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, RwLock};

pub use controller::{Outcome, PlaybackController, PlaybackState, SettleDelay};

/// Identifies one utterance for the lifetime of a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UtteranceId(pub u64);

impl fmt::Display for UtteranceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "u{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voice {
    pub name: String,
    pub lang: String,
}

impl fmt::Display for Voice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.lang)
    }
}

/// One request to vocalize a text buffer.
#[derive(Debug, Clone)]
pub struct Utterance {
    pub id: UtteranceId,
    pub text: Arc<str>,
    pub voice: Option<Voice>,
    pub rate: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechEventKind {
    /// The engine reached this character offset.
    Boundary { char_index: usize },
    /// The utterance finished on its own.
    End,
}

/// Notification from the speech engine, tagged with its utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpeechEvent {
    pub utterance: UtteranceId,
    pub kind: SpeechEventKind,
}

impl SpeechEvent {
    pub fn boundary(utterance: UtteranceId, char_index: usize) -> Self {
        SpeechEvent {
            utterance,
            kind: SpeechEventKind::Boundary { char_index },
        }
    }

    pub fn end(utterance: UtteranceId) -> Self {
        SpeechEvent {
            utterance,
            kind: SpeechEventKind::End,
        }
    }
}

/// Trait for speech synthesis backends.
///
/// Commands are fire-and-forget. Progress and completion arrive later as
/// [`SpeechEvent`]s through whatever channel the backend was built with.
/// A cancelled utterance may never produce an `End`.
pub trait SpeechEngine: Send {
    fn speak(&mut self, utterance: &Utterance);
    fn pause(&mut self);
    fn resume(&mut self);
    fn cancel(&mut self);
}

/// Read-only view of the voices the engine offers.
pub trait VoiceCatalog: Send + Sync {
    fn voices(&self) -> Vec<Voice>;

    /// Find a voice by its display name.
    fn lookup(&self, name: &str) -> Option<Voice> {
        self.voices().into_iter().find(|v| v.name == name)
    }
}

/// Voice list that the host can replace whenever the engine refreshes.
#[derive(Debug, Default)]
pub struct VoiceList {
    voices: RwLock<Vec<Voice>>,
}

impl VoiceList {
    pub fn new(voices: Vec<Voice>) -> Self {
        VoiceList {
            voices: RwLock::new(voices),
        }
    }

    pub fn replace(&self, voices: Vec<Voice>) {
        let mut guard = self.voices.write().unwrap_or_else(|e| e.into_inner());
        *guard = voices;
    }
}

impl VoiceCatalog for VoiceList {
    fn voices(&self) -> Vec<Voice> {
        self.voices
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voice(name: &str, lang: &str) -> Voice {
        Voice {
            name: name.into(),
            lang: lang.into(),
        }
    }

    #[test]
    fn test_lookup_by_name() {
        let list = VoiceList::new(vec![voice("Alice", "en-gb"), voice("Bo", "sv")]);
        assert_eq!(list.lookup("Bo").map(|v| v.lang), Some("sv".to_string()));
        assert!(list.lookup("bo").is_none());
    }

    #[test]
    fn test_replace_refreshes_catalog() {
        let list = VoiceList::default();
        assert!(list.lookup("Alice").is_none());
        list.replace(vec![voice("Alice", "en-gb")]);
        assert!(list.lookup("Alice").is_some());
    }

    #[test]
    fn test_voice_display() {
        assert_eq!(voice("Alice", "en-gb").to_string(), "Alice (en-gb)");
    }
}
