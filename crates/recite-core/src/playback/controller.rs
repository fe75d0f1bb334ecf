use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::model::TextBuffer;
use crate::playback::{SpeechEngine, SpeechEvent, SpeechEventKind, Utterance, UtteranceId, VoiceCatalog};
use crate::settings::SpeechSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    Idle,
    Playing,
    Paused,
    /// Passed through when an utterance finishes, immediately followed by `Idle`.
    Ended,
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackState::Idle => write!(f, "idle"),
            PlaybackState::Playing => write!(f, "playing"),
            PlaybackState::Paused => write!(f, "paused"),
            PlaybackState::Ended => write!(f, "ended"),
        }
    }
}

/// What a controller call actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Started(UtteranceId),
    Resumed,
    Paused,
    Boundary(usize),
    Finished(UtteranceId),
    /// Invalid in the current state, or a stale event.
    Ignored,
}

/// Time to wait after [`PlaybackController::reset`] before reinitialising,
/// since engines stop asynchronously.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "the settle delay should be awaited before reinitialising"]
pub struct SettleDelay {
    duration: Duration,
}

impl SettleDelay {
    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub async fn wait(self) {
        tokio::time::sleep(self.duration).await;
    }
}

type StateObserver = Box<dyn Fn(PlaybackState) + Send + Sync>;

/// Owns the single active utterance and the play/pause/resume/reset state.
pub struct PlaybackController<E: SpeechEngine> {
    engine: E,
    catalog: Arc<dyn VoiceCatalog>,
    rate: f32,
    settle_delay: Duration,
    voice: Option<String>,
    text: Option<TextBuffer>,
    state: PlaybackState,
    boundary: usize,
    active: Option<UtteranceId>,
    next_id: u64,
    observer: Option<StateObserver>,
}

impl<E: SpeechEngine> PlaybackController<E> {
    pub fn new(engine: E, catalog: Arc<dyn VoiceCatalog>, settings: &SpeechSettings) -> Self {
        PlaybackController {
            engine,
            catalog,
            rate: settings.rate,
            settle_delay: Duration::from_millis(settings.settle_delay_ms),
            voice: settings.voice.clone(),
            text: None,
            state: PlaybackState::Idle,
            boundary: 0,
            active: None,
            next_id: 1,
            observer: None,
        }
    }

    /// Called on every state change, including the pass through `Ended`.
    pub fn on_state_change(&mut self, observer: impl Fn(PlaybackState) + Send + Sync + 'static) {
        self.observer = Some(Box::new(observer));
    }

    /// Install the text for the next utterance started from `Idle`.
    pub fn set_text(&mut self, text: TextBuffer) {
        debug!(chars = text.char_count(), "text buffer replaced");
        self.text = Some(text);
    }

    pub fn text(&self) -> Option<&TextBuffer> {
        self.text.as_ref()
    }

    /// Voice name to bind at the next fresh `play()`. `None` means engine default.
    pub fn select_voice(&mut self, voice: Option<String>) {
        self.voice = voice;
    }

    pub fn selected_voice(&self) -> Option<&str> {
        self.voice.as_deref()
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Character offset last reported by the engine; 0 outside Playing/Paused.
    pub fn boundary(&self) -> usize {
        self.boundary
    }

    pub fn active_utterance(&self) -> Option<UtteranceId> {
        self.active
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    /// Start a new utterance from `Idle`, or resume from `Paused`.
    ///
    /// Ignored while already `Playing` so two utterances never overlap.
    pub fn play(&mut self) -> Outcome {
        match self.state {
            PlaybackState::Playing => {
                debug!("play ignored: already playing");
                Outcome::Ignored
            }
            PlaybackState::Paused => {
                self.engine.resume();
                self.enter(PlaybackState::Playing);
                Outcome::Resumed
            }
            PlaybackState::Idle | PlaybackState::Ended => self.start(),
        }
    }

    fn start(&mut self) -> Outcome {
        let Some(text) = self.text.as_ref() else {
            debug!("play ignored: no text loaded");
            return Outcome::Ignored;
        };

        let voice = match self.voice.as_deref() {
            Some(name) => {
                let found = self.catalog.lookup(name);
                if found.is_none() {
                    debug!(voice = name, "voice not in catalog, using engine default");
                }
                found
            }
            None => None,
        };

        let id = UtteranceId(self.next_id);
        self.next_id += 1;
        let utterance = Utterance {
            id,
            text: text.shared(),
            voice,
            rate: self.rate,
        };
        info!(
            utterance = %id,
            chars = text.char_count(),
            voice = utterance.voice.as_ref().map(|v| v.name.as_str()).unwrap_or("default"),
            rate = self.rate,
            "speaking"
        );

        self.engine.speak(&utterance);
        self.active = Some(id);
        self.boundary = 0;
        self.enter(PlaybackState::Playing);
        Outcome::Started(id)
    }

    /// Pause if playing; otherwise a no-op.
    pub fn pause(&mut self) -> Outcome {
        if self.state != PlaybackState::Playing {
            debug!(state = %self.state, "pause ignored");
            return Outcome::Ignored;
        }
        self.engine.pause();
        self.enter(PlaybackState::Paused);
        Outcome::Paused
    }

    /// Apply an engine notification. Events for any utterance other than the
    /// active one are stale and dropped.
    pub fn handle_event(&mut self, event: SpeechEvent) -> Outcome {
        if self.active != Some(event.utterance) {
            debug!(utterance = %event.utterance, "stale speech event ignored");
            return Outcome::Ignored;
        }

        match (event.kind, self.state) {
            (SpeechEventKind::Boundary { char_index }, PlaybackState::Playing) => {
                self.boundary = char_index;
                Outcome::Boundary(char_index)
            }
            // Position stays frozen while paused.
            (SpeechEventKind::Boundary { .. }, _) => Outcome::Ignored,
            (SpeechEventKind::End, PlaybackState::Playing | PlaybackState::Paused) => {
                self.active = None;
                self.boundary = 0;
                self.enter(PlaybackState::Ended);
                self.enter(PlaybackState::Idle);
                info!(utterance = %event.utterance, "utterance finished");
                Outcome::Finished(event.utterance)
            }
            (SpeechEventKind::End, _) => Outcome::Ignored,
        }
    }

    /// Cancel any speech, whatever the state, and return to `Idle`.
    ///
    /// The engine is told to cancel even when idle. The returned delay
    /// should elapse before the host rebuilds its playback surface.
    pub fn reset(&mut self) -> SettleDelay {
        self.engine.cancel();
        if let Some(id) = self.active.take() {
            info!(utterance = %id, "utterance cancelled");
        }
        self.boundary = 0;
        self.enter(PlaybackState::Idle);
        SettleDelay {
            duration: self.settle_delay,
        }
    }

    fn enter(&mut self, next: PlaybackState) {
        if self.state == next {
            return;
        }
        debug!(from = %self.state, to = %next, "playback state");
        self.state = next;
        if let Some(observer) = &self.observer {
            observer(next);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::{Voice, VoiceList};
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Speak {
            id: UtteranceId,
            text: String,
            voice: Option<String>,
            rate: f32,
        },
        Pause,
        Resume,
        Cancel,
    }

    #[derive(Default)]
    struct RecordingEngine {
        calls: Vec<Call>,
    }

    impl SpeechEngine for RecordingEngine {
        fn speak(&mut self, u: &Utterance) {
            self.calls.push(Call::Speak {
                id: u.id,
                text: u.text.to_string(),
                voice: u.voice.as_ref().map(|v| v.name.clone()),
                rate: u.rate,
            });
        }
        fn pause(&mut self) {
            self.calls.push(Call::Pause);
        }
        fn resume(&mut self) {
            self.calls.push(Call::Resume);
        }
        fn cancel(&mut self) {
            self.calls.push(Call::Cancel);
        }
    }

    impl RecordingEngine {
        fn speaks(&self) -> usize {
            self.calls
                .iter()
                .filter(|c| matches!(c, Call::Speak { .. }))
                .count()
        }
    }

    fn controller() -> PlaybackController<RecordingEngine> {
        let catalog = Arc::new(VoiceList::new(vec![Voice {
            name: "Alice".into(),
            lang: "en-gb".into(),
        }]));
        let mut c = PlaybackController::new(
            RecordingEngine::default(),
            catalog,
            &SpeechSettings::default(),
        );
        c.set_text(TextBuffer::from("The quick brown fox.".to_string()));
        c
    }

    fn started(outcome: Outcome) -> UtteranceId {
        match outcome {
            Outcome::Started(id) => id,
            other => panic!("expected Started, got {other:?}"),
        }
    }

    #[test]
    fn test_play_from_idle_builds_utterance_at_reduced_rate() {
        let mut c = controller();
        let id = started(c.play());
        assert_eq!(c.state(), PlaybackState::Playing);
        assert_eq!(c.boundary(), 0);
        assert_eq!(
            c.engine().calls,
            vec![Call::Speak {
                id,
                text: "The quick brown fox.".into(),
                voice: None,
                rate: 0.8,
            }]
        );
    }

    #[test]
    fn test_double_play_creates_one_utterance() {
        let mut c = controller();
        started(c.play());
        assert_eq!(c.play(), Outcome::Ignored);
        assert_eq!(c.engine().speaks(), 1);
        assert_eq!(c.state(), PlaybackState::Playing);
    }

    #[test]
    fn test_pause_from_idle_is_noop() {
        let mut c = controller();
        assert_eq!(c.pause(), Outcome::Ignored);
        assert_eq!(c.state(), PlaybackState::Idle);
        assert!(c.engine().calls.is_empty());
    }

    #[test]
    fn test_pause_twice_pauses_engine_once() {
        let mut c = controller();
        started(c.play());
        assert_eq!(c.pause(), Outcome::Paused);
        assert_eq!(c.pause(), Outcome::Ignored);
        let pauses = c.engine().calls.iter().filter(|c| **c == Call::Pause).count();
        assert_eq!(pauses, 1);
    }

    #[test]
    fn test_play_pause_play_resumes_and_keeps_boundary() {
        let mut c = controller();
        let id = started(c.play());
        assert_eq!(c.handle_event(SpeechEvent::boundary(id, 10)), Outcome::Boundary(10));
        c.pause();
        assert_eq!(c.boundary(), 10);
        assert_eq!(c.play(), Outcome::Resumed);

        assert_eq!(c.state(), PlaybackState::Playing);
        assert_eq!(c.boundary(), 10);
        assert_eq!(c.active_utterance(), Some(id));
        assert_eq!(c.engine().speaks(), 1);
        assert_eq!(c.engine().calls.last(), Some(&Call::Resume));
    }

    #[test]
    fn test_boundary_frozen_while_paused() {
        let mut c = controller();
        let id = started(c.play());
        c.handle_event(SpeechEvent::boundary(id, 4));
        c.pause();
        assert_eq!(c.handle_event(SpeechEvent::boundary(id, 9)), Outcome::Ignored);
        assert_eq!(c.boundary(), 4);
    }

    #[test]
    fn test_end_passes_through_ended_to_idle() {
        let mut c = controller();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        c.on_state_change(move |s| sink.lock().unwrap().push(s));

        let id = started(c.play());
        c.handle_event(SpeechEvent::boundary(id, 12));
        assert_eq!(c.handle_event(SpeechEvent::end(id)), Outcome::Finished(id));

        assert_eq!(c.state(), PlaybackState::Idle);
        assert_eq!(c.boundary(), 0);
        assert_eq!(c.active_utterance(), None);
        assert_eq!(
            *seen.lock().unwrap(),
            vec![PlaybackState::Playing, PlaybackState::Ended, PlaybackState::Idle]
        );
    }

    #[test]
    fn test_play_after_end_starts_new_utterance() {
        let mut c = controller();
        let first = started(c.play());
        c.handle_event(SpeechEvent::end(first));
        let second = started(c.play());
        assert_ne!(first, second);
        assert_eq!(c.engine().speaks(), 2);
    }

    #[test]
    fn test_reset_from_every_state_ends_idle() {
        // Idle
        let mut c = controller();
        let delay = c.reset();
        assert_eq!(delay.duration(), Duration::from_millis(200));
        assert_eq!((c.state(), c.boundary()), (PlaybackState::Idle, 0));
        assert_eq!(c.engine().calls, vec![Call::Cancel]);

        // Playing
        let mut c = controller();
        let id = started(c.play());
        c.handle_event(SpeechEvent::boundary(id, 7));
        let _ = c.reset();
        assert_eq!((c.state(), c.boundary()), (PlaybackState::Idle, 0));
        assert_eq!(c.active_utterance(), None);

        // Paused
        let mut c = controller();
        let id = started(c.play());
        c.handle_event(SpeechEvent::boundary(id, 7));
        c.pause();
        let _ = c.reset();
        assert_eq!((c.state(), c.boundary()), (PlaybackState::Idle, 0));
        // A fresh play after reset creates a new utterance rather than resuming.
        assert!(matches!(c.play(), Outcome::Started(_)));
    }

    #[test]
    fn test_events_from_cancelled_utterance_are_stale() {
        let mut c = controller();
        let old = started(c.play());
        let _ = c.reset();
        let new = started(c.play());

        assert_eq!(c.handle_event(SpeechEvent::boundary(old, 3)), Outcome::Ignored);
        assert_eq!(c.handle_event(SpeechEvent::end(old)), Outcome::Ignored);
        assert_eq!(c.state(), PlaybackState::Playing);
        assert_eq!(c.active_utterance(), Some(new));
    }

    #[test]
    fn test_voice_bound_at_start_only() {
        let mut c = controller();
        c.select_voice(Some("Alice".into()));
        started(c.play());
        c.pause();
        c.select_voice(Some("Nobody".into()));
        c.play();
        match &c.engine().calls[0] {
            Call::Speak { voice, .. } => assert_eq!(voice.as_deref(), Some("Alice")),
            other => panic!("unexpected call {other:?}"),
        }
        assert_eq!(c.engine().speaks(), 1);
    }

    #[test]
    fn test_unknown_voice_falls_back_to_default() {
        let mut c = controller();
        c.select_voice(Some("Nobody".into()));
        started(c.play());
        match &c.engine().calls[0] {
            Call::Speak { voice, .. } => assert_eq!(*voice, None),
            other => panic!("unexpected call {other:?}"),
        }
    }

    #[test]
    fn test_play_without_text_is_ignored() {
        let mut c = PlaybackController::new(
            RecordingEngine::default(),
            Arc::new(VoiceList::default()),
            &SpeechSettings::default(),
        );
        assert_eq!(c.play(), Outcome::Ignored);
        assert_eq!(c.state(), PlaybackState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_settle_delay_waits() {
        let mut c = controller();
        started(c.play());
        let before = tokio::time::Instant::now();
        c.reset().wait().await;
        assert!(before.elapsed() >= Duration::from_millis(200));
    }
}
