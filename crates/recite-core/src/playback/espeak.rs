use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use crate::error::ReciteError;
use crate::playback::{SpeechEngine, SpeechEvent, Utterance, UtteranceId, Voice};
use crate::settings::SpeechSettings;
use crate::tool::{self, ESPEAK_HINT};

/// Speech backend driving the `espeak-ng` command-line synthesizer.
///
/// Each utterance is one process, owned by a task that also applies pause,
/// resume and cancel. Pause and resume stop and continue that process with
/// `SIGSTOP`/`SIGCONT` (Unix only). No boundary events are produced; `End`
/// is sent when the process exits on its own.
pub struct EspeakEngine {
    binary: String,
    base_wpm: u32,
    events: mpsc::UnboundedSender<SpeechEvent>,
    current: Option<Running>,
}

struct Running {
    id: UtteranceId,
    control: mpsc::UnboundedSender<Control>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Control {
    Stop,
    Continue,
    Cancel,
}

impl EspeakEngine {
    /// Build the engine and the receiver its events are delivered on.
    pub fn new(settings: &SpeechSettings) -> (Self, mpsc::UnboundedReceiver<SpeechEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let engine = EspeakEngine {
            binary: settings.espeak.clone(),
            base_wpm: settings.base_words_per_minute,
            events: tx,
            current: None,
        };
        (engine, rx)
    }

    /// espeak speed for a rate multiplier.
    pub fn words_per_minute(&self, rate: f32) -> u32 {
        ((self.base_wpm as f32) * rate).round().max(1.0) as u32
    }

    /// Hand a command to the task owning the current process.
    ///
    /// Returns false when there is no process left to act on, including
    /// after it exited on its own.
    fn send(&mut self, control: Control) -> bool {
        let Some(running) = self.current.as_ref() else {
            return false;
        };
        if running.control.send(control).is_ok() {
            return true;
        }
        debug!(utterance = %running.id, ?control, "espeak already exited");
        self.current = None;
        false
    }
}

impl SpeechEngine for EspeakEngine {
    fn speak(&mut self, utterance: &Utterance) {
        // One utterance at a time system-wide.
        self.cancel();

        let id = utterance.id;
        let mut cmd = Command::new(&self.binary);
        cmd.arg("-s")
            .arg(self.words_per_minute(utterance.rate).to_string())
            .arg("--stdin")
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        if let Some(voice) = &utterance.voice {
            cmd.arg("-v").arg(&voice.lang);
        }

        let child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                let err = tool::spawn_error(&self.binary, ESPEAK_HINT, e);
                error!(utterance = %id, error = %err, "could not start speech");
                // Nothing will ever play; finish the utterance right away.
                let _ = self.events.send(SpeechEvent::end(id));
                return;
            }
        };

        let (control_tx, control_rx) = mpsc::unbounded_channel();
        tokio::spawn(supervise(
            id,
            child,
            utterance.text.clone(),
            control_rx,
            self.events.clone(),
        ));

        self.current = Some(Running {
            id,
            control: control_tx,
        });
    }

    fn pause(&mut self) {
        self.send(Control::Stop);
    }

    fn resume(&mut self) {
        self.send(Control::Continue);
    }

    fn cancel(&mut self) {
        if self.send(Control::Cancel) {
            debug!("cancelling espeak");
        }
        self.current = None;
    }
}

/// Own one espeak process until it exits or is cancelled.
///
/// Signals are only sent from here, before `wait` has reaped the child, so
/// the pid still belongs to it. The control receiver is dropped before `End`
/// is sent.
async fn supervise(
    id: UtteranceId,
    mut child: Child,
    text: Arc<str>,
    mut control: mpsc::UnboundedReceiver<Control>,
    events: mpsc::UnboundedSender<SpeechEvent>,
) {
    let pid = child.id();
    let finished = {
        let run = speak_to_completion(&mut child, &text);
        tokio::pin!(run);
        loop {
            tokio::select! {
                status = &mut run => break Some(status),
                msg = control.recv() => match msg {
                    Some(Control::Stop) => signal(pid, "STOP").await,
                    Some(Control::Continue) => signal(pid, "CONT").await,
                    Some(Control::Cancel) | None => break None,
                },
            }
        }
    };
    drop(control);

    match finished {
        Some(Ok(status)) => {
            debug!(utterance = %id, code = status.code(), "espeak exited");
            let _ = events.send(SpeechEvent::end(id));
        }
        Some(Err(e)) => {
            error!(utterance = %id, error = %e, "espeak failed");
            let _ = events.send(SpeechEvent::end(id));
        }
        None => {
            if let Err(e) = child.kill().await {
                warn!(utterance = %id, error = %e, "could not kill espeak");
            }
            debug!(utterance = %id, "espeak cancelled");
        }
    }
}

async fn signal(pid: Option<u32>, sig: &str) {
    let Some(pid) = pid else {
        return;
    };
    let status = Command::new("kill")
        .arg(format!("-{sig}"))
        .arg(pid.to_string())
        .status()
        .await;
    match status {
        Ok(s) if s.success() => debug!(pid, sig, "signalled espeak"),
        Ok(s) => warn!(pid, sig, code = s.code(), "kill reported failure"),
        Err(e) => warn!(pid, sig, error = %e, "could not run kill"),
    }
}

async fn speak_to_completion(child: &mut Child, text: &str) -> std::io::Result<ExitStatus> {
    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(text.as_bytes()).await?;
        stdin.shutdown().await?;
    }
    child.wait().await
}

/// Read the installed voices from `espeak-ng --voices`.
pub async fn load_voices(binary: &str) -> Result<Vec<Voice>, ReciteError> {
    let mut cmd = Command::new(binary);
    cmd.arg("--voices");
    let stdout = tool::run(&mut cmd, binary, ESPEAK_HINT).await?;
    Ok(parse_voice_list(&String::from_utf8_lossy(&stdout)))
}

/// Parse the `--voices` table.
///
/// Columns are `Pty Language Age/Gender VoiceName File Other-Languages`.
pub fn parse_voice_list(output: &str) -> Vec<Voice> {
    output
        .lines()
        .filter(|l| !l.trim_start().starts_with("Pty"))
        .filter_map(|line| {
            let cols: Vec<&str> = line.split_whitespace().collect();
            if cols.len() < 4 {
                return None;
            }
            Some(Voice {
                name: cols[3].to_string(),
                lang: cols[1].to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const VOICES: &str = "\
Pty Language       Age/Gender VoiceName          File                 Other Languages
 5  af              --/M      Afrikaans          gmw/af
 2  en-gb           --/M      English_(Great_Britain) gmw/en            (en 2)
 5  sv              --/M      Swedish            gmq/sv
";

    #[test]
    fn test_parse_voice_list() {
        let voices = parse_voice_list(VOICES);
        assert_eq!(voices.len(), 3);
        assert_eq!(voices[1].name, "English_(Great_Britain)");
        assert_eq!(voices[1].lang, "en-gb");
        assert_eq!(voices[2].to_string(), "Swedish (sv)");
    }

    #[test]
    fn test_parse_ignores_short_lines() {
        assert!(parse_voice_list("\n  \nPty Language\n").is_empty());
    }

    #[test]
    fn test_words_per_minute() {
        let (engine, _rx) = EspeakEngine::new(&SpeechSettings::default());
        assert_eq!(engine.words_per_minute(0.8), 140);
        assert_eq!(engine.words_per_minute(1.0), 175);
        assert_eq!(engine.words_per_minute(0.0), 1);
    }

    #[tokio::test]
    async fn test_missing_binary_ends_utterance() {
        let settings = SpeechSettings {
            espeak: "recite-missing-espeak".into(),
            ..SpeechSettings::default()
        };
        let (mut engine, mut rx) = EspeakEngine::new(&settings);
        engine.speak(&Utterance {
            id: UtteranceId(7),
            text: Arc::from("hello"),
            voice: None,
            rate: 0.8,
        });
        assert_eq!(rx.recv().await, Some(SpeechEvent::end(UtteranceId(7))));
    }

    #[tokio::test]
    async fn test_cancel_and_signals_without_process_are_harmless() {
        let (mut engine, _rx) = EspeakEngine::new(&SpeechSettings::default());
        engine.pause();
        engine.resume();
        engine.cancel();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_pause_after_natural_exit_sends_nothing() {
        // `true` ignores its arguments and exits at once.
        let settings = SpeechSettings {
            espeak: "true".into(),
            ..SpeechSettings::default()
        };
        let (mut engine, mut rx) = EspeakEngine::new(&settings);
        engine.speak(&Utterance {
            id: UtteranceId(3),
            text: Arc::from("hello"),
            voice: None,
            rate: 1.0,
        });
        assert!(engine.current.is_some());
        assert_eq!(rx.recv().await, Some(SpeechEvent::end(UtteranceId(3))));

        assert!(!engine.send(Control::Stop));
        assert!(engine.current.is_none());
        engine.pause();
        engine.resume();
    }
}
