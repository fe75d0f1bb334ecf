use recite_core::error::ReciteError;
use recite_core::extraction::orchestrator::{Engines, Extraction, ExtractionOrchestrator};
use recite_core::model::{ExtractionProgress, UploadedFile};
use recite_core::playback::espeak::{load_voices, EspeakEngine};
use recite_core::playback::{Outcome, PlaybackController, VoiceList};
use recite_core::session::ReaderSession;
use recite_core::settings::Settings;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;

use crate::output;

const HELP: &str = "Commands: p = play/resume, s = pause, r = reset, q = quit";

pub async fn run(
    input_file: PathBuf,
    media_type: Option<String>,
    voice: Option<String>,
    settings: &Settings,
) -> Result<(), ReciteError> {
    let file = UploadedFile::from_path(&input_file, media_type.as_deref())?;

    let voices = match load_voices(&settings.speech.espeak).await {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, "voice catalog unavailable, using engine default");
            Vec::new()
        }
    };
    let (engine, mut events) = EspeakEngine::new(&settings.speech);
    let mut playback = PlaybackController::new(engine, Arc::new(VoiceList::new(voices)), &settings.speech);
    if voice.is_some() {
        playback.select_voice(voice);
    }
    playback.on_state_change(output::text::state);

    let orchestrator = ExtractionOrchestrator::new(Engines::system(settings), settings);
    let mut session = ReaderSession::new(orchestrator, playback);

    let progress = |p: ExtractionProgress| output::text::progress(&p);
    match session.ingest(file, &progress).await? {
        Extraction::Text(text) => output::text::print(&text),
        Extraction::Skipped { .. } => return Ok(()),
    }

    eprintln!("{HELP}");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let outcome = match line.trim() {
                    "p" => session.playback_mut().play(),
                    "s" => session.playback_mut().pause(),
                    "r" => {
                        session.playback_mut().reset().wait().await;
                        continue;
                    }
                    "q" => break,
                    "" => continue,
                    other => {
                        eprintln!("unknown command '{other}'. {HELP}");
                        continue;
                    }
                };
                output::text::outcome(outcome);
            }
            Some(event) = events.recv() => {
                let outcome = session.playback_mut().handle_event(event);
                if matches!(outcome, Outcome::Finished(_)) {
                    output::text::outcome(outcome);
                }
            }
        }
    }

    session.playback_mut().reset().wait().await;
    Ok(())
}
