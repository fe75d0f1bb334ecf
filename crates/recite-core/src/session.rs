use crate::error::ExtractionError;
use crate::extraction::orchestrator::{Extraction, ExtractionOrchestrator};
use crate::extraction::ProgressFn;
use crate::model::{TextBuffer, UploadedFile};
use crate::playback::{PlaybackController, PlaybackState, SpeechEngine};

/// The one extraction pipeline and the one playback controller a reader
/// works with. Taking `&mut self` for ingest keeps extractions one at a time.
pub struct ReaderSession<E: SpeechEngine> {
    orchestrator: ExtractionOrchestrator,
    playback: PlaybackController<E>,
}

impl<E: SpeechEngine> ReaderSession<E> {
    pub fn new(orchestrator: ExtractionOrchestrator, playback: PlaybackController<E>) -> Self {
        ReaderSession {
            orchestrator,
            playback,
        }
    }

    pub fn playback(&self) -> &PlaybackController<E> {
        &self.playback
    }

    pub fn playback_mut(&mut self) -> &mut PlaybackController<E> {
        &mut self.playback
    }

    /// Extract an upload and, on success, make its text the playback buffer.
    ///
    /// Any utterance over the previous buffer is reset first. Skipped and
    /// failed extractions leave the previous buffer in place.
    pub async fn ingest(
        &mut self,
        file: UploadedFile,
        progress: ProgressFn<'_>,
    ) -> Result<Extraction, ExtractionError> {
        let extraction = self.orchestrator.extract(file, progress).await?;

        if let Extraction::Text(ref text) = extraction {
            if self.playback.state() != PlaybackState::Idle {
                self.playback.reset().wait().await;
            }
            self.playback.set_text(TextBuffer::new(text.as_str()));
        }

        Ok(extraction)
    }
}
