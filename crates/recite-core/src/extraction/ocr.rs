use std::sync::Arc;
use tracing::debug;

use crate::error::{ExtractionError, ImageOrigin};
use crate::extraction::{OcrEngine, OcrProgress, ProgressFn, RasterImage, RECOGNIZING_TEXT};
use crate::model::{ExtractionProgress, Phase};

/// Language hint sent with every recognition request unless configured otherwise.
pub const DEFAULT_LANGUAGE: &str = "eng";

/// Runs OCR over a single raster image.
pub struct ImageExtractor {
    engine: Arc<dyn OcrEngine>,
    language: String,
}

impl ImageExtractor {
    pub fn new(engine: Arc<dyn OcrEngine>, language: impl Into<String>) -> Self {
        ImageExtractor {
            engine,
            language: language.into(),
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// Decode uploaded bytes, then recognize.
    pub async fn extract(
        &self,
        bytes: &[u8],
        progress: ProgressFn<'_>,
    ) -> Result<String, ExtractionError> {
        let image = RasterImage::spawn_decode(bytes.to_vec(), ImageOrigin::Upload).await?;
        self.recognize(&image, progress).await
    }

    /// Recognize an already-decoded image.
    ///
    /// Only engine callbacks with status `"recognizing text"` are forwarded.
    /// An empty result is a valid outcome (blank page), not a failure.
    pub async fn recognize(
        &self,
        image: &RasterImage,
        progress: ProgressFn<'_>,
    ) -> Result<String, ExtractionError> {
        debug!(
            backend = self.engine.backend_name(),
            width = image.width(),
            height = image.height(),
            language = %self.language,
            "starting OCR"
        );
        progress(ExtractionProgress::phase(Phase::Recognizing));

        let forward = |p: OcrProgress| {
            if p.status == RECOGNIZING_TEXT {
                progress(ExtractionProgress::recognizing(p.progress));
            }
        };

        let text = self
            .engine
            .recognize(image, &self.language, &forward)
            .await
            .map_err(|e| ExtractionError::Ocr(e.0))?;

        debug!(chars = text.chars().count(), "OCR finished");
        Ok(text)
    }
}
