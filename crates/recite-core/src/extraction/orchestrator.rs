use std::sync::Arc;
use tracing::{error, info, warn};

use crate::error::ExtractionError;
use crate::extraction::heic::HeicConverter;
use crate::extraction::heif_convert::HeifConvert;
use crate::extraction::lopdf_backend::LopdfEngine;
use crate::extraction::ocr::ImageExtractor;
use crate::extraction::pdf::PdfExtractor;
use crate::extraction::tesseract::TesseractOcr;
use crate::extraction::{ImageConverter, OcrEngine, PdfEngine, ProgressFn};
use crate::format::{classify, Strategy};
use crate::model::UploadedFile;
use crate::settings::Settings;

/// Result of a successful (non-failing) extraction attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    Text(String),
    /// The format is not handled; nothing was attempted.
    Skipped { media_type: String },
}

impl Extraction {
    pub fn text(&self) -> Option<&str> {
        match self {
            Extraction::Text(t) => Some(t),
            Extraction::Skipped { .. } => None,
        }
    }
}

/// The external engines the pipeline drives.
#[derive(Clone)]
pub struct Engines {
    pub pdf: Arc<dyn PdfEngine>,
    pub ocr: Arc<dyn OcrEngine>,
    pub converter: Arc<dyn ImageConverter>,
}

impl Engines {
    /// lopdf, the `tesseract` CLI and `heif-convert`, configured from settings.
    pub fn system(settings: &Settings) -> Self {
        Engines {
            pdf: Arc::new(LopdfEngine::new()),
            ocr: Arc::new(TesseractOcr::new(&settings.ocr.tesseract)),
            converter: Arc::new(HeifConvert::new(&settings.heic.converter)),
        }
    }
}

/// One entry point for all formats: classify, dispatch, report progress.
pub struct ExtractionOrchestrator {
    pdf: PdfExtractor,
    image: ImageExtractor,
    heic: HeicConverter,
}

impl ExtractionOrchestrator {
    pub fn new(engines: Engines, settings: &Settings) -> Self {
        ExtractionOrchestrator {
            pdf: PdfExtractor::new(engines.pdf),
            image: ImageExtractor::new(engines.ocr, settings.ocr.language.clone()),
            heic: HeicConverter::new(engines.converter, settings.heic.target_type.clone()),
        }
    }

    /// Extract the text of one upload. The file is consumed.
    ///
    /// Unsupported formats resolve to [`Extraction::Skipped`] rather than an
    /// error. Failures never carry partial text.
    pub async fn extract(
        &self,
        file: UploadedFile,
        progress: ProgressFn<'_>,
    ) -> Result<Extraction, ExtractionError> {
        let strategy = classify(&file.media_type, &file.name);
        info!(
            file = %file.name,
            media_type = %file.media_type,
            bytes = file.bytes.len(),
            %strategy,
            "extracting"
        );

        let result = match strategy {
            Strategy::PdfExtraction => self.pdf.extract(&file.bytes, progress).await,
            Strategy::ImageExtraction => self.image.extract(&file.bytes, progress).await,
            Strategy::HeicConversionThenImageExtraction => {
                self.extract_heic(&file.bytes, progress).await
            }
            Strategy::Unsupported => {
                // Kept as a silent no-op; whether to surface an error is undecided.
                warn!(media_type = %file.media_type, file = %file.name, "unsupported format, skipping");
                return Ok(Extraction::Skipped {
                    media_type: file.media_type,
                });
            }
        };

        match result {
            Ok(text) => {
                info!(chars = text.chars().count(), %strategy, "extraction complete");
                Ok(Extraction::Text(text))
            }
            Err(e) => {
                error!(kind = e.kind(), diagnostic = %e, %strategy, "extraction failed");
                Err(e)
            }
        }
    }

    async fn extract_heic(
        &self,
        bytes: &[u8],
        progress: ProgressFn<'_>,
    ) -> Result<String, ExtractionError> {
        let image = self.heic.convert(bytes, progress).await?;
        self.image.recognize(&image, progress).await
    }
}
