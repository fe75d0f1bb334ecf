pub mod error;
pub mod extraction;
pub mod format;
pub mod model;
pub mod playback;
pub mod report;
pub mod session;
pub mod settings;
pub mod tool;

use error::ExtractionError;
use extraction::orchestrator::{Engines, Extraction, ExtractionOrchestrator};
use extraction::ProgressFn;
use model::UploadedFile;
use settings::Settings;

/// Main API entry point: extract the text of one uploaded document.
///
/// Selects PDF paging, direct OCR, or HEIC conversion followed by OCR from
/// the file's media type and name. Unsupported formats yield
/// [`Extraction::Skipped`].
pub async fn extract_text(
    file: UploadedFile,
    engines: Engines,
    settings: &Settings,
    progress: ProgressFn<'_>,
) -> Result<Extraction, ExtractionError> {
    let orchestrator = ExtractionOrchestrator::new(engines, settings);
    orchestrator.extract(file, progress).await
}
