use recite_core::error::ReciteError;
use recite_core::extraction::orchestrator::{Engines, Extraction};
use recite_core::model::{ExtractionProgress, UploadedFile};
use recite_core::report::build_report;
use recite_core::settings::Settings;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::output;

pub async fn run(
    input_file: PathBuf,
    media_type: Option<String>,
    output_format: &str,
    output_file: Option<PathBuf>,
    settings: &Settings,
) -> Result<(), ReciteError> {
    let file = UploadedFile::from_path(&input_file, media_type.as_deref())?;
    let (name, declared) = (file.name.clone(), file.media_type.clone());

    let last = Mutex::new(None::<ExtractionProgress>);
    let progress = |p: ExtractionProgress| {
        output::text::progress(&p);
        if let Ok(mut guard) = last.lock() {
            *guard = Some(p);
        }
    };

    let result = recite_core::extract_text(file, Engines::system(settings), settings, &progress).await;
    let last = last.into_inner().ok().flatten();

    if output_format == "json" {
        let report = build_report(&name, &declared, &result, last.as_ref());
        output::json::print(&report)?;
    }

    match result? {
        Extraction::Text(text) => {
            if output_format != "json" {
                output::text::print(&text);
            }
            if let Some(path) = output_file {
                std::fs::write(&path, &text)?;
                eprintln!(
                    "Extracted {} character(s), written to {}",
                    text.chars().count(),
                    path.display()
                );
            }
        }
        // Unsupported formats are a silent no-op.
        Extraction::Skipped { .. } => {}
    }

    Ok(())
}
