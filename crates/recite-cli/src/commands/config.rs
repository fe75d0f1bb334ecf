use recite_core::error::ReciteError;
use recite_core::settings::{self, Settings};
use std::path::Path;

pub fn show(settings: &Settings) -> Result<(), ReciteError> {
    println!("{}", serde_json::to_string_pretty(settings)?);
    Ok(())
}

pub fn validate(file: &Path) -> Result<(), ReciteError> {
    let s = settings::load_settings(file)?;

    println!("Settings in {} are valid.", file.display());
    println!("  OCR language: {}", s.ocr.language);
    println!("  HEIC target:  {}", s.heic.target_type);
    println!(
        "  Speech:       rate {} ({} wpm), voice {}",
        s.speech.rate,
        (s.speech.base_words_per_minute as f32 * s.speech.rate).round(),
        s.speech.voice.as_deref().unwrap_or("default")
    );
    Ok(())
}
