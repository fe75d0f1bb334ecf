use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ReciteError;
use crate::extraction::heic::DEFAULT_TARGET_TYPE;
use crate::extraction::ocr::DEFAULT_LANGUAGE;

/// Runtime configuration. Every field has a default, so `{}` is valid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub ocr: OcrSettings,
    pub heic: HeicSettings,
    pub speech: SpeechSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrSettings {
    /// Language hint passed to the OCR engine.
    pub language: String,
    pub tesseract: String,
}

impl Default for OcrSettings {
    fn default() -> Self {
        OcrSettings {
            language: DEFAULT_LANGUAGE.to_string(),
            tesseract: "tesseract".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeicSettings {
    /// Raster type requested from the converter.
    pub target_type: String,
    pub converter: String,
}

impl Default for HeicSettings {
    fn default() -> Self {
        HeicSettings {
            target_type: DEFAULT_TARGET_TYPE.to_string(),
            converter: "heif-convert".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechSettings {
    /// Multiple of the engine's normal speed.
    pub rate: f32,
    /// Wait after a reset before the host reinitialises.
    pub settle_delay_ms: u64,
    /// Voice name; `None` uses the engine default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,
    pub espeak: String,
    /// Words per minute at rate 1.0.
    pub base_words_per_minute: u32,
}

impl Default for SpeechSettings {
    fn default() -> Self {
        SpeechSettings {
            rate: 0.8,
            settle_delay_ms: 200,
            voice: None,
            espeak: "espeak-ng".to_string(),
            base_words_per_minute: 175,
        }
    }
}

/// Load settings from a JSON file.
pub fn load_settings(path: &Path) -> Result<Settings, ReciteError> {
    let content = std::fs::read_to_string(path).map_err(|e| ReciteError::SettingsLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let settings: Settings =
        serde_json::from_str(&content).map_err(|e| ReciteError::SettingsLoad {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    validate_settings(&settings)?;
    Ok(settings)
}

/// Parse settings from a JSON string (no file path context).
pub fn parse_settings_str(json: &str) -> Result<Settings, ReciteError> {
    let settings: Settings = serde_json::from_str(json).map_err(ReciteError::Json)?;
    validate_settings(&settings)?;
    Ok(settings)
}

/// Validate that settings are usable.
pub fn validate_settings(settings: &Settings) -> Result<(), ReciteError> {
    if settings.ocr.language.trim().is_empty() {
        return Err(ReciteError::SettingsInvalid(
            "ocr.language must not be empty".into(),
        ));
    }

    match settings.heic.target_type.as_str() {
        "image/jpeg" | "image/png" => {}
        other => {
            return Err(ReciteError::SettingsInvalid(format!(
                "heic.target_type '{}' is not supported (expected 'image/jpeg' or 'image/png')",
                other
            )));
        }
    }

    let rate = settings.speech.rate;
    if !(rate > 0.0 && rate <= 4.0) {
        return Err(ReciteError::SettingsInvalid(format!(
            "speech.rate {} out of range (0, 4]",
            rate
        )));
    }

    if settings.speech.base_words_per_minute == 0 {
        return Err(ReciteError::SettingsInvalid(
            "speech.base_words_per_minute must be positive".into(),
        ));
    }

    for (field, binary) in [
        ("ocr.tesseract", &settings.ocr.tesseract),
        ("heic.converter", &settings.heic.converter),
        ("speech.espeak", &settings.speech.espeak),
    ] {
        if binary.trim().is_empty() {
            return Err(ReciteError::SettingsInvalid(format!(
                "{} must not be empty",
                field
            )));
        }
    }

    if let Some(ref voice) = settings.speech.voice {
        if voice.trim().is_empty() {
            return Err(ReciteError::SettingsInvalid(
                "speech.voice must be omitted rather than empty".into(),
            ));
        }
    }

    Ok(())
}
