use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;
use std::path::Path;
use std::sync::Arc;

use crate::error::ReciteError;

/// One user-supplied document: bytes plus the declared media type and name.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        UploadedFile {
            name: name.into(),
            media_type: media_type.into(),
            bytes,
        }
    }

    /// Read a file from disk, declaring its media type from the extension
    /// unless `media_type` overrides it.
    pub fn from_path(path: &Path, media_type: Option<&str>) -> Result<Self, ReciteError> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let media_type = match media_type {
            Some(t) => t.to_string(),
            None => media_type_for_name(&name).to_string(),
        };
        Ok(UploadedFile::new(name, media_type, bytes))
    }
}

/// Guess a media type from a file name, the way a browser file picker would.
pub fn media_type_for_name(name: &str) -> &'static str {
    let ext = match name.rsplit_once('.') {
        Some((_, ext)) => ext.to_ascii_lowercase(),
        None => return "application/octet-stream",
    };
    match ext.as_str() {
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "webp" => "image/webp",
        "heic" | "heif" => "image/heic",
        _ => "application/octet-stream",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Loading,
    Decoding,
    Recognizing,
    Paging,
}

/// Transient progress report. Each emission supersedes the previous one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionProgress {
    pub phase: Phase,
    /// In `[0, 1]` when known.
    pub fraction: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_count: Option<usize>,
}

impl ExtractionProgress {
    pub fn phase(phase: Phase) -> Self {
        ExtractionProgress {
            phase,
            fraction: None,
            page_index: None,
            page_count: None,
        }
    }

    pub fn recognizing(fraction: f64) -> Self {
        ExtractionProgress {
            fraction: Some(clamp_fraction(fraction)),
            ..ExtractionProgress::phase(Phase::Recognizing)
        }
    }

    pub fn paging(page_index: usize, page_count: usize) -> Self {
        let fraction = if page_count == 0 {
            1.0
        } else {
            page_index as f64 / page_count as f64
        };
        ExtractionProgress {
            phase: Phase::Paging,
            fraction: Some(clamp_fraction(fraction)),
            page_index: Some(page_index),
            page_count: Some(page_count),
        }
    }

    /// Whole percent for display. Rounding happens here only.
    pub fn percent(&self) -> Option<u8> {
        self.fraction.map(|f| (clamp_fraction(f) * 100.0).round() as u8)
    }

    /// Presentation string for a progress line.
    pub fn display(&self) -> String {
        match (self.phase, self.percent()) {
            (Phase::Recognizing, None) => "Starting OCR...".to_string(),
            (Phase::Recognizing, Some(p)) => format!("Processing: {p}%"),
            (Phase::Paging, _) => format!(
                "Page {}/{}",
                self.page_index.unwrap_or(0),
                self.page_count.unwrap_or(0)
            ),
            (Phase::Loading, _) => "Loading...".to_string(),
            (Phase::Decoding, _) => "Converting image...".to_string(),
        }
    }
}

/// Clamp an engine-reported fraction into `[0, 1]`. NaN counts as 0.
pub fn clamp_fraction(f: f64) -> f64 {
    if f.is_nan() {
        0.0
    } else {
        f.clamp(0.0, 1.0)
    }
}

/// Extracted text, shared read-only with the playback controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextBuffer(Arc<str>);

impl TextBuffer {
    pub fn new(text: impl Into<Arc<str>>) -> Self {
        TextBuffer(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn char_count(&self) -> usize {
        self.0.chars().count()
    }

    pub(crate) fn shared(&self) -> Arc<str> {
        Arc::clone(&self.0)
    }
}

impl Deref for TextBuffer {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl From<String> for TextBuffer {
    fn from(s: String) -> Self {
        TextBuffer::new(s)
    }
}

impl fmt::Display for TextBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
