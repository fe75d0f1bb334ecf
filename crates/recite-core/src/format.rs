use serde::{Deserialize, Serialize};
use std::fmt;

/// Extraction strategy selected for an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    PdfExtraction,
    ImageExtraction,
    HeicConversionThenImageExtraction,
    /// Nothing is attempted for this input.
    Unsupported,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::PdfExtraction => write!(f, "pdf"),
            Strategy::ImageExtraction => write!(f, "image"),
            Strategy::HeicConversionThenImageExtraction => write!(f, "heic+image"),
            Strategy::Unsupported => write!(f, "unsupported"),
        }
    }
}

/// Pick an extraction strategy from the declared media type and file name.
///
/// The HEIC check only applies inside the `image/` family, so a `.heic`
/// name with a non-image type is still `Unsupported`.
pub fn classify(media_type: &str, file_name: &str) -> Strategy {
    if media_type == "application/pdf" {
        Strategy::PdfExtraction
    } else if media_type.starts_with("image/") {
        if file_name.ends_with(".heic") || media_type == "image/heic" {
            Strategy::HeicConversionThenImageExtraction
        } else {
            Strategy::ImageExtraction
        }
    } else {
        Strategy::Unsupported
    }
}
