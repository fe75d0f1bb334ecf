use std::path::PathBuf;

/// Where a raster image that failed to decode came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageOrigin {
    /// Bytes exactly as uploaded.
    Upload,
    /// Output of the HEIC converter.
    Converted,
}

/// Terminal failure of one extraction attempt.
///
/// `Display` is the internal diagnostic (engine detail preserved);
/// [`ExtractionError::user_message`] is what a person should see.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("PDF engine could not load document: {0}")]
    PdfLoad(String),

    #[error("PDF engine failed on page {page}: {detail}")]
    PdfPage { page: usize, detail: String },

    #[error("could not decode {origin:?} image: {detail}")]
    ImageDecode { origin: ImageOrigin, detail: String },

    #[error("OCR engine failed: {0}")]
    Ocr(String),

    #[error("HEIC conversion failed: {0}")]
    HeicConversion(String),
}

impl ExtractionError {
    /// Fixed, user-facing message for this failure kind. Never contains
    /// engine diagnostics.
    pub fn user_message(&self) -> &'static str {
        match self {
            ExtractionError::PdfLoad(_) | ExtractionError::PdfPage { .. } => {
                "Error reading PDF. Please try again."
            }
            ExtractionError::ImageDecode {
                origin: ImageOrigin::Upload,
                ..
            } => "Error loading image.",
            ExtractionError::ImageDecode {
                origin: ImageOrigin::Converted,
                ..
            } => "Error loading converted image.",
            ExtractionError::Ocr(_) => "Error extracting text. Please try again.",
            ExtractionError::HeicConversion(_) => "Error converting HEIC file. Please try again.",
        }
    }

    /// Short machine-readable kind, used in reports and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ExtractionError::PdfLoad(_) => "pdf_load_failure",
            ExtractionError::PdfPage { .. } => "pdf_page_failure",
            ExtractionError::ImageDecode { .. } => "image_decode_failure",
            ExtractionError::Ocr(_) => "ocr_failure",
            ExtractionError::HeicConversion(_) => "heic_conversion_failure",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ReciteError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error("{tool} not found. {hint}")]
    ToolNotFound { tool: String, hint: &'static str },

    #[error("{tool} failed with exit code {code}: {stderr}")]
    ToolFailed {
        tool: String,
        code: i32,
        stderr: String,
    },

    #[error("failed to load settings from {path}: {reason}")]
    SettingsLoad { path: PathBuf, reason: String },

    #[error("invalid settings: {0}")]
    SettingsInvalid(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_message_hides_engine_detail() {
        let err = ExtractionError::Ocr("tesseract: leptonica read error 0x1f".into());
        assert_eq!(err.user_message(), "Error extracting text. Please try again.");
        assert!(err.to_string().contains("leptonica"));
    }

    #[test]
    fn converted_image_has_its_own_message() {
        let upload = ExtractionError::ImageDecode {
            origin: ImageOrigin::Upload,
            detail: "bad magic".into(),
        };
        let converted = ExtractionError::ImageDecode {
            origin: ImageOrigin::Converted,
            detail: "bad magic".into(),
        };
        assert_ne!(upload.user_message(), converted.user_message());
        assert_eq!(upload.kind(), converted.kind());
    }
}
