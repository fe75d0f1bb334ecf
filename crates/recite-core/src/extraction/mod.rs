pub mod heic;
pub mod heif_convert;
pub mod lopdf_backend;
pub mod ocr;
pub mod orchestrator;
pub mod pdf;
pub mod tesseract;

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;

use crate::error::{ExtractionError, ImageOrigin};
use crate::model::ExtractionProgress;

/// Receives progress updates from an extraction. Must not block.
pub type ProgressFn<'a> = &'a (dyn Fn(ExtractionProgress) + Send + Sync);

/// Progress sink that drops everything.
pub fn no_progress(_: ExtractionProgress) {}

/// Raw failure reported by an external engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct EngineError(pub String);

impl EngineError {
    pub fn new(msg: impl Into<String>) -> Self {
        EngineError(msg.into())
    }
}

impl From<std::io::Error> for EngineError {
    fn from(e: std::io::Error) -> Self {
        EngineError(e.to_string())
    }
}

/// Trait for PDF engine backends.
#[async_trait]
pub trait PdfEngine: Send + Sync {
    /// Parse a document from memory.
    async fn load(&self, bytes: &[u8]) -> Result<Box<dyn PdfDocument>, EngineError>;

    /// Name of this backend (for diagnostics).
    fn backend_name(&self) -> &str;
}

/// A loaded document. Pages are numbered from 1.
#[async_trait]
pub trait PdfDocument: Send + Sync {
    fn page_count(&self) -> usize;

    async fn page(&self, number: usize) -> Result<Box<dyn PdfPage>, EngineError>;
}

#[async_trait]
pub trait PdfPage: Send + Sync {
    /// Text tokens of the page, in content order.
    async fn text(&self) -> Result<Vec<String>, EngineError>;
}

/// Status string the OCR engine uses while it is reading text.
pub const RECOGNIZING_TEXT: &str = "recognizing text";

/// Raw progress callback payload from an OCR engine.
#[derive(Debug, Clone, PartialEq)]
pub struct OcrProgress {
    pub status: String,
    /// Nominally `0..=1`, but engines repeat and overshoot.
    pub progress: f64,
}

impl OcrProgress {
    pub fn new(status: impl Into<String>, progress: f64) -> Self {
        OcrProgress {
            status: status.into(),
            progress,
        }
    }
}

/// Trait for OCR backends.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    async fn recognize(
        &self,
        image: &RasterImage,
        language: &str,
        progress: &(dyn Fn(OcrProgress) + Send + Sync),
    ) -> Result<String, EngineError>;

    fn backend_name(&self) -> &str;
}

/// Typed byte payload handed to and returned from an [`ImageConverter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    pub bytes: Vec<u8>,
    pub media_type: String,
}

impl Blob {
    pub fn new(bytes: Vec<u8>, media_type: impl Into<String>) -> Self {
        Blob {
            bytes,
            media_type: media_type.into(),
        }
    }
}

/// Trait for external image format converters (HEIC in, raster out).
#[async_trait]
pub trait ImageConverter: Send + Sync {
    async fn convert(&self, blob: &Blob, target_type: &str) -> Result<Blob, EngineError>;

    fn backend_name(&self) -> &str;
}

/// A decoded raster image ready for OCR.
#[derive(Debug, Clone)]
pub struct RasterImage {
    image: DynamicImage,
    origin: ImageOrigin,
}

impl RasterImage {
    /// Decode encoded image bytes (PNG, JPEG, ...).
    pub fn decode(bytes: &[u8], origin: ImageOrigin) -> Result<Self, ExtractionError> {
        image::load_from_memory(bytes)
            .map(|image| RasterImage { image, origin })
            .map_err(|e| ExtractionError::ImageDecode {
                origin,
                detail: e.to_string(),
            })
    }

    /// [`RasterImage::decode`] on the blocking pool, so large images do not
    /// stall the runtime.
    pub async fn spawn_decode(bytes: Vec<u8>, origin: ImageOrigin) -> Result<Self, ExtractionError> {
        tokio::task::spawn_blocking(move || RasterImage::decode(&bytes, origin))
            .await
            .map_err(|e| ExtractionError::ImageDecode {
                origin,
                detail: format!("decode task failed: {e}"),
            })?
    }

    pub fn from_image(image: DynamicImage, origin: ImageOrigin) -> Self {
        RasterImage { image, origin }
    }

    pub fn origin(&self) -> ImageOrigin {
        self.origin
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn as_image(&self) -> &DynamicImage {
        &self.image
    }

    /// Re-encode as PNG, for engines that read files.
    pub fn encode_png(&self) -> Result<Vec<u8>, EngineError> {
        let mut buf = Cursor::new(Vec::new());
        self.image
            .write_to(&mut buf, ImageFormat::Png)
            .map_err(|e| EngineError::new(format!("PNG encode failed: {e}")))?;
        Ok(buf.into_inner())
    }

    /// [`RasterImage::encode_png`] on the blocking pool.
    pub async fn spawn_encode_png(&self) -> Result<Vec<u8>, EngineError> {
        let image = self.clone();
        tokio::task::spawn_blocking(move || image.encode_png())
            .await
            .map_err(|e| EngineError::new(format!("PNG encode task failed: {e}")))?
    }
}
